use std::{os::fd::OwnedFd, time::Duration};

use log::debug;
use nix::sys::signal::Signal;

use crate::{
    control::{self, ControlRequest, FeatureSelector, Recipient, StandardRequest},
    descriptor::{self, DescriptorType, MAX_STRING_LEN},
    error::InterfaceOp,
    transfer::{Completion, Transfer, TransferKind, ENDPOINT_DIR_IN},
    transport::Transport,
    usbfs::UsbFs,
    util::PhantomUnsync,
    Error, Result,
};

/// Handle to one open USB device.
///
/// The handle is the primary interface for manipulating a device: issuing
/// standard control requests, fetching descriptors, selecting configurations
/// and alternate settings, claiming interfaces, and moving data across bulk,
/// interrupt and isochronous endpoints.
///
/// Opening the device node is the caller's job; the handle is built from the
/// already-open descriptor and owns it for its lifetime (dropping the handle
/// closes it, cancelling any asynchronous transfer still in flight).
///
/// # Example
///
/// ```no_run
/// use std::os::fd::OwnedFd;
/// use usbdevfs::{Device, DescriptorType};
///
/// fn dump_config(fd: OwnedFd) -> usbdevfs::Result<()> {
///     let device = Device::from_fd(fd);
///     let mut buf = vec![0u8; 4096];
///     device.descriptor(DescriptorType::Configuration, 0, 0, &mut buf)?;
///     let total = usbdevfs::config_total_length(&buf);
///     println!("{:02x?}", &buf[..usize::from(total)]);
///     Ok(())
/// }
/// ```
pub struct Device<T: Transport = UsbFs> {
    transport: T,
    timeout: Duration,
    // usbfs assumes one outstanding transfer per endpoint direction; keep the
    // handle on one thread unless externally synchronized.
    _unsync: PhantomUnsync,
}

impl Device<UsbFs> {
    /// Build a device handle from an already-open usbfs device node.
    #[must_use]
    pub fn from_fd(fd: OwnedFd) -> Self {
        Self::with_transport(UsbFs::new(fd))
    }
}

impl<T: Transport> Device<T> {
    /// Build a device handle over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            timeout: control::DEFAULT_TIMEOUT,
            _unsync: std::marker::PhantomData,
        }
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Timeout applied to control exchanges issued through this handle.
    #[must_use]
    pub fn control_timeout(&self) -> Duration {
        self.timeout
    }

    /// Replace the control timeout (defaults to one second).
    pub fn set_control_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn submit_control(
        &self,
        identity: StandardRequest,
        request: ControlRequest,
        data: &mut [u8],
    ) -> Result<usize> {
        let needed = usize::from(request.length);
        if data.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                capacity: data.len(),
            });
        }
        self.transport
            .control(&request, data)
            .map_err(|errno| Error::Control {
                request: identity,
                errno,
            })
    }

    /// CLEAR_FEATURE.
    ///
    /// The request recipient follows the feature selector: clearing
    /// [`FeatureSelector::EndpointHalt`] addresses the endpoint named by
    /// `index`, the other selectors address the device. Clearing an endpoint
    /// halt is the standard recovery after a stalled bulk or interrupt
    /// transfer.
    pub fn clear_feature(&self, feature: FeatureSelector, index: u16) -> Result<()> {
        let request = ControlRequest::clear_feature(feature, index).with_timeout(self.timeout);
        self.submit_control(StandardRequest::ClearFeature, request, &mut [])?;
        Ok(())
    }

    /// GET_CONFIGURATION — the currently active configuration value.
    pub fn configuration(&self) -> Result<u8> {
        let mut buf = [0u8; 1];
        let request = ControlRequest::get_configuration().with_timeout(self.timeout);
        self.submit_control(StandardRequest::GetConfiguration, request, &mut buf)?;
        Ok(buf[0])
    }

    /// SET_CONFIGURATION.
    pub fn set_configuration(&self, value: u16) -> Result<()> {
        let request = ControlRequest::set_configuration(value).with_timeout(self.timeout);
        self.submit_control(StandardRequest::SetConfiguration, request, &mut [])?;
        Ok(())
    }

    /// GET_DESCRIPTOR into `buf`.
    ///
    /// The first exchange requests the type-dependent initial length. For
    /// [`DescriptorType::Configuration`] the true length of the whole
    /// configuration set is only known after that first read: bytes [2,3] of
    /// the header carry it little-endian, and the identical request is
    /// reissued with that total, overwriting `buf` with the complete set.
    ///
    /// Returns `buf[0]`, the descriptor's self-reported length field. For a
    /// configuration descriptor after the second read this is the 9-byte
    /// header length, not the total; callers needing the total must read it
    /// with [`config_total_length`](crate::config_total_length). The protocol
    /// encodes it that way and callers depend on it, so it is preserved here.
    ///
    /// `buf` must hold the initial length, and for configuration descriptors
    /// the full set; otherwise [`Error::BufferTooSmall`] is returned.
    pub fn descriptor(
        &self,
        kind: DescriptorType,
        index: u8,
        langid: u16,
        buf: &mut [u8],
    ) -> Result<usize> {
        let request = ControlRequest::get_descriptor(kind, index, langid).with_timeout(self.timeout);
        self.submit_control(StandardRequest::GetDescriptor, request.clone(), buf)?;
        if kind == DescriptorType::Configuration {
            let total = descriptor::config_total_length(buf);
            debug!("configuration descriptor reports {total} bytes total");
            self.submit_control(
                StandardRequest::GetDescriptor,
                request.with_length(total),
                buf,
            )?;
        }
        Ok(usize::from(buf[0]))
    }

    /// SET_DESCRIPTOR with the fixed 126-byte payload.
    pub fn set_descriptor(
        &self,
        kind: DescriptorType,
        index: u8,
        langid: u16,
        data: &mut [u8],
    ) -> Result<()> {
        let request = ControlRequest::set_descriptor(kind, index, langid).with_timeout(self.timeout);
        self.submit_control(StandardRequest::SetDescriptor, request, data)?;
        Ok(())
    }

    /// Fetch and decode a string descriptor, compatibility flavor.
    ///
    /// Decodes by skipping the two header bytes and keeping only the non-zero
    /// bytes of the UTF-16-LE payload. For ASCII strings the result is what
    /// you expect; for anything else it is lossy in a way long-standing
    /// callers rely on (the low byte of a NUL code unit and the high byte of
    /// any code unit below 256 are dropped). Use [`Device::string`] for a
    /// correct decode.
    pub fn string_lossy(&self, index: u8, langid: u16) -> Result<String> {
        let mut buf = [0u8; MAX_STRING_LEN];
        let len = self.descriptor(DescriptorType::String, index, langid, &mut buf)?;
        Ok(buf[..len]
            .iter()
            .skip(2)
            .filter(|&&b| b != 0)
            .map(|&b| char::from(b))
            .collect())
    }

    /// Fetch a string descriptor and decode its UTF-16-LE payload.
    pub fn string(&self, index: u8, langid: u16) -> Result<String> {
        let mut buf = [0u8; MAX_STRING_LEN];
        let len = self.descriptor(DescriptorType::String, index, langid, &mut buf)?;
        let payload = buf[..len].get(2..).unwrap_or(&[]);
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }

    /// GET_INTERFACE — the active alternate setting of an interface.
    pub fn alt_setting(&self, interface: u16) -> Result<u8> {
        let mut buf = [0u8; 1];
        let request = ControlRequest::get_interface(interface).with_timeout(self.timeout);
        self.submit_control(StandardRequest::GetInterface, request, &mut buf)?;
        Ok(buf[0])
    }

    /// Select an alternate setting on an interface.
    pub fn set_interface(&self, interface: u16, alt_setting: u16) -> Result<()> {
        self.transport
            .set_interface(interface, alt_setting)
            .map_err(|errno| Error::Interface {
                op: InterfaceOp::SetAltSetting,
                interface,
                errno,
            })
    }

    /// GET_STATUS for a caller-selected recipient.
    ///
    /// `index` names the interface or endpoint for those recipients and is
    /// zero for the device. The two status bytes arrive little-endian.
    pub fn status(&self, recipient: Recipient, index: u16) -> Result<u16> {
        let mut buf = [0u8; 2];
        let request = ControlRequest::get_status(recipient, index).with_timeout(self.timeout);
        self.submit_control(StandardRequest::GetStatus, request, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// SET_ADDRESS.
    pub fn set_address(&self, address: u16) -> Result<()> {
        let request = ControlRequest::set_address(address).with_timeout(self.timeout);
        self.submit_control(StandardRequest::SetAddress, request, &mut [])?;
        Ok(())
    }

    /// SYNCH_FRAME — the frame number an isochronous endpoint is
    /// synchronized to.
    pub fn synch_frame(&self, endpoint: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        let request = ControlRequest::synch_frame(endpoint).with_timeout(self.timeout);
        self.submit_control(StandardRequest::SynchFrame, request, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Claim exclusive host-side access to an interface.
    ///
    /// Must precede any data transfer on the interface's endpoints. Fails
    /// while a kernel driver is bound to the interface; call
    /// [`Device::detach_kernel_driver`] first in that case.
    pub fn claim_interface(&self, interface: u16) -> Result<()> {
        self.transport
            .claim_interface(interface)
            .map_err(|errno| Error::Interface {
                op: InterfaceOp::Claim,
                interface,
                errno,
            })
    }

    /// Release a claimed interface.
    ///
    /// Releasing an interface this handle has not claimed is refused by the
    /// transport and reported as an error.
    pub fn release_interface(&self, interface: u16) -> Result<()> {
        self.transport
            .release_interface(interface)
            .map_err(|errno| Error::Interface {
                op: InterfaceOp::Release,
                interface,
                errno,
            })
    }

    /// Force the kernel-resident driver off an interface so it can be
    /// claimed.
    pub fn detach_kernel_driver(&self, interface: u16) -> Result<()> {
        self.transport
            .detach_kernel_driver(interface)
            .map_err(|errno| Error::Interface {
                op: InterfaceOp::Detach,
                interface,
                errno,
            })
    }

    /// Name of the kernel driver bound to an interface, copied into `buf`.
    ///
    /// Writes at most `buf.len()` bytes — a longer name is truncated, never
    /// overflowed. Returns the number of bytes written.
    pub fn driver_name(&self, interface: u16, buf: &mut [u8]) -> Result<usize> {
        let name = self
            .transport
            .driver_name(interface)
            .map_err(|errno| Error::Interface {
                op: InterfaceOp::DriverName,
                interface,
                errno,
            })?;
        let n = name.len().min(buf.len());
        buf[..n].copy_from_slice(&name.as_bytes()[..n]);
        Ok(n)
    }

    /// Send `data` over a bulk OUT endpoint, blocking until complete.
    ///
    /// Returns the number of bytes the device accepted; short counts,
    /// including zero, are success. A failed call may indicate a stalled
    /// endpoint — see [`Device::clear_feature`].
    pub fn bulk_send(&self, endpoint: u8, data: &[u8]) -> Result<usize> {
        self.transport
            .send_sync(TransferKind::Bulk, endpoint, data)
            .map_err(|errno| Error::Transfer {
                kind: TransferKind::Bulk,
                endpoint,
                errno,
            })
    }

    /// Receive from a bulk IN endpoint, blocking until complete.
    ///
    /// `endpoint` is the endpoint number; the IN direction bit is applied
    /// here. Returns the number of bytes received, at most `buf.len()` and
    /// legitimately zero.
    pub fn bulk_recv(&self, endpoint: u8, buf: &mut [u8]) -> Result<usize> {
        let endpoint = ENDPOINT_DIR_IN | endpoint;
        self.transport
            .recv_sync(TransferKind::Bulk, endpoint, buf)
            .map_err(|errno| Error::Transfer {
                kind: TransferKind::Bulk,
                endpoint,
                errno,
            })
    }

    /// Send `data` over an isochronous OUT endpoint, blocking until the
    /// exchange is reaped.
    pub fn iso_send(&self, endpoint: u8, data: &[u8]) -> Result<usize> {
        self.transport
            .send_sync(TransferKind::Isochronous, endpoint, data)
            .map_err(|errno| Error::Transfer {
                kind: TransferKind::Isochronous,
                endpoint,
                errno,
            })
    }

    /// Start an isochronous receive.
    ///
    /// The exchange is enqueued and owns `buffer` until it comes back from
    /// [`Device::poll_completed`] tagged with `token`. If `signal` is given,
    /// the transport raises it in the calling process on completion, so the
    /// caller need not poll blindly; picking distinct signals (and tokens)
    /// for isochronous and interrupt receives keeps simultaneous streams
    /// distinguishable.
    pub fn iso_recv(
        &self,
        endpoint: u8,
        buffer: Vec<u8>,
        token: u64,
        signal: Option<Signal>,
    ) -> Result<()> {
        self.submit_async(TransferKind::Isochronous, endpoint, buffer, token, signal)
    }

    /// Start an interrupt receive; completion discipline as for
    /// [`Device::iso_recv`].
    pub fn interrupt_recv(
        &self,
        endpoint: u8,
        buffer: Vec<u8>,
        token: u64,
        signal: Option<Signal>,
    ) -> Result<()> {
        self.submit_async(TransferKind::Interrupt, endpoint, buffer, token, signal)
    }

    fn submit_async(
        &self,
        kind: TransferKind,
        endpoint: u8,
        buffer: Vec<u8>,
        token: u64,
        signal: Option<Signal>,
    ) -> Result<()> {
        let endpoint = ENDPOINT_DIR_IN | endpoint;
        let mut transfer = Transfer::new(kind, endpoint, buffer).with_token(token);
        if let Some(signal) = signal {
            transfer = transfer.with_signal(signal);
        }
        self.transport
            .submit(transfer)
            .map_err(|errno| Error::Transfer {
                kind,
                endpoint,
                errno,
            })
    }

    /// Reap one completed asynchronous exchange without blocking.
    ///
    /// `Ok(None)` means nothing has completed yet. A completed exchange
    /// carries its token, its raw status word and its buffer; a non-zero
    /// status (a stall, say) is reported there, not as an `Err`.
    pub fn poll_completed(&self) -> Result<Option<Completion>> {
        self.transport
            .reap_ready()
            .map_err(|errno| Error::Reap { errno })
    }
}

impl std::fmt::Debug for Device<UsbFs> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use std::{
        cell::RefCell,
        collections::{HashSet, VecDeque},
    };

    use nix::errno::Errno;

    use super::*;
    use crate::control::Direction;

    /// Scripted stand-in for the kernel transport.
    #[derive(Default)]
    struct Scripted {
        control_log: RefCell<Vec<ControlRequest>>,
        control_responses: RefCell<VecDeque<Result<Vec<u8>, Errno>>>,
        sync_results: RefCell<VecDeque<Result<usize, Errno>>>,
        submitted: RefCell<Vec<Transfer>>,
        completions: RefCell<VecDeque<Completion>>,
        claimed: RefCell<HashSet<u16>>,
        op_log: RefCell<Vec<String>>,
        driver: Option<String>,
    }

    impl Transport for Scripted {
        fn control(&self, request: &ControlRequest, data: &mut [u8]) -> Result<usize, Errno> {
            self.control_log.borrow_mut().push(request.clone());
            match self.control_responses.borrow_mut().pop_front() {
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(data.len()).min(usize::from(request.length));
                    data[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Some(Err(errno)) => Err(errno),
                None => Ok(usize::from(request.length)),
            }
        }

        fn send_sync(&self, _: TransferKind, _: u8, data: &[u8]) -> Result<usize, Errno> {
            self.sync_results
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(data.len()))
        }

        fn recv_sync(&self, _: TransferKind, _: u8, buf: &mut [u8]) -> Result<usize, Errno> {
            self.sync_results
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(buf.len()))
        }

        fn submit(&self, transfer: Transfer) -> Result<(), Errno> {
            self.submitted.borrow_mut().push(transfer);
            Ok(())
        }

        fn reap_ready(&self) -> Result<Option<Completion>, Errno> {
            Ok(self.completions.borrow_mut().pop_front())
        }

        fn set_interface(&self, _: u16, _: u16) -> Result<(), Errno> {
            self.op_log.borrow_mut().push("set_interface".into());
            Ok(())
        }

        fn claim_interface(&self, interface: u16) -> Result<(), Errno> {
            self.op_log.borrow_mut().push("claim".into());
            if self.claimed.borrow_mut().insert(interface) {
                Ok(())
            } else {
                Err(Errno::EBUSY)
            }
        }

        fn release_interface(&self, interface: u16) -> Result<(), Errno> {
            self.op_log.borrow_mut().push("release".into());
            if self.claimed.borrow_mut().remove(&interface) {
                Ok(())
            } else {
                Err(Errno::EINVAL)
            }
        }

        fn detach_kernel_driver(&self, _: u16) -> Result<(), Errno> {
            self.op_log.borrow_mut().push("detach".into());
            Ok(())
        }

        fn driver_name(&self, _: u16) -> Result<String, Errno> {
            self.driver.clone().ok_or(Errno::ENODATA)
        }
    }

    fn device(script: Scripted) -> Device<Scripted> {
        Device::with_transport(script)
    }

    #[test]
    fn configuration_fetch_is_two_phase() {
        let script = Scripted::default();
        // 9-byte header reporting a 32-byte total at bytes [2,3].
        let header = vec![0x09, 0x02, 0x20, 0x00, 0x01, 0x01, 0x00, 0x80, 0x32];
        let mut full = header.clone();
        full.resize(32, 0xAB);
        script.control_responses.borrow_mut().push_back(Ok(header));
        script.control_responses.borrow_mut().push_back(Ok(full));

        let dev = device(script);
        let mut buf = [0u8; 64];
        let reported = dev
            .descriptor(DescriptorType::Configuration, 0, 0, &mut buf)
            .unwrap();

        let log = dev.transport().control_log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].length, 9);
        assert_eq!(log[1].length, 0x0020);
        assert_eq!(log[0].value, log[1].value);
        assert_eq!(log[0].index, log[1].index);
        // The reported count is the header's own length field, not the total.
        assert_eq!(reported, 9);
        assert_eq!(crate::config_total_length(&buf), 32);
        assert_eq!(buf[31], 0xAB);
    }

    #[test]
    fn configuration_fetch_needs_room_for_the_total() {
        let script = Scripted::default();
        let header = vec![0x09, 0x02, 0x00, 0x01, 0x01, 0x01, 0x00, 0x80, 0x32];
        script.control_responses.borrow_mut().push_back(Ok(header));

        let dev = device(script);
        let mut buf = [0u8; 64];
        let err = dev
            .descriptor(DescriptorType::Configuration, 0, 0, &mut buf)
            .unwrap_err();
        assert_eq!(
            err,
            Error::BufferTooSmall {
                needed: 0x0100,
                capacity: 64
            }
        );
    }

    #[test]
    fn string_decode_drops_zero_bytes() {
        let script = Scripted::default();
        script
            .control_responses
            .borrow_mut()
            .push_back(Ok(vec![6, 0x03, b'H', 0x00, b'i', 0x00]));
        let dev = device(script);
        assert_eq!(dev.string_lossy(1, 0x0409).unwrap(), "Hi");
    }

    #[test]
    fn string_decode_of_empty_descriptor() {
        let script = Scripted::default();
        script
            .control_responses
            .borrow_mut()
            .push_back(Ok(vec![0, 0x03]));
        let dev = device(script);
        assert_eq!(dev.string_lossy(1, 0).unwrap(), "");
    }

    #[test]
    fn string_utf16_decode() {
        let script = Scripted::default();
        // "Hé" — the second unit has a non-zero high byte the legacy decode
        // would mangle.
        script
            .control_responses
            .borrow_mut()
            .push_back(Ok(vec![6, 0x03, b'H', 0x00, 0xE9, 0x00]));
        let dev = device(script);
        assert_eq!(dev.string(1, 0x0409).unwrap(), "Hé");
    }

    #[test]
    fn string_fetch_failure_surfaces_the_error() {
        let script = Scripted::default();
        script
            .control_responses
            .borrow_mut()
            .push_back(Err(Errno::EPIPE));
        let dev = device(script);
        let err = dev.string_lossy(1, 0).unwrap_err();
        assert_eq!(
            err,
            Error::Control {
                request: StandardRequest::GetDescriptor,
                errno: Errno::EPIPE
            }
        );
    }

    #[test]
    fn short_bulk_transfers_are_success() {
        let script = Scripted::default();
        script.sync_results.borrow_mut().push_back(Ok(5));
        script.sync_results.borrow_mut().push_back(Ok(0));
        let dev = device(script);

        let mut buf = [0u8; 64];
        assert_eq!(dev.bulk_recv(2, &mut buf).unwrap(), 5);
        assert_eq!(dev.bulk_send(2, &buf).unwrap(), 0);
    }

    #[test]
    fn failed_bulk_transfer_carries_identity() {
        let script = Scripted::default();
        script.sync_results.borrow_mut().push_back(Err(Errno::EPIPE));
        let dev = device(script);
        let err = dev.bulk_recv(2, &mut [0u8; 8]).unwrap_err();
        assert_eq!(
            err,
            Error::Transfer {
                kind: TransferKind::Bulk,
                endpoint: 0x82,
                errno: Errno::EPIPE
            }
        );
    }

    #[test]
    fn driver_name_truncates_without_overflow() {
        let script = Scripted {
            driver: Some("usb-storage".into()),
            ..Scripted::default()
        };
        let dev = device(script);

        let mut small = [0u8; 4];
        assert_eq!(dev.driver_name(0, &mut small).unwrap(), 4);
        assert_eq!(&small, b"usb-");

        let mut big = [0u8; 32];
        assert_eq!(dev.driver_name(0, &mut big).unwrap(), 11);
        assert_eq!(&big[..11], b"usb-storage");
    }

    #[test]
    fn claim_detach_release_sequences() {
        let dev = device(Scripted::default());
        dev.claim_interface(0).unwrap();
        dev.detach_kernel_driver(0).unwrap();
        dev.release_interface(0).unwrap();
        assert_eq!(
            *dev.transport().op_log.borrow(),
            ["claim", "detach", "release"]
        );

        let dev = device(Scripted::default());
        dev.detach_kernel_driver(0).unwrap();
        dev.claim_interface(0).unwrap();
        dev.release_interface(0).unwrap();
        assert_eq!(
            *dev.transport().op_log.borrow(),
            ["detach", "claim", "release"]
        );
    }

    #[test]
    fn release_without_claim_is_an_error() {
        let dev = device(Scripted::default());
        let err = dev.release_interface(3).unwrap_err();
        assert_eq!(
            err,
            Error::Interface {
                op: InterfaceOp::Release,
                interface: 3,
                errno: Errno::EINVAL
            }
        );
    }

    #[test]
    fn status_and_synch_frame_decode_little_endian() {
        let script = Scripted::default();
        script
            .control_responses
            .borrow_mut()
            .push_back(Ok(vec![0x01, 0x00]));
        script
            .control_responses
            .borrow_mut()
            .push_back(Ok(vec![0x34, 0x12]));
        let dev = device(script);
        assert_eq!(dev.status(Recipient::Device, 0).unwrap(), 1);
        assert_eq!(dev.synch_frame(0x81).unwrap(), 0x1234);
    }

    #[test]
    fn control_timeout_is_configurable() {
        let mut dev = device(Scripted::default());
        dev.set_control_timeout(Duration::from_millis(250));
        dev.configuration().unwrap();
        let log = dev.transport().control_log.borrow();
        assert_eq!(log[0].timeout, Duration::from_millis(250));
    }

    #[test]
    fn clear_feature_goes_out_with_no_data() {
        let dev = device(Scripted::default());
        dev.clear_feature(FeatureSelector::EndpointHalt, 0x81).unwrap();
        let log = dev.transport().control_log.borrow();
        assert_eq!(log[0].direction, Direction::Out);
        assert_eq!(log[0].length, 0);
        assert_eq!(log[0].index, 0x81);
    }

    #[test]
    fn async_receives_are_token_and_signal_tagged() {
        let dev = device(Scripted::default());
        dev.iso_recv(3, vec![0; 256], 1, Some(Signal::SIGUSR1)).unwrap();
        dev.interrupt_recv(2, vec![0; 64], 2, Some(Signal::SIGUSR2))
            .unwrap();

        let submitted = dev.transport().submitted.borrow();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0].kind(), TransferKind::Isochronous);
        assert_eq!(submitted[0].endpoint(), 0x83);
        assert_eq!(submitted[0].token(), 1);
        assert_eq!(submitted[0].signal(), Some(Signal::SIGUSR1));
        assert_eq!(submitted[1].kind(), TransferKind::Interrupt);
        assert_eq!(submitted[1].endpoint(), 0x82);
        assert_eq!(submitted[1].token(), 2);
        assert_eq!(submitted[1].signal(), Some(Signal::SIGUSR2));
    }

    #[test]
    fn poll_distinguishes_pending_from_complete() {
        let script = Scripted::default();
        script.completions.borrow_mut().push_back(Completion {
            token: 7,
            status: 0,
            actual_length: 3,
            buffer: vec![1, 2, 3, 0],
        });
        let dev = device(script);

        let completion = dev.poll_completed().unwrap().unwrap();
        assert_eq!(completion.token, 7);
        assert_eq!(completion.actual_length, 3);
        assert!(dev.poll_completed().unwrap().is_none());
    }
}
