//! The real usbfs transport.
//!
//! [`UsbFs`] drives an already-open usbfs character device (`/dev/bus/usb/…`)
//! through its ioctl interface. Control exchanges are one-shot; everything
//! else goes through the two-step submit/reap protocol. Calls interrupted by
//! a signal are retried transparently; any other failure aborts the exchange
//! and is reported to the caller as-is.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    ffi::{c_int, c_uint, c_void},
    os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd},
    ptr,
};

use log::{trace, warn};
use nix::errno::Errno;

use crate::{
    control::ControlRequest,
    ffi,
    transfer::{Completion, Transfer, TransferKind},
    transport::Transport,
};

/// Loop a raw transport call while it reports interruption, returning the
/// first non-interrupted outcome.
fn retry_intr<T, F>(mut f: F) -> Result<T, Errno>
where
    F: FnMut() -> Result<T, Errno>,
{
    loop {
        match f() {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}

/// An asynchronous exchange the kernel currently owns.
///
/// The URB is boxed so its address stays stable for the kernel; the buffer is
/// kept alive alongside it until the exchange is reaped.
struct Pending {
    urb: Box<ffi::IsoUrb>,
    buffer: Vec<u8>,
    token: u64,
}

/// Transport implementation backed by an open usbfs device node.
///
/// The handle is the sole owner of the file descriptor; dropping it closes
/// the descriptor, which also cancels any asynchronous exchanges still in
/// flight (the kernel discards them during close, before the buffers here
/// are freed).
pub struct UsbFs {
    // Declared first: the fd must close (cancelling in-flight URBs) before
    // `pending` releases the URB and buffer allocations the kernel points at.
    fd: OwnedFd,
    pending: RefCell<HashMap<usize, Pending>>,
    ready: RefCell<VecDeque<Completion>>,
}

impl UsbFs {
    /// Wrap an already-open usbfs device node.
    #[must_use]
    pub fn new(fd: OwnedFd) -> Self {
        Self {
            fd,
            pending: RefCell::new(HashMap::new()),
            ready: RefCell::new(VecDeque::new()),
        }
    }

    fn build_urb(
        kind: TransferKind,
        endpoint: u8,
        buffer: *mut c_void,
        len: usize,
        signal: Option<c_uint>,
        token: u64,
    ) -> ffi::IsoUrb {
        let mut iso = ffi::IsoUrb::default();
        iso.urb.kind = kind.into();
        iso.urb.endpoint = endpoint;
        iso.urb.status = -1;
        iso.urb.buffer = buffer;
        iso.urb.buffer_length = c_int::try_from(len).unwrap_or(c_int::MAX);
        iso.urb.signr = signal.unwrap_or(0);
        iso.urb.usercontext = token as *mut c_void;
        if kind == TransferKind::Isochronous {
            // usbfs wants the packet table inline; one packet spans the buffer.
            iso.urb.number_of_packets = 1;
            iso.urb.flags = ffi::UrbFlags::ISO_ASAP.bits();
            iso.packets[0].length = c_uint::try_from(len).unwrap_or(c_uint::MAX);
        }
        iso
    }

    /// Submit `urb` and block until that exact URB is reaped.
    ///
    /// The blocking reap returns whichever URB completed first; completions
    /// belonging to other in-flight exchanges are stashed for
    /// [`reap_ready`](Transport::reap_ready) rather than dropped.
    fn roundtrip(&self, urb: &mut ffi::IsoUrb) -> Result<(), Errno> {
        let fd = self.fd.as_raw_fd();
        let target: *mut ffi::Urb = &mut urb.urb;
        retry_intr(|| unsafe { ffi::usbdevfs_submiturb(fd, target) })?;
        loop {
            let mut done: *mut ffi::Urb = ptr::null_mut();
            retry_intr(|| unsafe {
                ffi::usbdevfs_reapurb(fd, ptr::addr_of_mut!(done).cast_const())
            })?;
            if done == target {
                return Ok(());
            }
            self.stash(done);
        }
    }

    /// Move a reaped URB from the in-flight table to the ready queue.
    fn stash(&self, done: *mut ffi::Urb) {
        match self.take_pending(done) {
            Some(completion) => self.ready.borrow_mut().push_back(completion),
            None => warn!("reaped a urb this handle did not submit, dropping it"),
        }
    }

    fn take_pending(&self, done: *mut ffi::Urb) -> Option<Completion> {
        let Pending { urb, buffer, token } = self.pending.borrow_mut().remove(&(done as usize))?;
        let status = urb.urb.status;
        let actual = usize::try_from(urb.urb.actual_length).unwrap_or(0);
        trace!(
            "reaped urb token={token} status={status} actual={actual}",
        );
        Some(Completion {
            token,
            status,
            actual_length: actual.min(buffer.len()),
            buffer,
        })
    }

    fn sync_exchange(
        &self,
        kind: TransferKind,
        endpoint: u8,
        buffer: *mut c_void,
        len: usize,
    ) -> Result<usize, Errno> {
        let mut urb = Self::build_urb(kind, endpoint, buffer, len, None, 0);
        trace!("submit {kind:?} endpoint={endpoint:#04x} len={len}");
        self.roundtrip(&mut urb)?;
        if urb.urb.status != 0 {
            // A completed-but-unsuccessful exchange (e.g. a stall) still
            // reports its actual length; the caller decides how to recover.
            warn!(
                "{kind:?} endpoint={endpoint:#04x} completed with status {}",
                urb.urb.status
            );
        }
        let actual = usize::try_from(urb.urb.actual_length).unwrap_or(0);
        Ok(actual.min(len))
    }
}

impl From<OwnedFd> for UsbFs {
    fn from(fd: OwnedFd) -> Self {
        Self::new(fd)
    }
}

impl AsFd for UsbFs {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl Transport for UsbFs {
    fn control(&self, request: &ControlRequest, data: &mut [u8]) -> Result<usize, Errno> {
        let len = usize::from(request.length);
        debug_assert!(data.len() >= len);
        let mut exchange = ffi::CtrlTransfer {
            request_type: request.request_type(),
            request: request.request,
            value: request.value,
            index: request.index,
            length: request.length,
            timeout: u32::try_from(request.timeout.as_millis()).unwrap_or(u32::MAX),
            data: if len == 0 {
                ptr::null_mut()
            } else {
                data.as_mut_ptr().cast()
            },
        };
        trace!(
            "control request={:#04x} type={:#04x} value={:#06x} index={:#06x} length={}",
            exchange.request,
            exchange.request_type,
            exchange.value,
            exchange.index,
            exchange.length
        );
        let moved = unsafe { ffi::usbdevfs_control(self.fd.as_raw_fd(), &mut exchange) }?;
        Ok(usize::try_from(moved).unwrap_or(0))
    }

    fn send_sync(&self, kind: TransferKind, endpoint: u8, data: &[u8]) -> Result<usize, Errno> {
        self.sync_exchange(kind, endpoint, data.as_ptr().cast_mut().cast(), data.len())
    }

    fn recv_sync(&self, kind: TransferKind, endpoint: u8, buf: &mut [u8]) -> Result<usize, Errno> {
        self.sync_exchange(kind, endpoint, buf.as_mut_ptr().cast(), buf.len())
    }

    fn submit(&self, transfer: Transfer) -> Result<(), Errno> {
        let Transfer {
            kind,
            endpoint,
            mut buffer,
            token,
            signal,
        } = transfer;
        let len = buffer.len();
        let signr = signal.map(|s| s as c_int as c_uint);
        let mut urb = Box::new(Self::build_urb(
            kind,
            endpoint,
            buffer.as_mut_ptr().cast(),
            len,
            signr,
            token,
        ));
        let target: *mut ffi::Urb = &mut urb.urb;
        trace!("submit async {kind:?} endpoint={endpoint:#04x} len={len} token={token}");
        retry_intr(|| unsafe { ffi::usbdevfs_submiturb(self.fd.as_raw_fd(), target) })?;
        self.pending
            .borrow_mut()
            .insert(target as usize, Pending { urb, buffer, token });
        Ok(())
    }

    fn reap_ready(&self) -> Result<Option<Completion>, Errno> {
        if let Some(completion) = self.ready.borrow_mut().pop_front() {
            return Ok(Some(completion));
        }
        let mut done: *mut ffi::Urb = ptr::null_mut();
        let reaped = retry_intr(|| unsafe {
            ffi::usbdevfs_reapurbndelay(self.fd.as_raw_fd(), ptr::addr_of_mut!(done).cast_const())
        });
        match reaped {
            Ok(_) => match self.take_pending(done) {
                Some(completion) => Ok(Some(completion)),
                None => {
                    warn!("reaped a urb this handle did not submit, dropping it");
                    Ok(None)
                }
            },
            Err(Errno::EAGAIN) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set_interface(&self, interface: u16, alt_setting: u16) -> Result<(), Errno> {
        // The SETINTERFACE ioctl rather than a SET_INTERFACE control request:
        // the control-transfer route provokes kernel log noise.
        let mut select = ffi::SetInterface {
            interface: interface.into(),
            altsetting: alt_setting.into(),
        };
        unsafe { ffi::usbdevfs_setinterface(self.fd.as_raw_fd(), &mut select) }?;
        Ok(())
    }

    fn claim_interface(&self, interface: u16) -> Result<(), Errno> {
        let mut ifno: c_uint = interface.into();
        unsafe { ffi::usbdevfs_claiminterface(self.fd.as_raw_fd(), &mut ifno) }?;
        Ok(())
    }

    fn release_interface(&self, interface: u16) -> Result<(), Errno> {
        let mut ifno: c_uint = interface.into();
        unsafe { ffi::usbdevfs_releaseinterface(self.fd.as_raw_fd(), &mut ifno) }?;
        Ok(())
    }

    fn detach_kernel_driver(&self, interface: u16) -> Result<(), Errno> {
        let mut cmd = ffi::DriverIoctl {
            ifno: interface.into(),
            ioctl_code: ffi::USBDEVFS_DISCONNECT,
            data: ptr::null_mut(),
        };
        unsafe { ffi::usbdevfs_driver_ioctl(self.fd.as_raw_fd(), &mut cmd) }?;
        Ok(())
    }

    fn driver_name(&self, interface: u16) -> Result<String, Errno> {
        let query = ffi::GetDriver {
            interface: interface.into(),
            ..Default::default()
        };
        unsafe { ffi::usbdevfs_getdriver(self.fd.as_raw_fd(), &query) }?;
        let bytes: Vec<u8> = query
            .driver
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
