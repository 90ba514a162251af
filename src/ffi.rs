//! Raw usbdevfs ABI: the `#[repr(C)]` structures and ioctl request codes of
//! `<linux/usbdevice_fs.h>`.
//!
//! Everything here crosses the kernel boundary, so layouts and request codes
//! are reproduced bit-for-bit. The structure tags keep the kernel's field
//! names where the kernel has them (`signr`, `usercontext`) so the two can be
//! compared side by side.

use std::ffi::{c_char, c_int, c_uint, c_void};

use nix::{ioctl_read, ioctl_readwrite, ioctl_write_ptr, request_code_none};

/// `struct usbdevfs_ctrltransfer` — a one-shot control exchange.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct CtrlTransfer {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
    /// Timeout in milliseconds.
    pub timeout: u32,
    pub data: *mut c_void,
}

/// `struct usbdevfs_setinterface`.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct SetInterface {
    pub interface: c_uint,
    pub altsetting: c_uint,
}

/// Size of the driver-name field in [`GetDriver`], NUL included.
pub const MAX_DRIVER_NAME: usize = 256;

/// `struct usbdevfs_getdriver` — filled in by the kernel.
#[repr(C)]
#[derive(Clone)]
pub struct GetDriver {
    pub interface: c_uint,
    pub driver: [c_char; MAX_DRIVER_NAME],
}

impl Default for GetDriver {
    fn default() -> Self {
        Self {
            interface: 0,
            driver: [0; MAX_DRIVER_NAME],
        }
    }
}

/// `struct usbdevfs_ioctl` — a request forwarded to the interface's kernel
/// driver, or one of the connect/disconnect pseudo-requests.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct DriverIoctl {
    pub ifno: c_int,
    pub ioctl_code: c_int,
    pub data: *mut c_void,
}

/// `struct usbdevfs_iso_packet_desc`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoPacketDesc {
    pub length: c_uint,
    pub actual_length: c_uint,
    pub status: c_uint,
}

/// `struct usbdevfs_urb`.
///
/// `status` and `actual_length` are filled by the kernel on completion.
/// `signr`, when non-zero, names a signal the kernel raises in the submitting
/// process once the URB completes. `usercontext` is echoed back untouched.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct Urb {
    pub kind: u8,
    pub endpoint: u8,
    pub status: c_int,
    pub flags: c_uint,
    pub buffer: *mut c_void,
    pub buffer_length: c_int,
    pub actual_length: c_int,
    pub start_frame: c_int,
    pub number_of_packets: c_int,
    pub error_count: c_int,
    pub signr: c_uint,
    pub usercontext: *mut c_void,
}

impl Default for Urb {
    fn default() -> Self {
        Self {
            kind: 0,
            endpoint: 0,
            status: 0,
            flags: 0,
            buffer: std::ptr::null_mut(),
            buffer_length: 0,
            actual_length: 0,
            start_frame: 0,
            number_of_packets: 0,
            error_count: 0,
            signr: 0,
            usercontext: std::ptr::null_mut(),
        }
    }
}

/// A URB followed by a single iso packet descriptor spanning its buffer.
///
/// usbfs requires isochronous URBs to carry their packet table inline after
/// the URB proper; this crate always submits exactly one packet per exchange.
#[repr(C)]
#[derive(Debug, Clone, Default)]
pub struct IsoUrb {
    pub urb: Urb,
    pub packets: [IsoPacketDesc; 1],
}

bitflags::bitflags! {
    /// URB flag bits understood by usbfs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UrbFlags: c_uint {
        /// Treat a short read as an error.
        const SHORT_NOT_OK = 0x01;
        /// Start an isochronous transfer on the next available frame.
        const ISO_ASAP = 0x02;
        /// Continuation of a split bulk transfer.
        const BULK_CONTINUATION = 0x04;
        /// Terminate an OUT transfer with a zero-length packet.
        const ZERO_PACKET = 0x40;
        /// Suppress the completion interrupt where possible.
        const NO_INTERRUPT = 0x80;
    }
}

ioctl_readwrite!(usbdevfs_control, b'U', 0, CtrlTransfer);
ioctl_read!(usbdevfs_setinterface, b'U', 4, SetInterface);
ioctl_write_ptr!(usbdevfs_getdriver, b'U', 8, GetDriver);
ioctl_read!(usbdevfs_submiturb, b'U', 10, Urb);
ioctl_write_ptr!(usbdevfs_reapurb, b'U', 12, *mut Urb);
ioctl_write_ptr!(usbdevfs_reapurbndelay, b'U', 13, *mut Urb);
ioctl_read!(usbdevfs_claiminterface, b'U', 15, c_uint);
ioctl_read!(usbdevfs_releaseinterface, b'U', 16, c_uint);
ioctl_readwrite!(usbdevfs_driver_ioctl, b'U', 18, DriverIoctl);

/// Sub-ioctl code passed through [`DriverIoctl`] to unbind the kernel driver
/// from an interface.
pub const USBDEVFS_DISCONNECT: c_int = request_code_none!(b'U', 22) as c_int;
