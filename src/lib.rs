//! Linux gives userland programs direct access to USB devices through usbfs,
//! the character-device nodes under `/dev/bus/usb`. This crate provides a
//! safe, idiomatic Rust interface to that API: standard control requests,
//! descriptor retrieval, interface management, and data transfer over bulk,
//! interrupt and isochronous endpoints, all through a single open
//! [`Device`] handle.
//!
//! # What This Crate Does
//!
//! - Constructs every standard USB device request (clear feature, get/set
//!   configuration, get/set descriptor, get/set interface, get status, set
//!   address, synch frame) with the exact bit layout USB 2.0 prescribes.
//! - Performs the two-phase configuration-descriptor fetch: the true length
//!   of a configuration set is only known after reading its 9-byte header.
//! - Decodes string descriptors, in both a correct UTF-16-LE flavor and the
//!   zero-byte-dropping flavor long-established callers expect.
//! - Moves data over bulk, interrupt and isochronous endpoints, synchronously
//!   or through usbfs's submit/reap protocol with token-tagged completions
//!   and optional per-transfer completion signals.
//! - Claims, releases and detaches kernel drivers from interfaces.
//!
//! Device discovery and opening the device node are deliberately out of
//! scope: the handle is built from an already-open file descriptor, so this
//! crate composes with whatever enumeration scheme the application uses.
//!
//! # Background
//!
//! A USB device is manipulated through control transfers on its default
//! endpoint — fixed 8-byte setup packets carrying a direction, a type, a
//! recipient, a request code and three 16-bit parameters — and moves payload
//! data through unidirectional numbered endpoints of three kinds: bulk
//! (correctness over throughput), interrupt (small and low-latency) and
//! isochronous (throughput over correctness). usbfs exposes control
//! transfers as a one-shot exchange, and everything else as a two-step
//! protocol: *submit* enqueues a transfer, *reap* retrieves a completion,
//! either blocking or polling.
//!
//! # Concurrency
//!
//! A [`Device`] is not `Sync`: usbfs assumes at most one outstanding
//! transfer per endpoint direction, so a handle must stay on one thread
//! unless externally synchronized. Synchronous operations block the calling
//! thread until the device completes them, retrying internally only when
//! interrupted by a signal; there is no cancellation primitive for an
//! in-flight synchronous call. Asynchronous receives never block — the
//! caller polls [`Device::poll_completed`], or supplies a completion signal
//! per transfer and polls when it fires.
//!
//! # Error Handling
//!
//! usbfs reports every failure — disconnect, stall, missing permission,
//! timeout — as a single failing ioctl, so errors here carry the operation
//! identity and the raw OS status rather than a finer classification that
//! the kernel does not provide. Short transfers are not errors. A failed
//! bulk or interrupt call may mean a stalled endpoint; the standard recovery
//! is [`Device::clear_feature`] with [`FeatureSelector::EndpointHalt`],
//! which is left to the caller.
//!
//! # Simple Example
//!
//! ```no_run
//! use std::fs::OpenOptions;
//! use std::os::fd::OwnedFd;
//! use usbdevfs::{Device, DescriptorType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Opening the node is the caller's side of the contract.
//! let fd: OwnedFd = OpenOptions::new()
//!     .read(true)
//!     .write(true)
//!     .open("/dev/bus/usb/003/014")?
//!     .into();
//! let device = Device::from_fd(fd);
//!
//! // Take over interface 0 and read from its bulk IN endpoint 2.
//! device.detach_kernel_driver(0)?;
//! device.claim_interface(0)?;
//! let mut buf = vec![0u8; 4096];
//! let n = device.bulk_recv(2, &mut buf)?;
//! println!("{:02x?}", &buf[..n]);
//! device.release_interface(0)?;
//! # Ok(())
//! # }
//! ```
#![warn(clippy::all, clippy::pedantic, clippy::cargo, missing_docs)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod control;
mod descriptor;
mod device;
mod error;
pub(crate) mod ffi;
pub mod prelude;
mod transfer;
mod transport;
mod usbfs;
pub(crate) mod util;

pub use control::{
    ControlRequest, Direction, FeatureSelector, Recipient, RequestKind, StandardRequest,
    DEFAULT_TIMEOUT,
};
pub use descriptor::{config_total_length, DescriptorType, CONFIG_HEADER_LEN, MAX_STRING_LEN};
pub use device::Device;
pub use error::{Error, InterfaceOp, Result};
pub use transfer::{Completion, Transfer, TransferKind, ENDPOINT_DIR_IN, ENDPOINT_DIR_OUT};
pub use transport::Transport;
pub use usbfs::UsbFs;
