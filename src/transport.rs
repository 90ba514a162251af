//! The transport seam between device operations and the kernel.
//!
//! usbfs exposes exactly this contract: a one-shot control exchange, a
//! two-step submit/reap protocol for every other transfer kind, and a handful
//! of interface-management requests keyed by interface number. [`Transport`]
//! captures that contract as a trait so device logic can be exercised against
//! a scripted implementation; [`UsbFs`](crate::UsbFs) is the real one.
//!
//! Methods report the raw OS status ([`Errno`]); the [`Device`](crate::Device)
//! layer attaches operation identity on the way out.

use nix::errno::Errno;

use crate::{
    control::ControlRequest,
    transfer::{Completion, Transfer, TransferKind},
};

/// A submit/reap request transport bound to one open device.
pub trait Transport {
    /// Perform a one-shot control exchange.
    ///
    /// `data` backs the data stage and must hold at least `request.length`
    /// bytes; whether it is read or written follows the request's direction
    /// bit. Returns the number of bytes moved in the data stage.
    fn control(&self, request: &ControlRequest, data: &mut [u8]) -> Result<usize, Errno>;

    /// Submit an OUT transfer and block until it is reaped.
    ///
    /// Returns the actual number of bytes sent, which may legitimately fall
    /// short of `data.len()`.
    fn send_sync(&self, kind: TransferKind, endpoint: u8, data: &[u8]) -> Result<usize, Errno>;

    /// Submit an IN transfer and block until it is reaped.
    ///
    /// Returns the actual number of bytes received, at most `buf.len()` and
    /// legitimately zero.
    fn recv_sync(&self, kind: TransferKind, endpoint: u8, buf: &mut [u8]) -> Result<usize, Errno>;

    /// Enqueue an asynchronous transfer.
    ///
    /// The transport owns the transfer's buffer until the exchange is
    /// returned by [`reap_ready`](Transport::reap_ready).
    fn submit(&self, transfer: Transfer) -> Result<(), Errno>;

    /// Reap one completed asynchronous transfer without blocking.
    ///
    /// `Ok(None)` means nothing has completed yet — not a failure. A
    /// completed-but-unsuccessful exchange is reported through
    /// [`Completion::status`], not through the error path.
    fn reap_ready(&self) -> Result<Option<Completion>, Errno>;

    /// Select an alternate setting on an interface.
    fn set_interface(&self, interface: u16, alt_setting: u16) -> Result<(), Errno>;

    /// Claim exclusive host-side access to an interface.
    fn claim_interface(&self, interface: u16) -> Result<(), Errno>;

    /// Release a previously claimed interface.
    fn release_interface(&self, interface: u16) -> Result<(), Errno>;

    /// Force the kernel-resident driver off an interface so it can be
    /// claimed.
    fn detach_kernel_driver(&self, interface: u16) -> Result<(), Errno>;

    /// Name of the kernel driver currently bound to an interface.
    fn driver_name(&self, interface: u16) -> Result<String, Errno>;
}
