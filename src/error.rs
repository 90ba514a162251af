use std::fmt::Display;

use nix::errno::Errno;

use crate::{control::StandardRequest, transfer::TransferKind};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned by device operations.
///
/// usbfs collapses stalls, disconnects, permission problems and timeouts into
/// a single failing ioctl, so each variant carries the operation identity and
/// the raw OS status rather than attempting a finer classification. A caller
/// that sees a failed bulk or interrupt transfer should treat it as a possible
/// stall and issue [`Device::clear_feature`](crate::Device::clear_feature)
/// with [`FeatureSelector::EndpointHalt`](crate::FeatureSelector::EndpointHalt)
/// before retrying.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A control exchange failed.
    #[error("{request:?} request failed: {errno}")]
    Control {
        /// The standard request that was being issued.
        request: StandardRequest,
        /// OS status reported by the transport.
        errno: Errno,
    },

    /// Submitting or reaping a bulk/interrupt/isochronous transfer failed.
    #[error("{kind:?} transfer on endpoint {endpoint:#04x} failed: {errno}")]
    Transfer {
        /// Kind of transfer that failed.
        kind: TransferKind,
        /// Endpoint address, including the direction bit.
        endpoint: u8,
        /// OS status reported by the transport.
        errno: Errno,
    },

    /// An interface claim/release/detach/driver query failed.
    #[error("{op} failed for interface {interface}: {errno}")]
    Interface {
        /// The interface operation that failed.
        op: InterfaceOp,
        /// Interface number the operation addressed.
        interface: u16,
        /// OS status reported by the transport.
        errno: Errno,
    },

    /// Polling for a completed asynchronous transfer failed.
    ///
    /// Not raised when nothing has completed yet — that is `Ok(None)` on the
    /// polling call — nor when a transfer completed unsuccessfully, which is
    /// reported through its completion status.
    #[error("reaping a completed transfer failed: {errno}")]
    Reap {
        /// OS status reported by the transport.
        errno: Errno,
    },

    /// A caller-supplied buffer is smaller than the length the request needs.
    #[error("buffer of {capacity} bytes is too small, {needed} bytes required")]
    BufferTooSmall {
        /// Bytes the operation requires.
        needed: usize,
        /// Bytes the caller provided.
        capacity: usize,
    },
}

/// Identifies which interface-level operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceOp {
    /// `claim_interface`
    Claim,
    /// `release_interface`
    Release,
    /// `detach_kernel_driver`
    Detach,
    /// `set_interface`
    SetAltSetting,
    /// `driver_name`
    DriverName,
}

impl Display for InterfaceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InterfaceOp::Claim => "claim",
            InterfaceOp::Release => "release",
            InterfaceOp::Detach => "driver detach",
            InterfaceOp::SetAltSetting => "alt-setting select",
            InterfaceOp::DriverName => "driver name query",
        };
        f.write_str(name)
    }
}
