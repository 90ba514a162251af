//! Bulk, interrupt and isochronous transfer descriptors.
//!
//! A [`Transfer`] describes one asynchronous exchange: the transfer kind, the
//! endpoint address (direction bit included), the buffer the transport owns
//! until the exchange is reaped, a caller-chosen token identifying the
//! exchange, and an optional completion signal. Completed exchanges come back
//! as [`Completion`] values carrying the token, the transport status, the
//! actual length and the buffer.

use nix::sys::signal::Signal;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Direction bit of an endpoint address: set for device-to-host.
pub const ENDPOINT_DIR_IN: u8 = 0x80;

/// Direction bit value for host-to-device endpoint addresses.
pub const ENDPOINT_DIR_OUT: u8 = 0x00;

/// Transfer kinds, numbered as usbfs numbers them on the wire to the kernel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TransferKind {
    /// Isochronous transfer — throughput over correctness.
    Isochronous = 0,
    /// Interrupt transfer — small, low latency.
    Interrupt = 1,
    /// Control transfer on the default endpoint.
    Control = 2,
    /// Bulk transfer — large, correctness over throughput.
    Bulk = 3,
}

/// One asynchronous exchange, valid from submission until reaped.
///
/// The buffer is moved into the transport for the lifetime of the exchange
/// and handed back unchanged (apart from received data) in the
/// [`Completion`]; nothing is copied.
#[derive(Debug)]
pub struct Transfer {
    pub(crate) kind: TransferKind,
    pub(crate) endpoint: u8,
    pub(crate) buffer: Vec<u8>,
    pub(crate) token: u64,
    pub(crate) signal: Option<Signal>,
}

impl Transfer {
    /// Describe an exchange of `kind` on `endpoint` (direction bit included)
    /// covering the whole of `buffer`.
    #[must_use]
    pub fn new(kind: TransferKind, endpoint: u8, buffer: Vec<u8>) -> Self {
        Self {
            kind,
            endpoint,
            buffer,
            token: 0,
            signal: None,
        }
    }

    /// Tag the exchange with a caller-chosen token, returned in its
    /// [`Completion`]. Tokens let a caller with several exchanges in flight
    /// tell their completions apart.
    #[must_use]
    pub fn with_token(mut self, token: u64) -> Self {
        self.token = token;
        self
    }

    /// Ask the transport to raise `signal` in the calling process when the
    /// exchange completes, decoupling completion awareness from polling.
    #[must_use]
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Transfer kind.
    #[must_use]
    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    /// Endpoint address, direction bit included.
    #[must_use]
    pub fn endpoint(&self) -> u8 {
        self.endpoint
    }

    /// Whether the exchange moves data device-to-host.
    #[must_use]
    pub fn is_in(&self) -> bool {
        self.endpoint & ENDPOINT_DIR_IN != 0
    }

    /// Requested length — always the full buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Caller-chosen token.
    #[must_use]
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Completion signal, if any.
    #[must_use]
    pub fn signal(&self) -> Option<Signal> {
        self.signal
    }
}

/// A reaped exchange.
#[derive(Debug)]
pub struct Completion {
    /// Token the exchange was submitted with.
    pub token: u64,
    /// Raw transport status: zero on success, a negative errno otherwise.
    /// A stalled endpoint shows up here, not as a reap failure.
    pub status: i32,
    /// Bytes actually moved; always at most the requested length, and
    /// legitimately zero for a short transfer.
    pub actual_length: usize,
    /// The buffer, returned to the caller.
    pub buffer: Vec<u8>,
}
