//! Internal utility types.

use std::marker::PhantomData;

/// Used to force a type to be `!Sync`.
///
/// usbfs assumes at most one outstanding transfer per endpoint direction, so
/// a device handle must not be shared across threads without external
/// synchronization.
pub type PhantomUnsync = PhantomData<std::cell::Cell<()>>;
