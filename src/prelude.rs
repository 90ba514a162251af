//! Public prelude of the crate containing the most commonly used types and functions.

pub use crate::{
    Completion, ControlRequest, DescriptorType, Device, Error, FeatureSelector, Recipient, Result,
    Transfer, TransferKind, Transport, UsbFs,
};
