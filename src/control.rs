//! Control-transfer request construction.
//!
//! Every standard USB device request is an 8-byte setup packet: a request-type
//! byte (direction, type and recipient bit-fields), a request code, and the
//! 16-bit `wValue`, `wIndex` and `wLength` fields. The bit positions cross the
//! wire to the device, so they are reproduced here exactly as USB 2.0 lays
//! them out.
//!
//! [`ControlRequest`] is a plain value object constructed fresh per call by
//! one of the per-request constructors and handed to the transport for a
//! one-shot control exchange.

use std::time::Duration;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::descriptor::DescriptorType;

/// Timeout applied to control exchanges unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Data-stage direction of a control transfer (bit 7 of `bmRequestType`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive)]
#[repr(u8)]
pub enum Direction {
    /// Host to device.
    Out = 0x00,
    /// Device to host.
    In = 0x80,
}

/// Request type (bits 6..5 of `bmRequestType`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive)]
#[repr(u8)]
pub enum RequestKind {
    /// Standard request defined by the USB specification.
    Standard = 0x00,
    /// Class-specific request.
    Class = 0x20,
    /// Vendor-specific request.
    Vendor = 0x40,
}

/// Target of a control request (bits 4..0 of `bmRequestType`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Recipient {
    /// The device as a whole.
    Device = 0,
    /// A single interface, addressed by `wIndex`.
    Interface = 1,
    /// A single endpoint, addressed by `wIndex`.
    Endpoint = 2,
    /// Another recipient defined by the class specification.
    Other = 3,
}

/// Standard request codes, chapter 9 of the USB 2.0 specification.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum StandardRequest {
    /// GET_STATUS
    GetStatus = 0x00,
    /// CLEAR_FEATURE
    ClearFeature = 0x01,
    /// SET_FEATURE
    SetFeature = 0x03,
    /// SET_ADDRESS
    SetAddress = 0x05,
    /// GET_DESCRIPTOR
    GetDescriptor = 0x06,
    /// SET_DESCRIPTOR
    SetDescriptor = 0x07,
    /// GET_CONFIGURATION
    GetConfiguration = 0x08,
    /// SET_CONFIGURATION
    SetConfiguration = 0x09,
    /// GET_INTERFACE
    GetInterface = 0x0A,
    /// SET_INTERFACE
    SetInterface = 0x0B,
    /// SYNCH_FRAME
    SynchFrame = 0x0C,
}

/// Feature selectors accepted by CLEAR_FEATURE.
///
/// The selector determines the recipient of the request: halting is an
/// endpoint property, remote wakeup and test mode are device properties.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum FeatureSelector {
    /// ENDPOINT_HALT — clears a stalled endpoint.
    EndpointHalt = 0,
    /// DEVICE_REMOTE_WAKEUP
    RemoteWakeup = 1,
    /// TEST_MODE
    TestMode = 2,
}

impl FeatureSelector {
    /// The recipient a CLEAR_FEATURE request for this selector addresses.
    #[must_use]
    pub fn recipient(self) -> Recipient {
        match self {
            FeatureSelector::EndpointHalt => Recipient::Endpoint,
            FeatureSelector::RemoteWakeup | FeatureSelector::TestMode => Recipient::Device,
        }
    }
}

/// One control-transfer setup, constructed fresh per call and never persisted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ControlRequest {
    /// Data-stage direction.
    pub direction: Direction,
    /// Standard, class or vendor request.
    pub kind: RequestKind,
    /// Recipient of the request.
    pub recipient: Recipient,
    /// Request code (`bRequest`).
    pub request: u8,
    /// `wValue` field.
    pub value: u16,
    /// `wIndex` field.
    pub index: u16,
    /// `wLength` field — the expected data-stage length.
    pub length: u16,
    /// Timeout for the whole exchange.
    pub timeout: Duration,
}

impl ControlRequest {
    fn standard(direction: Direction, recipient: Recipient, request: StandardRequest) -> Self {
        Self {
            direction,
            kind: RequestKind::Standard,
            recipient,
            request: request.into(),
            value: 0,
            index: 0,
            length: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// CLEAR_FEATURE for the given selector; the recipient follows the
    /// feature code.
    #[must_use]
    pub fn clear_feature(feature: FeatureSelector, index: u16) -> Self {
        let mut req = Self::standard(
            Direction::Out,
            feature.recipient(),
            StandardRequest::ClearFeature,
        );
        req.value = feature.into();
        req.index = index;
        req
    }

    /// GET_CONFIGURATION — reads the one-byte active configuration value.
    #[must_use]
    pub fn get_configuration() -> Self {
        let mut req = Self::standard(
            Direction::In,
            Recipient::Device,
            StandardRequest::GetConfiguration,
        );
        req.length = 1;
        req
    }

    /// GET_DESCRIPTOR with the type-dependent initial length.
    ///
    /// `wValue` packs the descriptor type in the high byte and the descriptor
    /// index in the low byte; `wIndex` carries the language id (zero for
    /// non-string descriptors).
    #[must_use]
    pub fn get_descriptor(kind: DescriptorType, index: u8, langid: u16) -> Self {
        let mut req = Self::standard(
            Direction::In,
            Recipient::Device,
            StandardRequest::GetDescriptor,
        );
        req.value = (u16::from(u8::from(kind)) << 8) | u16::from(index);
        req.index = langid;
        req.length = kind.initial_length();
        req
    }

    /// GET_INTERFACE — reads the one-byte active alternate setting.
    #[must_use]
    pub fn get_interface(interface: u16) -> Self {
        let mut req = Self::standard(
            Direction::In,
            Recipient::Interface,
            StandardRequest::GetInterface,
        );
        req.index = interface;
        req.length = 1;
        req
    }

    /// GET_STATUS for a caller-selected recipient; returns two status bytes.
    #[must_use]
    pub fn get_status(recipient: Recipient, index: u16) -> Self {
        let mut req = Self::standard(Direction::In, recipient, StandardRequest::GetStatus);
        req.index = index;
        req.length = 2;
        req
    }

    /// SET_ADDRESS — assigns the device address carried in `wValue`.
    #[must_use]
    pub fn set_address(address: u16) -> Self {
        let mut req = Self::standard(Direction::Out, Recipient::Device, StandardRequest::SetAddress);
        req.value = address;
        req
    }

    /// SET_CONFIGURATION — selects the configuration carried in `wValue`.
    #[must_use]
    pub fn set_configuration(value: u16) -> Self {
        let mut req = Self::standard(
            Direction::Out,
            Recipient::Device,
            StandardRequest::SetConfiguration,
        );
        req.value = value;
        req
    }

    /// SET_DESCRIPTOR with the fixed 126-byte payload length.
    #[must_use]
    pub fn set_descriptor(kind: DescriptorType, index: u8, langid: u16) -> Self {
        let mut req = Self::standard(
            Direction::Out,
            Recipient::Device,
            StandardRequest::SetDescriptor,
        );
        req.value = (u16::from(u8::from(kind)) << 8) | u16::from(index);
        req.index = langid;
        req.length = 126;
        req
    }

    /// SYNCH_FRAME — reads the two-byte frame number of an isochronous
    /// endpoint.
    #[must_use]
    pub fn synch_frame(endpoint: u8) -> Self {
        let mut req = Self::standard(
            Direction::In,
            Recipient::Endpoint,
            StandardRequest::SynchFrame,
        );
        req.index = u16::from(endpoint);
        req
    }

    /// The composed `bmRequestType` byte.
    #[must_use]
    pub fn request_type(&self) -> u8 {
        u8::from(self.direction) | u8::from(self.kind) | u8::from(self.recipient)
    }

    /// Replace the expected data-stage length.
    ///
    /// Used by the two-phase configuration-descriptor fetch, which reissues
    /// an otherwise identical request with the device-reported total length.
    #[must_use]
    pub fn with_length(mut self, length: u16) -> Self {
        self.length = length;
        self
    }

    /// Replace the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_type_bit_layout() {
        let req = ControlRequest::get_descriptor(DescriptorType::Device, 0, 0);
        assert_eq!(req.request_type(), 0x80);

        let req = ControlRequest::get_interface(3);
        assert_eq!(req.request_type(), 0x81);

        let req = ControlRequest::synch_frame(0x81);
        assert_eq!(req.request_type(), 0x82);

        let req = ControlRequest::set_address(7);
        assert_eq!(req.request_type(), 0x00);
    }

    #[test]
    fn clear_feature_recipient_follows_selector() {
        let req = ControlRequest::clear_feature(FeatureSelector::EndpointHalt, 0x81);
        assert_eq!(req.recipient, Recipient::Endpoint);
        assert_eq!(req.request_type(), 0x02);
        assert_eq!(req.value, 0);
        assert_eq!(req.index, 0x81);
        assert_eq!(req.length, 0);

        let req = ControlRequest::clear_feature(FeatureSelector::RemoteWakeup, 0);
        assert_eq!(req.recipient, Recipient::Device);
        assert_eq!(req.request_type(), 0x00);
        assert_eq!(req.value, 1);

        let req = ControlRequest::clear_feature(FeatureSelector::TestMode, 0);
        assert_eq!(req.recipient, Recipient::Device);
        assert_eq!(req.value, 2);
    }

    #[test]
    fn get_descriptor_packs_value_and_langid() {
        let req = ControlRequest::get_descriptor(DescriptorType::String, 2, 0x0409);
        assert_eq!(req.request, 0x06);
        assert_eq!(req.value, 0x0302);
        assert_eq!(req.index, 0x0409);
        assert_eq!(req.length, 255);
    }

    #[test]
    fn fixed_field_table() {
        let req = ControlRequest::get_configuration();
        assert_eq!(
            (req.request, req.value, req.index, req.length),
            (0x08, 0, 0, 1)
        );

        let req = ControlRequest::get_status(Recipient::Endpoint, 0x02);
        assert_eq!((req.request, req.value, req.index, req.length), (0x00, 0, 2, 2));
        assert_eq!(req.request_type(), 0x82);

        let req = ControlRequest::set_configuration(1);
        assert_eq!((req.request, req.value, req.index, req.length), (0x09, 1, 0, 0));

        let req = ControlRequest::set_descriptor(DescriptorType::Device, 0, 0);
        assert_eq!((req.request, req.value, req.index, req.length), (0x07, 0x0100, 0, 126));

        let req = ControlRequest::synch_frame(0x05);
        assert_eq!((req.request, req.value, req.index, req.length), (0x0C, 0, 5, 2));
    }

    #[test]
    fn default_timeout_and_overrides() {
        let req = ControlRequest::get_configuration();
        assert_eq!(req.timeout, DEFAULT_TIMEOUT);

        let req = req.with_timeout(Duration::from_millis(250)).with_length(64);
        assert_eq!(req.timeout, Duration::from_millis(250));
        assert_eq!(req.length, 64);
    }
}
