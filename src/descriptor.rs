//! USB descriptor type codes and fetch sizes.
//!
//! A descriptor is a fixed-format byte record the device returns to describe
//! itself, a configuration, an interface or an endpoint. Its first byte is its
//! own length, its second byte the type code. The type codes and minimum sizes
//! below are protocol constants and must not be renumbered.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Upper bound on a string descriptor, fixed by the protocol.
pub const MAX_STRING_LEN: usize = 255;

/// Size of a configuration descriptor header; the full configuration set that
/// follows it is longer.
pub const CONFIG_HEADER_LEN: usize = 9;

/// Standard descriptor type codes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DescriptorType {
    /// Device descriptor.
    Device = 1,
    /// Configuration descriptor (header of the whole configuration set).
    Configuration = 2,
    /// String descriptor, UTF-16-LE payload.
    String = 3,
    /// Interface descriptor.
    Interface = 4,
    /// Endpoint descriptor.
    Endpoint = 5,
    /// Device-qualifier descriptor (high-speed capable devices only).
    DeviceQualifier = 6,
    /// Other-speed configuration descriptor.
    OtherSpeedConfiguration = 7,
}

impl DescriptorType {
    /// Length requested on the first GET_DESCRIPTOR exchange for this type.
    ///
    /// For configuration descriptors this covers only the 9-byte header; the
    /// total length of the set is read from the header and fetched in a
    /// second exchange. String descriptors are requested at their protocol
    /// maximum since their length is unknown up front.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn initial_length(self) -> u16 {
        match self {
            DescriptorType::Device => 18,
            DescriptorType::Configuration => CONFIG_HEADER_LEN as u16,
            DescriptorType::String => MAX_STRING_LEN as u16,
            DescriptorType::Interface => 9,
            DescriptorType::Endpoint => 7,
            DescriptorType::DeviceQualifier | DescriptorType::OtherSpeedConfiguration => 32,
        }
    }
}

/// Total length of the configuration set, read from bytes [2,3] of a
/// configuration descriptor header (little-endian).
#[must_use]
pub fn config_total_length(header: &[u8]) -> u16 {
    u16::from_le_bytes([header[2], header[3]])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn type_codes_are_protocol_constants() {
        assert_eq!(u8::from(DescriptorType::Device), 1);
        assert_eq!(u8::from(DescriptorType::Configuration), 2);
        assert_eq!(u8::from(DescriptorType::String), 3);
        assert_eq!(u8::from(DescriptorType::Interface), 4);
        assert_eq!(u8::from(DescriptorType::Endpoint), 5);
        assert_eq!(u8::from(DescriptorType::DeviceQualifier), 6);
        assert_eq!(u8::from(DescriptorType::OtherSpeedConfiguration), 7);
    }

    #[test]
    fn initial_lengths() {
        assert_eq!(DescriptorType::Device.initial_length(), 18);
        assert_eq!(DescriptorType::Configuration.initial_length(), 9);
        assert_eq!(DescriptorType::String.initial_length(), 255);
        assert_eq!(DescriptorType::Interface.initial_length(), 9);
        assert_eq!(DescriptorType::Endpoint.initial_length(), 7);
        assert_eq!(DescriptorType::DeviceQualifier.initial_length(), 32);
        assert_eq!(DescriptorType::OtherSpeedConfiguration.initial_length(), 32);
    }

    #[test]
    fn total_length_is_little_endian() {
        let header = [0x09, 0x02, 0x22, 0x01, 0x01, 0x01, 0x00, 0x80, 0x32];
        assert_eq!(config_total_length(&header), 0x0122);
    }
}
