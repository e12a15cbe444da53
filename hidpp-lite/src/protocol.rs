//! Implements the request identifiers and addressing rules shared by all
//! HID++2.0 feature invocations.

use std::fmt;

use crate::nibble::U4;

/// The device number to use when addressing the interface itself instead of
/// one of the paired device slots, e.g. for wired devices or a receiver.
///
/// Requests addressed this way are passed through without a software ID.
pub const DIRECT_DEVICE_NUMBER: u8 = 0xff;

/// The size of a request identifier in its wire form. Every reply echoes the
/// identifier of the request it answers in its first payload bytes.
pub const REQUEST_ID_LENGTH: usize = 2;

/// Represents the 16-bit identifier that starts the payload of every HID++2.0
/// request and is echoed back by the device at the start of the reply.
///
/// The high byte selects the feature index, the high nibble of the low byte
/// selects the function and the low nibble carries the software ID used to
/// correlate a reply with its request.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u16);

impl RequestId {
    /// Constructs a request identifier for a function of the feature at the
    /// given index, with the software ID bits left at zero.
    pub const fn new(feature_index: u8, function_id: U4) -> Self {
        Self(u16::from_be_bytes([feature_index, function_id.to_hi()]))
    }

    /// Constructs a request identifier from its raw 16-bit form.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the identifier with the given software ID spliced into its low
    /// 4 bits, leaving the other 12 bits untouched.
    pub const fn with_software_id(self, software_id: U4) -> Self {
        Self((self.0 & 0xfff0) | software_id.to_lo() as u16)
    }

    /// Checks whether the identifier lies in the notification/register range
    /// (top bit set).
    ///
    /// Such identifiers are written verbatim and never receive a software ID.
    pub const fn is_notification(self) -> bool {
        self.0 & 0x8000 != 0
    }

    /// The feature index selected by the high byte.
    pub const fn feature_index(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// The function selected by the high nibble of the low byte.
    pub const fn function_id(self) -> U4 {
        U4::from_hi(self.0 as u8)
    }

    /// The software ID carried in the low 4 bits.
    pub const fn software_id(self) -> U4 {
        U4::from_lo(self.0 as u8)
    }

    /// The identifier in its big-endian wire form.
    pub const fn to_be_bytes(self) -> [u8; REQUEST_ID_LENGTH] {
        self.0.to_be_bytes()
    }

    /// Tries to read an identifier echo from the first bytes of a payload.
    ///
    /// Returns [`None`] if the payload is too short to contain one.
    pub fn read_echo(payload: &[u8]) -> Option<Self> {
        if payload.len() < REQUEST_ID_LENGTH {
            return None;
        }

        Some(Self(u16::from_be_bytes([payload[0], payload[1]])))
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({:#06x})", self.0)
    }
}

/// Represents how the device number of a received report relates to the
/// device number a request was addressed to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AddressClass {
    /// The received device number equals the expected one.
    Direct,

    /// The received device number is the bitwise complement of the expected
    /// one. Some receivers use this form for error and unnumbered echoes.
    Complement,
}

impl AddressClass {
    /// Classifies a received device number against the expected one.
    ///
    /// Returns [`None`] if the two are unrelated, i.e. the report belongs to
    /// a different device.
    pub fn classify(expected: u8, received: u8) -> Option<Self> {
        if received == expected {
            Some(Self::Direct)
        } else if received == !expected {
            Some(Self::Complement)
        } else {
            None
        }
    }
}
