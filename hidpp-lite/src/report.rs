//! Implements the fixed-size framing of HID++ reports.
//!
//! Every HID++ frame starts with a report kind tag and the device number it
//! belongs to, followed by the payload. Requests always use the long report
//! kind; received frames may use any recognized kind and are classified
//! here before the channel decides what to do with them.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// The number of header bytes (report kind tag and device number) that
/// precede the payload of every HID++ report.
pub const REPORT_HEADER_LENGTH: usize = 2;

/// The payload capacity of a long HID++ report.
pub const LONG_PAYLOAD_LENGTH: usize = 18;

/// The total wire size of a long HID++ report.
pub const LONG_REPORT_LENGTH: usize = REPORT_HEADER_LENGTH + LONG_PAYLOAD_LENGTH;

/// The size of the buffer incoming reports are read into.
///
/// This equals the wire size of the largest recognized report kind
/// ([`ReportKind::DjLong`]).
pub const MAX_REPORT_LENGTH: usize = 32;

/// Represents the report kind tags a HID++ frame may start with.
///
/// A frame starting with any other byte is not HID++ at all and is foreign
/// traffic on the channel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum ReportKind {
    /// A short HID++ report (7 bytes).
    Short = 0x10,

    /// A long HID++ report (20 bytes).
    Long = 0x11,

    /// A short DJ report (15 bytes), multiplexed by some receivers.
    DjShort = 0x20,

    /// A long DJ report (32 bytes), multiplexed by some receivers.
    DjLong = 0x21,
}

/// Represents an error that occurred while encoding a HID++ report.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Indicates that a payload does not fit into the fixed 18 byte payload
    /// area of a long report.
    #[error("a payload of {len} bytes does not fit into the 18 byte payload of a long report")]
    PayloadTooLarge {
        /// The length of the rejected payload.
        len: usize,
    },
}

/// Represents a long HID++ report on its way out, with the payload
/// zero-padded to the fixed length.
///
/// All requests are sent as long reports, regardless of how many parameter
/// bytes they actually carry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LongReport {
    /// The device number the report addresses.
    pub device_number: u8,

    /// The zero-padded payload.
    pub payload: [u8; LONG_PAYLOAD_LENGTH],
}

impl LongReport {
    /// Tries to construct a long report from a device number and a payload of
    /// at most [`LONG_PAYLOAD_LENGTH`] bytes.
    ///
    /// The payload is copied and zero-padded to the fixed length.
    pub fn new(device_number: u8, payload: &[u8]) -> Result<Self, EncodeError> {
        if payload.len() > LONG_PAYLOAD_LENGTH {
            return Err(EncodeError::PayloadTooLarge { len: payload.len() });
        }

        let mut padded = [0u8; LONG_PAYLOAD_LENGTH];
        padded[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            device_number,
            payload: padded,
        })
    }

    /// Writes the report in its raw byte form into a buffer.
    ///
    /// The buffer has to hold at least [`LONG_REPORT_LENGTH`] bytes.
    ///
    /// Returns the amount of written bytes.
    pub fn write_raw(&self, buf: &mut [u8]) -> usize {
        buf[0] = ReportKind::Long.into();
        buf[1] = self.device_number;
        buf[REPORT_HEADER_LENGTH..LONG_REPORT_LENGTH].copy_from_slice(&self.payload);

        LONG_REPORT_LENGTH
    }
}

/// Represents a received HID++ report of any recognized kind, borrowed from
/// the read buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RawReport<'a> {
    /// The kind tag carried in the first byte.
    pub kind: ReportKind,

    /// The device number the report belongs to.
    pub device_number: u8,

    /// The payload bytes following the two header bytes.
    pub payload: &'a [u8],
}

impl<'a> RawReport<'a> {
    /// Tries to read a HID++ report from raw data.
    ///
    /// Returns [`None`] if the data does not start with a recognized report
    /// kind tag or is too short to carry the two header bytes. Such data is
    /// not HID++ and should be discarded by the caller.
    pub fn read_raw(data: &'a [u8]) -> Option<Self> {
        if data.len() < REPORT_HEADER_LENGTH {
            return None;
        }

        let kind = ReportKind::try_from(data[0]).ok()?;

        Some(Self {
            kind,
            device_number: data[1],
            payload: &data[REPORT_HEADER_LENGTH..],
        })
    }
}
