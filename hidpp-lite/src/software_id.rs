//! Implements the rolling software ID used to correlate requests with their
//! replies.
//!
//! A software ID is a 4-bit tag in the range `[0x2, 0xF]`. The values `0x0`
//! and `0x1` are reserved by the protocol (notifications and some vendor
//! tools claim them) and are never emitted.

use crate::nibble::U4;

/// The smallest software ID the generator emits.
const FIRST_SOFTWARE_ID: u8 = 0x2;

/// The largest software ID the generator emits before wrapping around.
const LAST_SOFTWARE_ID: u8 = 0xf;

/// Produces rolling software IDs in the range `[0x2, 0xF]`, wrapping from
/// `0xF` back to `0x2`.
///
/// One generator instance lives inside each request/reply channel; requests
/// are issued strictly one at a time, so the state needs no synchronization.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SoftwareIdGenerator {
    /// The value the next call to [`Self::next_id`] emits.
    upcoming: u8,
}

impl SoftwareIdGenerator {
    /// Constructs a generator whose first emitted software ID is `0x2`.
    pub fn new() -> Self {
        Self::starting_at(U4::from_lo(FIRST_SOFTWARE_ID))
    }

    /// Constructs a generator whose first emitted software ID is the given
    /// one, normalized into the valid range.
    ///
    /// This exists so tests can pin the correlation tags a request sequence
    /// will use.
    pub fn starting_at(software_id: U4) -> Self {
        Self {
            upcoming: software_id.to_lo().max(FIRST_SOFTWARE_ID),
        }
    }

    /// Emits the next software ID, advancing the rolling state by exactly one
    /// step.
    pub fn next_id(&mut self) -> U4 {
        let value = self.upcoming;

        self.upcoming = if value < LAST_SOFTWARE_ID {
            value + 1
        } else {
            FIRST_SOFTWARE_ID
        };

        U4::from_lo(value)
    }
}

impl Default for SoftwareIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
