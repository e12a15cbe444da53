//! Implements the Root feature (ID `0x0000`) that every device supports by
//! default.

use crate::{
    channel::{HidppChannel, RawHidChannel},
    feature::{FeatureError, feature_set},
    nibble::U4,
    protocol::RequestId,
};

/// The protocol ID of the Root feature.
pub const FEATURE_ID: u16 = 0x0000;

/// Implements the `Root` / `0x0000` feature that every HID++2.0 device
/// supports by default.
///
/// The root feature always sits at index `0` of the feature table, so it can
/// be invoked without any prior lookup. Its main purpose is to resolve the
/// table indices of all other features.
pub struct RootFeature<'c, T: RawHidChannel> {
    /// The underlying HID++ channel.
    chan: &'c mut HidppChannel<T>,

    /// The number of the device to implement the feature for.
    device_number: u8,
}

impl<'c, T: RawHidChannel> RootFeature<'c, T> {
    /// Creates a new instance of the feature implementation.
    pub fn new(chan: &'c mut HidppChannel<T>, device_number: u8) -> Self {
        Self {
            chan,
            device_number,
        }
    }

    /// Resolves the feature table index of a specific feature ID.
    ///
    /// If the device does not support the feature, it reports index `0` and
    /// this function fails with [`FeatureError::NotSupported`].
    pub fn get_feature_index(&mut self, feature_id: u16) -> Result<u8, FeatureError<T::Error>> {
        let reply = self.chan.request(
            self.device_number,
            RequestId::new(0, U4::from_lo(0x0)),
            &feature_id.to_be_bytes(),
        )?;

        let index = reply.extend_params()[0];
        if index == 0 {
            return Err(FeatureError::NotSupported);
        }

        Ok(index)
    }

    /// Checks whether the addressed device speaks HID++2.0 at all.
    ///
    /// This resolves the FeatureSet feature, which every HID++2.0 device
    /// supports. Anything other than a well-formed reply carrying a non-zero
    /// index means the device number is not worth talking to.
    pub fn probe(&mut self) -> bool {
        self.get_feature_index(feature_set::FEATURE_ID).is_ok()
    }
}
