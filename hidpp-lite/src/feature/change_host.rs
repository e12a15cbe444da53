//! Implements the ChangeHost feature (ID `0x1814`) found on multi-host
//! devices.

use crate::{
    channel::{HidppChannel, RawHidChannel},
    feature::FeatureError,
    nibble::U4,
    protocol::RequestId,
};

/// The protocol ID of the ChangeHost feature.
pub const FEATURE_ID: u16 = 0x1814;

/// Implements the `ChangeHost` / `0x1814` feature.
///
/// Unlike the root feature, this one sits at a device-specific index in the
/// feature table that has to be resolved through
/// [`crate::feature::root::RootFeature::get_feature_index`] first.
pub struct ChangeHostFeature<'c, T: RawHidChannel> {
    /// The underlying HID++ channel.
    chan: &'c mut HidppChannel<T>,

    /// The number of the device to implement the feature for.
    device_number: u8,

    /// The index of the feature in the feature table.
    feature_index: u8,
}

impl<'c, T: RawHidChannel> ChangeHostFeature<'c, T> {
    /// Creates a new instance of the feature implementation.
    pub fn new(chan: &'c mut HidppChannel<T>, device_number: u8, feature_index: u8) -> Self {
        Self {
            chan,
            device_number,
            feature_index,
        }
    }

    /// Retrieves how many hosts the device is paired to and which one it is
    /// currently talking to.
    pub fn host_info(&mut self) -> Result<HostInfo, FeatureError<T::Error>> {
        let reply = self.chan.request(
            self.device_number,
            RequestId::new(self.feature_index, U4::from_lo(0x0)),
            &[],
        )?;

        let params = reply.extend_params();
        Ok(HostInfo {
            host_count: params[0],
            current_host: params[1],
        })
    }

    /// Tells the device to switch to the host paired at the given slot.
    ///
    /// The device drops off the current connection as soon as it acts on the
    /// request, so no reply is ever read back. A switch to the slot the
    /// device is already connected to may produce a reply, but it is not
    /// worth racing the disconnect for.
    pub fn set_current_host(&mut self, host_slot: u8) -> Result<(), FeatureError<T::Error>> {
        self.chan.send_and_forget(
            self.device_number,
            RequestId::new(self.feature_index, U4::from_lo(0x1)),
            &[host_slot],
        )?;

        Ok(())
    }
}

/// Represents the pairing state as reported by [`ChangeHostFeature::host_info`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HostInfo {
    /// The number of host slots the device offers.
    pub host_count: u8,

    /// The slot of the host the device is currently connected to, starting
    /// at `0`.
    pub current_host: u8,
}
