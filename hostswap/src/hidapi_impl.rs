//! Implements HID communication using the `hidapi` crate.

use std::time::Duration;

use hidapi::{HidDevice, HidError};
use hidpp_lite::channel::RawHidChannel;

/// A [`RawHidChannel`] over a single open hidraw handle.
pub struct HidapiChannel {
    device: HidDevice,
}

impl HidapiChannel {
    pub fn new(device: HidDevice) -> Self {
        Self { device }
    }
}

impl RawHidChannel for HidapiChannel {
    type Error = HidError;

    fn write_report(&mut self, src: &[u8]) -> Result<usize, Self::Error> {
        self.device.write(src)
    }

    fn read_report(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<usize>, Self::Error> {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);

        // hid_read_timeout reports a timeout as a read of zero bytes.
        match self.device.read_timeout(buf, millis)? {
            0 => Ok(None),
            len => Ok(Some(len)),
        }
    }

    fn supports_long_hidpp(&self) -> Option<bool> {
        None
    }

    fn get_report_descriptor(&self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.device.get_report_descriptor(buf)
    }
}
