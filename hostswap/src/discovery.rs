//! Finds devices that answer HID++ and carry the ChangeHost feature.

use std::{ffi::CString, time::Duration};

use anyhow::{Context, Result, bail};
use hidapi::HidApi;
use hidpp_lite::{
    channel::HidppChannel,
    feature::{change_host, root::RootFeature},
    protocol::DIRECT_DEVICE_NUMBER,
};
use itertools::Itertools;
use tracing::{debug, info};

use crate::hidapi_impl::HidapiChannel;

/// The USB vendor ID of Logitech.
pub const LOGITECH_VENDOR_ID: u16 = 0x046d;

/// An open channel to a device expected to carry the ChangeHost feature,
/// together with the addressing needed to invoke it.
pub struct Session {
    pub channel: HidppChannel<HidapiChannel>,
    pub device_number: u8,
    pub feature_index: u8,
    pub path: String,

    /// Whether the addressing was supplied up front instead of probed.
    ///
    /// A pinned session stays silent until the switch request itself.
    pub pinned: bool,
}

/// Probes every Logitech HID interface on the machine and returns the first
/// device that carries the ChangeHost feature.
///
/// Interfaces that cannot be opened or do not speak HID++ are skipped; a
/// receiver used by another process or a plain HID keyboard next to the
/// device we want are expected, not errors.
pub fn discover(api: &HidApi, timeout: Duration) -> Result<Session> {
    let candidates = api
        .device_list()
        .filter(|info| info.vendor_id() == LOGITECH_VENDOR_ID)
        .unique_by(|info| info.path().to_owned());

    for info in candidates {
        let path = info.path().to_string_lossy().into_owned();

        let mut channel = match open_channel(api, &path, timeout) {
            Ok(channel) => channel,
            Err(err) => {
                debug!(%path, %err, "skipping interface");
                continue;
            },
        };

        if let Some((device_number, feature_index)) = probe_device_numbers(&mut channel) {
            info!(%path, device_number, feature_index, "found a ChangeHost device");

            return Ok(Session {
                channel,
                device_number,
                feature_index,
                path,
                pinned: false,
            });
        }
    }

    bail!("no Logitech HID++ device with the ChangeHost feature was found")
}

/// Probes a single HID interface for the ChangeHost feature, optionally
/// pinned to one device number.
pub fn probe_path(
    api: &HidApi,
    path: &str,
    device_number: Option<u8>,
    timeout: Duration,
) -> Result<Session> {
    let mut channel = open_channel(api, path, timeout)
        .with_context(|| format!("failed to open the device at {path}"))?;

    let probed = match device_number {
        Some(device_number) => probe_one(&mut channel, device_number),
        None => probe_device_numbers(&mut channel),
    };

    let Some((device_number, feature_index)) = probed else {
        bail!("no HID++ device with the ChangeHost feature answered at {path}");
    };

    Ok(Session {
        channel,
        device_number,
        feature_index,
        path: path.to_owned(),
        pinned: false,
    })
}

/// Opens a device with all addressing supplied up front, so the switch is
/// the first and only request on the wire.
pub fn open_pinned(
    api: &HidApi,
    path: &str,
    device_number: u8,
    feature_index: u8,
    timeout: Duration,
) -> Result<Session> {
    let channel = open_channel(api, path, timeout)
        .with_context(|| format!("failed to open the device at {path}"))?;

    Ok(Session {
        channel,
        device_number,
        feature_index,
        path: path.to_owned(),
        pinned: true,
    })
}

fn open_channel(
    api: &HidApi,
    path: &str,
    timeout: Duration,
) -> Result<HidppChannel<HidapiChannel>> {
    let cpath = CString::new(path).context("the device path contains a NUL byte")?;
    let device = api.open_path(&cpath)?;

    let mut channel = HidppChannel::of_raw_channel(HidapiChannel::new(device))
        .context("could not initialize the HID++ channel")?;
    channel.set_request_timeout(timeout);

    Ok(channel)
}

/// Walks the device numbers HID++ uses in practice: the receiver slots
/// `0..=7`, then direct addressing for devices on their own interface.
fn probe_device_numbers(channel: &mut HidppChannel<HidapiChannel>) -> Option<(u8, u8)> {
    (0u8..=7)
        .chain([DIRECT_DEVICE_NUMBER])
        .find_map(|device_number| probe_one(channel, device_number))
}

fn probe_one(channel: &mut HidppChannel<HidapiChannel>, device_number: u8) -> Option<(u8, u8)> {
    let mut root = RootFeature::new(channel, device_number);
    if !root.probe() {
        return None;
    }

    match root.get_feature_index(change_host::FEATURE_ID) {
        Ok(feature_index) => Some((device_number, feature_index)),
        Err(err) => {
            debug!(device_number, %err, "the device answers but cannot switch hosts");
            None
        },
    }
}
