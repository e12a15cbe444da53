//! A minimal client for Logitech's HID++ protocol.
//!
//! Many of Logitech's more modern peripheral devices (mice, keyboards etc.)
//! support advanced features improving the user experience. All of these
//! features can be managed using their (more or less) proprietary
//! HID++-protocol which extends standard [HID](https://en.wikipedia.org/wiki/Human_interface_device).
//!
//! This crate deliberately implements only the small slice of HID++2.0 that
//! is needed to discover a feature on a device and invoke its functions:
//!
//! - encoding and decoding of long HID++ reports ([`report`])
//! - request identifiers and the software ID scheme used to correlate
//!   replies with requests ([`protocol`], [`software_id`])
//! - a blocking request/reply channel on top of a raw HID connection
//!   ([`channel`])
//! - the Root feature for resolving feature table indices and the ChangeHost
//!   feature for hopping between paired hosts ([`feature`])
//!
//! Logitech kindly provided a [public Google Drive folder](https://drive.google.com/drive/folders/0BxbRzx7vEV7eWmgwazJ3NUFfQ28)
//! with a lot of documentation on HID++ and several device features. These
//! documents were heavily used during the development of this crate.
//!
//! I also made use of the excellent work already done by the
//! [Solaar](https://github.com/pwr-Solaar/Solaar) team to grow my
//! understanding of how things work. It's a great project perfectly usable to
//! configure Logitech devices on Linux, so definitely check it out if you are
//! looking for something like this.
//!
//! # Quickstart
//!
//! This crate implements the HID++ protocol, not the underlying [HID](https://en.wikipedia.org/wiki/Human_interface_device)
//! communication, which is left to an external crate of your choice.
//! The trait used for bridging your HID implementation to this crate is
//! [`channel::RawHidChannel`], so make sure to provide an implementation for
//! it. All communication is blocking; reads take a timeout so the channel
//! can give up on requests that will never be answered.
//!
//! Once you have a working implementation, wrap it in a
//! [`channel::HidppChannel`] via [`channel::HidppChannel::of_raw_channel`].
//! The constructor checks that the connection can carry long HID++ reports
//! at all and refuses with [`channel::ChannelError::HidppNotSupported`]
//! otherwise.
//!
//! From there, [`feature::root::RootFeature`] resolves the feature table
//! index of any feature by its protocol ID, and
//! [`feature::change_host::ChangeHostFeature`] invokes the host switch on
//! that index.

pub mod channel;
pub mod feature;
pub mod nibble;
pub mod protocol;
pub mod report;
pub mod software_id;
