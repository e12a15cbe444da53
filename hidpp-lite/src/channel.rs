//! Implements request/reply messaging across HID and HID++ channels.
//!
//! This includes mapping incoming reports to the previously sent request by
//! device number and echoed request identifier.

use std::{
    error::Error,
    time::{Duration, Instant},
};

use hidreport::{Field, Report, ReportDescriptor, Usage, UsageId, UsagePage};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    protocol::{AddressClass, DIRECT_DEVICE_NUMBER, REQUEST_ID_LENGTH, RequestId},
    report::{
        EncodeError, LONG_PAYLOAD_LENGTH, LONG_REPORT_LENGTH, LongReport, MAX_REPORT_LENGTH,
        RawReport, ReportKind,
    },
    software_id::SoftwareIdGenerator,
};

/// hidapi defines this as the maximum EXPECTED size of report descriptors.
/// We will trust this for now, but a workaround may be required if devices do
/// in fact return longer descriptors.
const MAX_REPORT_DESCRIPTOR_LENGTH: usize = 4096;

const LONG_REPORT_USAGE_PAGE: u16 = 0xff00;
const LONG_REPORT_USAGE: u16 = 0x0002;

/// The parameter capacity of a request or reply: the long report payload
/// minus the request identifier.
pub const MAX_PARAMETER_LENGTH: usize = LONG_PAYLOAD_LENGTH - REQUEST_ID_LENGTH;

/// The reply budget applied to every request unless reconfigured via
/// [`HidppChannel::set_request_timeout`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(4000);

/// The upper bound of a single blocking read inside the reply-matching loop.
///
/// This bounds how long the engine stays suspended before it re-checks the
/// remaining budget, and thereby the worst-case overshoot past the deadline.
pub const READ_SLICE: Duration = Duration::from_millis(200);

/// Represents an arbitrary HID communication channel that is both readable and
/// writable, with blocking I/O.
///
/// Any type this trait is implemented for can be used for HID(++)
/// communication. Whether a specific channel supports HID++ is determined at a
/// later stage and is not directly related to potential implementations of
/// this trait.
pub trait RawHidChannel {
    /// An implementation-specific error type.
    type Error: Error;

    /// Writes a raw report to the channel.
    ///
    /// Returns the exact amount of written bytes on success.
    fn write_report(&mut self, src: &[u8]) -> Result<usize, Self::Error>;

    /// Reads a raw report from the channel, waiting at most `timeout` for one
    /// to arrive.
    ///
    /// Returns `Ok(None)` if no report arrived in time. If the buffer is not
    /// large enough to fit the whole report, its remainder should be discarded
    /// and must not be returned by any succeeding call.
    fn read_report(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<usize>, Self::Error>;

    /// If the implementation already knows whether the underlying HID channel
    /// supports long HID++ reports, it should return `Some(..)` from this
    /// method.
    ///
    /// In this case, the report descriptor will not be read and parsed.
    fn supports_long_hidpp(&self) -> Option<bool>;

    /// Retrieves the raw HID report descriptor from the channel.
    ///
    /// This is used to determine whether the channel supports HID++.
    ///
    /// Returns the exact size of the report descriptor on success.
    fn get_report_descriptor(&self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Checks whether a raw channel supports long HID++ reports.
fn supports_long_hidpp<T: RawHidChannel>(chan: &T) -> Result<bool, ChannelError<T::Error>> {
    if let Some(supported) = chan.supports_long_hidpp() {
        return Ok(supported);
    }

    let mut raw_descriptor = vec![0u8; MAX_REPORT_DESCRIPTOR_LENGTH];
    let descriptor_size = chan.get_report_descriptor(&mut raw_descriptor)?;

    let descriptor = match ReportDescriptor::try_from(&raw_descriptor[..descriptor_size]) {
        Ok(val) => val,
        Err(err) => return Err(ChannelError::ReportDescriptor(err)),
    };

    let supports_long = descriptor
        .find_input_report(&[u8::from(ReportKind::Long)])
        .and_then(|report| report.fields().first())
        .and_then(|field| match field {
            Field::Array(arr) => Some(arr.usage_range()),
            _ => None,
        })
        .is_some_and(|range| {
            range
                .lookup_usage(&Usage::from_page_and_id(
                    UsagePage::from(LONG_REPORT_USAGE_PAGE),
                    UsageId::from(LONG_REPORT_USAGE),
                ))
                .is_some()
        });

    Ok(supports_long)
}

/// Represents the parameter bytes of a correlated reply, with the report
/// header and the identifier echo already stripped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Reply {
    /// The parameter bytes, zero-extended to the fixed capacity.
    params: [u8; MAX_PARAMETER_LENGTH],

    /// The amount of parameter bytes the reply actually carried.
    len: usize,
}

impl Reply {
    /// Builds a reply from the payload bytes following the identifier echo,
    /// truncated to the parameter capacity of a long report.
    fn from_payload(payload: &[u8]) -> Self {
        let len = payload.len().min(MAX_PARAMETER_LENGTH);

        let mut params = [0u8; MAX_PARAMETER_LENGTH];
        params[..len].copy_from_slice(&payload[..len]);

        Self { params, len }
    }

    /// The parameter bytes the reply carried.
    pub fn params(&self) -> &[u8] {
        &self.params[..self.len]
    }

    /// Extracts the parameter bytes and fits them into an array capable of
    /// containing the longest possible reply, filling the rest up with zeroes.
    pub fn extend_params(&self) -> [u8; MAX_PARAMETER_LENGTH] {
        self.params
    }
}

/// The state of the reply-matching loop after a single pass.
enum ReplyPoll {
    /// Nothing matched yet and the remaining budget allows another pass.
    Waiting,

    /// A correlated reply arrived.
    Matched(Reply),

    /// The deadline passed without a correlated reply.
    TimedOut,
}

/// Decides whether received data is the reply to the given request.
///
/// Returns [`None`] for everything that has to be discarded: foreign
/// (non-HID++) traffic, reports belonging to unrelated device numbers,
/// payloads too short to echo an identifier, and echoes of other identifiers
/// (notifications, or cross-talk from requests issued by other software).
fn classify_reply(expected_device_number: u8, request_id: RequestId, data: &[u8]) -> Option<Reply> {
    let Some(report) = RawReport::read_raw(data) else {
        trace!("discarding non-HID++ data");
        return None;
    };

    if AddressClass::classify(expected_device_number, report.device_number).is_none() {
        trace!(
            device_number = report.device_number,
            "discarding report of an unrelated device"
        );
        return None;
    }

    let Some(echo) = RequestId::read_echo(report.payload) else {
        trace!("discarding report without an identifier echo");
        return None;
    };

    if echo != request_id {
        trace!(?echo, "discarding unrelated reply or notification");
        return None;
    }

    Some(Reply::from_payload(&report.payload[REQUEST_ID_LENGTH..]))
}

/// Represents a HID communication channel supporting HID++, together with the
/// request/reply engine that runs on top of it.
///
/// The engine owns the raw channel exclusively and issues strictly one
/// request at a time; a reply (or the timeout) has to resolve the current
/// request before the next one can be expressed.
pub struct HidppChannel<T: RawHidChannel> {
    /// The underlying raw HID channel.
    raw_channel: T,

    /// The rolling correlation tags spliced into outgoing identifiers.
    software_ids: SoftwareIdGenerator,

    /// The reply budget applied to every request.
    request_timeout: Duration,
}

impl<T: RawHidChannel> HidppChannel<T> {
    /// Tries to construct a HID++ channel from a raw HID channel.
    ///
    /// If the given HID channel does not support long HID++ reports,
    /// [`ChannelError::HidppNotSupported`] will be returned.
    pub fn of_raw_channel(raw: T) -> Result<Self, ChannelError<T::Error>> {
        if !supports_long_hidpp(&raw)? {
            return Err(ChannelError::HidppNotSupported);
        }

        Ok(Self {
            raw_channel: raw,
            software_ids: SoftwareIdGenerator::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Replaces the software ID generator, e.g. to pin the correlation tags a
    /// request sequence will use.
    pub fn set_software_ids(&mut self, software_ids: SoftwareIdGenerator) {
        self.software_ids = software_ids;
    }

    /// Sets the reply budget applied to every request.
    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    /// Gets a reference to the underlying raw channel.
    pub fn get_ref(&self) -> &T {
        &self.raw_channel
    }

    /// Gets a mutable reference to the underlying raw channel.
    ///
    /// Reports read directly from the raw channel bypass reply correlation.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.raw_channel
    }

    /// Sends a request across the channel and blocks until the correlated
    /// reply arrives or the timeout budget is exhausted.
    ///
    /// If no response is expected/required, use [`Self::send_and_forget`].
    pub fn request(
        &mut self,
        device_number: u8,
        request_id: RequestId,
        params: &[u8],
    ) -> Result<Reply, ChannelError<T::Error>> {
        let request_id = self.splice_software_id(device_number, request_id);
        self.write_request(device_number, request_id, params)?;

        let started = Instant::now();

        loop {
            match self.poll_reply(device_number, request_id, started)? {
                ReplyPoll::Waiting => {},
                ReplyPoll::Matched(reply) => return Ok(reply),
                ReplyPoll::TimedOut => {
                    debug!(device_number, ?request_id, "request timed out");

                    return Err(ChannelError::Timeout {
                        budget: self.request_timeout,
                    });
                },
            }
        }
    }

    /// Sends a request across the channel and does not wait for a response.
    ///
    /// Success means the frame was accepted by the transport, not that the
    /// device acted on it. If a response is expected, use [`Self::request`].
    pub fn send_and_forget(
        &mut self,
        device_number: u8,
        request_id: RequestId,
        params: &[u8],
    ) -> Result<(), ChannelError<T::Error>> {
        let request_id = self.splice_software_id(device_number, request_id);
        self.write_request(device_number, request_id, params)
    }

    /// Splices a fresh software ID into the identifier's low 4 bits.
    ///
    /// Identifiers going out with direct addressing and notification-style
    /// identifiers are passed through untouched.
    fn splice_software_id(&mut self, device_number: u8, request_id: RequestId) -> RequestId {
        if device_number == DIRECT_DEVICE_NUMBER || request_id.is_notification() {
            return request_id;
        }

        request_id.with_software_id(self.software_ids.next_id())
    }

    /// Encodes a request into a long report and writes it to the channel,
    /// requiring the full frame to be accepted at once.
    fn write_request(
        &mut self,
        device_number: u8,
        request_id: RequestId,
        params: &[u8],
    ) -> Result<(), ChannelError<T::Error>> {
        if params.len() > MAX_PARAMETER_LENGTH {
            return Err(ChannelError::Encode(EncodeError::PayloadTooLarge {
                len: REQUEST_ID_LENGTH + params.len(),
            }));
        }

        let mut payload = [0u8; LONG_PAYLOAD_LENGTH];
        payload[..REQUEST_ID_LENGTH].copy_from_slice(&request_id.to_be_bytes());
        payload[REQUEST_ID_LENGTH..REQUEST_ID_LENGTH + params.len()].copy_from_slice(params);

        let report = LongReport::new(device_number, &payload).map_err(ChannelError::Encode)?;

        debug!(device_number, ?request_id, "sending request");

        let mut buf = [0u8; LONG_REPORT_LENGTH];
        let len = report.write_raw(&mut buf);

        let written = self.raw_channel.write_report(&buf[..len])?;
        if written != len {
            return Err(ChannelError::PartialWrite {
                written,
                expected: len,
            });
        }

        Ok(())
    }

    /// Performs one pass of the reply-matching loop: a single bounded read
    /// followed by classification of whatever arrived.
    fn poll_reply(
        &mut self,
        device_number: u8,
        request_id: RequestId,
        started: Instant,
    ) -> Result<ReplyPoll, ChannelError<T::Error>> {
        // Stays in Duration math: adding an arbitrary budget to an Instant
        // can overflow the clock.
        let remaining = self.request_timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Ok(ReplyPoll::TimedOut);
        }

        let mut buf = [0u8; MAX_REPORT_LENGTH];
        let Some(len) = self
            .raw_channel
            .read_report(&mut buf, remaining.min(READ_SLICE))?
        else {
            return Ok(ReplyPoll::Waiting);
        };

        match classify_reply(device_number, request_id, &buf[..len]) {
            Some(reply) => Ok(ReplyPoll::Matched(reply)),
            None => Ok(ReplyPoll::Waiting),
        }
    }
}

/// Represents an error that occurred when creating or interacting with a HID
/// or HID++ communication channel.
#[derive(Debug, Error)]
pub enum ChannelError<T: Error> {
    /// Indicates that the concrete implementation of [`RawHidChannel`] returned
    /// an error of type [`RawHidChannel::Error`].
    #[error("the HID channel implementation returned an error")]
    Implementation(#[from] T),

    /// Indicates that a request did not fit into a long report.
    #[error("the request could not be encoded")]
    Encode(#[source] EncodeError),

    /// Indicates that the channel accepted only part of a frame.
    #[error("the channel accepted {written} of {expected} frame bytes")]
    PartialWrite {
        /// The amount of bytes the channel accepted.
        written: usize,

        /// The full frame length.
        expected: usize,
    },

    /// Indicates that the HID report descriptor could not be parsed.
    #[error("the report descriptor could not be parsed")]
    ReportDescriptor(hidreport::ParserError),

    /// Indicates that the channel in question does not support long HID++
    /// reports.
    #[error("the HID channel does not support long HID++ reports")]
    HidppNotSupported,

    /// Indicates that no correlated reply arrived within the timeout budget.
    #[error("no correlated reply arrived within {budget:?}")]
    Timeout {
        /// The budget that was exhausted.
        budget: Duration,
    },
}
