//! Exercises the request/reply engine against a scripted HID channel: reply
//! correlation, the software ID splice, timeout behavior and transport
//! failures.

use std::time::{Duration, Instant};

use hidpp_lite::{
    channel::{ChannelError, HidppChannel},
    nibble::U4,
    protocol::{DIRECT_DEVICE_NUMBER, RequestId},
    software_id::SoftwareIdGenerator,
};

mod common;

use common::MockChannel;

fn channel_of(raw: MockChannel) -> HidppChannel<MockChannel> {
    HidppChannel::of_raw_channel(raw).expect("the mock supports long reports")
}

#[test]
fn a_request_resolves_with_the_correlated_reply() {
    let mut raw = MockChannel::new();
    // A fresh channel splices 0x2 into the first request.
    raw.queue_long(0x01, &[0x00, 0x02, 0x0e, 0x25]);

    let mut chan = channel_of(raw);
    let reply = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[0x18, 0x14])
        .unwrap();

    assert_eq!(&reply.extend_params()[..2], &[0x0e, 0x25]);
}

#[test]
fn requests_go_out_as_padded_long_reports() {
    let mut raw = MockChannel::new();
    raw.queue_long(0x01, &[0x05, 0x12]);

    let mut chan = channel_of(raw);
    chan.request(0x01, RequestId::new(0x05, U4::from_lo(0x1)), &[0xab])
        .unwrap();

    // Header, identifier with the spliced tag, parameters, zero padding.
    let frame = &chan.get_ref().writes[0];
    assert_eq!(frame.len(), 20);
    assert_eq!(&frame[..5], &[0x11, 0x01, 0x05, 0x12, 0xab]);
    assert!(frame[5..].iter().all(|byte| *byte == 0));
}

#[test]
fn foreign_traffic_is_skipped_until_the_echo_arrives() {
    let mut raw = MockChannel::new();
    // Not HID++ at all.
    raw.queue_raw(&[0x42, 0x01, 0x00, 0x02]);
    // Another device on the same channel.
    raw.queue_long(0x03, &[0x00, 0x02, 0xff]);
    // A notification slipping in between.
    raw.queue_long(0x01, &[0x41, 0x04, 0x01]);
    // The actual reply.
    raw.queue_long(0x01, &[0x00, 0x02, 0x0e]);

    let mut chan = channel_of(raw);
    let reply = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap();

    assert_eq!(reply.extend_params()[0], 0x0e);
}

#[test]
fn the_complement_device_number_is_accepted() {
    let mut raw = MockChannel::new();
    raw.queue_long(0xfe, &[0x00, 0x02, 0x0e]);

    let mut chan = channel_of(raw);
    let reply = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap();

    assert_eq!(reply.extend_params()[0], 0x0e);
}

#[test]
fn a_stale_correlation_tag_is_skipped() {
    let mut raw = MockChannel::new();
    // An answer to some earlier request that carried the tag 0xf.
    raw.queue_long(0x01, &[0x00, 0x0f, 0xaa]);
    // The answer to the request under test.
    raw.queue_long(0x01, &[0x00, 0x02, 0xbb]);

    let mut chan = channel_of(raw);
    let reply = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap();

    assert_eq!(reply.extend_params()[0], 0xbb);
}

#[test]
fn correlation_tags_rotate_between_requests() {
    let mut raw = MockChannel::new();
    raw.queue_long(0x01, &[0x00, 0x03, 0x01]);
    raw.queue_long(0x01, &[0x00, 0x04, 0x01]);

    let mut chan = channel_of(raw);
    chan.set_software_ids(SoftwareIdGenerator::starting_at(U4::from_lo(0x3)));

    let id = RequestId::new(0x00, U4::from_lo(0x0));
    chan.request(0x01, id, &[]).unwrap();
    chan.request(0x01, id, &[]).unwrap();

    let tags: Vec<u8> = chan
        .get_ref()
        .writes
        .iter()
        .map(|frame| frame[3] & 0x0f)
        .collect();
    assert_eq!(tags, [0x3, 0x4]);
}

#[test]
fn direct_addressing_skips_the_correlation_tag() {
    let mut raw = MockChannel::new();
    raw.queue_long(DIRECT_DEVICE_NUMBER, &[0x0e, 0x10, 0x01]);

    let mut chan = channel_of(raw);
    let id = RequestId::new(0x0e, U4::from_lo(0x1));
    chan.request(DIRECT_DEVICE_NUMBER, id, &[]).unwrap();

    // The identifier went out untouched, low nibble still zero.
    let frame = &chan.get_ref().writes[0];
    assert_eq!(&frame[2..4], &[0x0e, 0x10]);

    // And the generator did not advance: the next spliced tag is still the
    // first one.
    chan.get_mut().queue_long(0x01, &[0x00, 0x02]);
    chan.request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap();

    let frame = &chan.get_ref().writes[1];
    assert_eq!(frame[3] & 0x0f, 0x2);
}

#[test]
fn notification_identifiers_are_passed_through() {
    let mut raw = MockChannel::new();
    raw.queue_long(0x01, &[0x81, 0x0f, 0x01]);

    let mut chan = channel_of(raw);
    chan.request(0x01, RequestId::from_raw(0x810f), &[]).unwrap();

    let frame = &chan.get_ref().writes[0];
    assert_eq!(&frame[2..4], &[0x81, 0x0f]);
}

#[test]
fn requests_time_out_when_nothing_correlates() {
    let budget = Duration::from_millis(300);

    let mut chan = channel_of(MockChannel::new());
    chan.set_request_timeout(budget);

    let started = Instant::now();
    let err = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap_err();

    assert!(matches!(err, ChannelError::Timeout { .. }));
    assert!(started.elapsed() >= budget);
}

#[test]
fn junk_traffic_does_not_shorten_the_budget() {
    let budget = Duration::from_millis(300);

    let mut raw = MockChannel::new();
    for _ in 0..16 {
        raw.queue_raw(&[0x42, 0x00, 0x00, 0x00]);
    }

    let mut chan = channel_of(raw);
    chan.set_request_timeout(budget);

    // The junk arrives instantly. The request must still wait out the whole
    // budget before giving up.
    let started = Instant::now();
    let err = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap_err();

    assert!(matches!(err, ChannelError::Timeout { .. }));
    assert!(started.elapsed() >= budget);
}

#[test]
fn an_oversized_budget_still_resolves_replies() {
    let mut raw = MockChannel::new();
    raw.queue_long(0x01, &[0x00, 0x02, 0x0e]);

    let mut chan = channel_of(raw);
    chan.set_request_timeout(Duration::MAX);

    let reply = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap();

    assert_eq!(reply.extend_params()[0], 0x0e);
}

#[test]
fn send_and_forget_writes_one_frame_and_never_reads() {
    let started = Instant::now();

    let mut chan = channel_of(MockChannel::new());
    chan.send_and_forget(0x01, RequestId::new(0x0e, U4::from_lo(0x1)), &[0x02])
        .unwrap();

    // One frame, spliced like any other request, and no blocking read.
    let frame = &chan.get_ref().writes[0];
    assert_eq!(chan.get_ref().writes.len(), 1);
    assert_eq!(&frame[..5], &[0x11, 0x01, 0x0e, 0x12, 0x02]);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[test]
fn partial_writes_are_rejected() {
    let mut raw = MockChannel::new();
    raw.truncate_writes_to = Some(10);

    let mut chan = channel_of(raw);
    let err = chan
        .send_and_forget(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap_err();

    assert!(matches!(
        err,
        ChannelError::PartialWrite {
            written: 10,
            expected: 20,
        }
    ));
}

#[test]
fn oversized_parameters_are_rejected_before_writing() {
    let mut chan = channel_of(MockChannel::new());
    let err = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[0u8; 17])
        .unwrap_err();

    assert!(matches!(err, ChannelError::Encode(_)));
    assert!(chan.get_ref().writes.is_empty());
}

#[test]
fn transport_errors_propagate() {
    let mut raw = MockChannel::new();
    raw.fail_reads_with = Some("yanked");

    let mut chan = channel_of(raw);
    let err = chan
        .request(0x01, RequestId::new(0x00, U4::from_lo(0x0)), &[])
        .unwrap_err();

    assert!(matches!(err, ChannelError::Implementation(_)));
}

#[test]
fn channels_refuse_transports_without_long_reports() {
    let mut raw = MockChannel::new();
    raw.long_support = Some(false);

    assert!(matches!(
        HidppChannel::of_raw_channel(raw),
        Err(ChannelError::HidppNotSupported)
    ));
}
