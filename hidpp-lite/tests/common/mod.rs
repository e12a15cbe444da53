//! Shared test plumbing: a scripted in-memory HID channel.

#![allow(dead_code)]

use std::{collections::VecDeque, fmt, thread, time::Duration};

use hidpp_lite::{channel::RawHidChannel, report::LONG_REPORT_LENGTH};

/// The error type of [`MockChannel`].
#[derive(Debug)]
pub struct MockError(pub &'static str);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

/// A raw channel that replays scripted reports and records everything written
/// to it.
///
/// Reads pop scripted reports immediately. Once the script runs dry, reads
/// block for their full timeout and report nothing, like a quiet device
/// would.
pub struct MockChannel {
    /// Reports handed out by successive reads, oldest first.
    pub reads: VecDeque<Vec<u8>>,

    /// Frames recorded from writes, oldest first.
    pub writes: Vec<Vec<u8>>,

    /// The value reported by the long-report support shortcut.
    pub long_support: Option<bool>,

    /// When set, writes are only accepted up to this many bytes.
    pub truncate_writes_to: Option<usize>,

    /// When set, every read fails with this message.
    pub fail_reads_with: Option<&'static str>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            reads: VecDeque::new(),
            writes: Vec::new(),
            long_support: Some(true),
            truncate_writes_to: None,
            fail_reads_with: None,
        }
    }

    /// Scripts a long HID++ report from the given device carrying `payload`,
    /// zero-padded to the full report length.
    pub fn queue_long(&mut self, device_number: u8, payload: &[u8]) {
        let mut data = vec![0x11, device_number];
        data.extend_from_slice(payload);
        data.resize(LONG_REPORT_LENGTH, 0);

        self.reads.push_back(data);
    }

    /// Scripts raw bytes verbatim.
    pub fn queue_raw(&mut self, data: &[u8]) {
        self.reads.push_back(data.to_vec());
    }
}

impl RawHidChannel for MockChannel {
    type Error = MockError;

    fn write_report(&mut self, src: &[u8]) -> Result<usize, Self::Error> {
        self.writes.push(src.to_vec());

        Ok(self
            .truncate_writes_to
            .map_or(src.len(), |cap| cap.min(src.len())))
    }

    fn read_report(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<usize>, Self::Error> {
        if let Some(message) = self.fail_reads_with {
            return Err(MockError(message));
        }

        match self.reads.pop_front() {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);

                Ok(Some(len))
            },
            None => {
                thread::sleep(timeout);

                Ok(None)
            },
        }
    }

    fn supports_long_hidpp(&self) -> Option<bool> {
        self.long_support
    }

    fn get_report_descriptor(&self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Err(MockError("no report descriptor scripted"))
    }
}
