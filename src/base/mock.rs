//! Scripted stream standing in for a serial port in tests.

use crate::checksum::Crc16;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

#[derive(Debug, Default)]
struct State {
    written: Vec<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
    inbound: VecDeque<u8>,
    write_limit: Option<usize>,
    read_error: Option<io::ErrorKind>,
    flush_error: Option<io::ErrorKind>,
    dropped: bool,
}

/// A stream that records every write and answers each one with the next queued
/// reply. Clones share state, so a test keeps one handle while the link owns another.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockStream {
    state: Rc<RefCell<State>>,
    owner: bool,
}

impl MockStream {
    pub(crate) fn new() -> MockStream {
        MockStream::default()
    }

    /// A boxed handle for the link under test. Dropping it marks the port closed.
    pub(crate) fn boxed(&self) -> Box<MockStream> {
        Box::new(MockStream {
            state: Rc::clone(&self.state),
            owner: true,
        })
    }

    /// Queues raw bytes sent back after the next write.
    pub(crate) fn push_raw_reply(&self, bytes: &[u8]) {
        self.state.borrow_mut().replies.push_back(bytes.to_vec());
    }

    /// Queues a well-formed frame sent back after the next write.
    pub(crate) fn push_reply(&self, address: u8, function: u8, payload: &[u8]) {
        self.push_raw_reply(&frame(address, function, payload));
    }

    /// Queues silence as the answer to the next write.
    pub(crate) fn push_silence(&self) {
        self.push_raw_reply(&[]);
    }

    /// Makes every write accept at most `limit` bytes.
    pub(crate) fn limit_writes(&self, limit: usize) {
        self.state.borrow_mut().write_limit = Some(limit);
    }

    /// Makes every read fail with `kind`.
    pub(crate) fn fail_reads(&self, kind: io::ErrorKind) {
        self.state.borrow_mut().read_error = Some(kind);
    }

    /// Makes every flush fail with `kind`.
    pub(crate) fn fail_flush(&self, kind: io::ErrorKind) {
        self.state.borrow_mut().flush_error = Some(kind);
    }

    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.state.borrow().written.clone()
    }

    pub(crate) fn write_count(&self) -> usize {
        self.state.borrow().written.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.borrow().dropped
    }
}

/// Wraps `payload` into a complete RTU frame.
pub(crate) fn frame(address: u8, function: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![address, function];
    bytes.extend_from_slice(payload);
    let (lo, hi) = Crc16::compute(&bytes);
    bytes.push(lo);
    bytes.push(hi);
    bytes
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        if let Some(kind) = state.read_error {
            return Err(io::Error::new(kind, "scripted read failure"));
        }
        let n = buf.len().min(state.inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = state.inbound.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        let n = state.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        state.written.push(buf[..n].to_vec());
        if let Some(reply) = state.replies.pop_front() {
            state.inbound.extend(reply);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.state.borrow().flush_error {
            Some(kind) => Err(io::Error::new(kind, "scripted flush failure")),
            None => Ok(()),
        }
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        if self.owner {
            self.state.borrow_mut().dropped = true;
        }
    }
}
