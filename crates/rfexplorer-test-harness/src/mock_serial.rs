//! Mock transport for deterministic testing of the session controller.
//!
//! [`MockTransport`] plays back scripted inbound chunks, one chunk per
//! `receive()` call, and records everything sent. Request/response pairs
//! can be pre-loaded with [`expect`](MockTransport::expect): when the
//! matching bytes are sent, the response is queued as the next inbound
//! chunk.
//!
//! The mock is a cheap handle over shared state, so a test can keep a clone
//! after handing the transport to a session and feed more bytes between
//! polls.
//!
//! # Example
//!
//! ```
//! use rfexplorer_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! mock.expect(b"#\x04C0\r\n", b"#C2-F:2400000,2500000,-010,-120\r\n");
//! mock.queue_inbound(b"$S\x70");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rfexplorer_core::error::{Error, Result};
use rfexplorer_core::transport::Transport;

/// A pre-loaded request/response pair.
#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    response: Vec<u8>,
}

#[derive(Debug)]
struct MockState {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Chunks handed out by successive `receive()` calls.
    inbound: VecDeque<Vec<u8>>,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
    clear_count: usize,
    receive_count: usize,
}

/// A scripted [`Transport`] for testing without hardware.
///
/// Sends are accepted and logged. If expectations are pending, the next one
/// must match exactly or `send()` fails with [`Error::Protocol`]. With no
/// pending expectations any send is accepted, mirroring the analyzer which
/// never acknowledges commands.
///
/// `receive()` returns the next queued chunk (split across calls if the
/// caller's buffer is smaller) or [`Error::Timeout`] when nothing is queued.
/// `clear_buffers()` is counted but does not drop queued chunks: they model
/// bytes that arrive after the clear.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                inbound: VecDeque::new(),
                connected: true,
                sent_log: Vec::new(),
                clear_count: 0,
                receive_count: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an expected request/response pair.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.lock().expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Queue a chunk to be returned by a future `receive()` call.
    ///
    /// Empty chunks are ignored.
    pub fn queue_inbound(&self, chunk: &[u8]) {
        if !chunk.is_empty() {
            self.lock().inbound.push_back(chunk.to_vec());
        }
    }

    /// Make the next `receive()` return `Ok(0)`, as a hung-up tty does.
    pub fn queue_eof(&self) {
        self.lock().inbound.push_back(Vec::new());
    }

    /// Queue several chunks, one per future `receive()` call.
    pub fn queue_chunks<I, C>(&self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        for chunk in chunks {
            self.queue_inbound(chunk.as_ref());
        }
    }

    /// All data sent through this transport, one entry per `send()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.lock().sent_log.clone()
    }

    /// Number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.lock().expectations.len()
    }

    /// Number of inbound chunks not yet delivered.
    pub fn pending_inbound(&self) -> usize {
        self.lock().inbound.len()
    }

    /// How many times `clear_buffers()` has been called.
    pub fn clear_count(&self) -> usize {
        self.lock().clear_count
    }

    /// How many times `receive()` has been called.
    pub fn receive_count(&self) -> usize {
        self.lock().receive_count
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent calls return [`Error::NotConnected`],
    /// which is how tests simulate an unplugged analyzer.
    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        state.sent_log.push(data.to_vec());

        if let Some(expectation) = state.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Protocol(format!(
                    "unexpected send data: expected {:02X?}, got {:02X?}",
                    expectation.request, data
                )));
            }
            if !expectation.response.is_empty() {
                state.inbound.push_back(expectation.response);
            }
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.receive_count += 1;

        let Some(mut chunk) = state.inbound.pop_front() else {
            return Err(Error::Timeout);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            state.inbound.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    async fn clear_buffers(&mut self) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.clear_count += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.connected = false;
        state.inbound.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }
}
