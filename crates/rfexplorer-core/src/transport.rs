//! Transport trait for analyzer communication.
//!
//! The [`Transport`] trait abstracts over the physical link to the analyzer.
//! The serial implementation lives in `rfexplorer-transport`; a scripted
//! `MockTransport` in `rfexplorer-test-harness` lets the session controller
//! be tested byte-for-byte without hardware.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to an analyzer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the analyzer, returning once they have been handed
    /// to the underlying port.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the analyzer into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if nothing arrived within the deadline. A zero timeout turns this into
    /// a non-blocking poll.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Discard anything queued in the input and output buffers.
    ///
    /// Transports without OS-level queues may keep the default no-op.
    async fn clear_buffers(&mut self) -> Result<()> {
        Ok(())
    }

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
