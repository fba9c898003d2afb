//! SessionBuilder -- fluent builder for constructing [`Session`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial parameters, handshake timing, the scan policy and buffer limits
//! before the transport is opened.
//!
//! # Example
//!
//! ```no_run
//! use rfexplorer_protocol::SessionBuilder;
//! use rfexplorer_protocol::models::rf_explorer_6g;
//! use std::time::Duration;
//!
//! # async fn example() -> rfexplorer_core::Result<()> {
//! let mut session = SessionBuilder::new(rf_explorer_6g())
//!     .serial_port("/dev/ttyUSB0")
//!     .frequency_range(5500.0, 5700.0)
//!     .poll_timeout(Duration::from_millis(2))
//!     .build()
//!     .await?;
//! session.initialize().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use rfexplorer_core::error::{Error, Result};
use rfexplorer_core::transport::Transport;

use crate::models::DeviceModel;
use crate::scanner::ScanPolicy;
use crate::session::{Session, SessionOptions};

/// Fluent builder for [`Session`].
///
/// Every setting has a default, so the simplest usage is:
///
/// ```ignore
/// let session = SessionBuilder::new(rf_explorer_24g())
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct SessionBuilder {
    model: DeviceModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    options: SessionOptions,
}

impl SessionBuilder {
    /// Create a new builder for the given analyzer model.
    pub fn new(model: DeviceModel) -> Self {
        SessionBuilder {
            model,
            serial_port: None,
            baud_rate: None,
            options: SessionOptions::default(),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the model's default baud rate (500000).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Delay between clearing the port and talking to the device
    /// (default: 300ms).
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.options.settle_delay = delay;
        self
    }

    /// How long to listen for the identity banner and configuration report
    /// during initialization (default: 500ms).
    pub fn init_window(mut self, window: Duration) -> Self {
        self.options.init_window = window;
        self
    }

    /// Upper bound on bytes read during initialization (default: 2000).
    pub fn init_max_bytes(mut self, bytes: usize) -> Self {
        self.options.init_max_bytes = bytes;
        self
    }

    /// Send the configuration query during initialization (default: true).
    pub fn query_config(mut self, enabled: bool) -> Self {
        self.options.query_config = enabled;
        self
    }

    /// Sweep span (MHz) to apply once the device is up. Without this the
    /// device keeps whatever span it reports.
    pub fn frequency_range(mut self, start_mhz: f64, end_mhz: f64) -> Self {
        self.options.requested_span = Some((start_mhz, end_mhz));
        self
    }

    /// How sweeps are extracted from the stream (default: exhaustive).
    pub fn scan_policy(mut self, policy: ScanPolicy) -> Self {
        self.options.policy = policy;
        self
    }

    /// Input buffer cap and the number of bytes kept when it is exceeded
    /// (default: 8000 / 4000).
    pub fn buffer_limits(mut self, max_len: usize, retain_len: usize) -> Self {
        self.options.max_buffer = max_len;
        self.options.retain_buffer = retain_len;
        self
    }

    /// Number of recent sweeps kept for the waterfall (default: 50).
    pub fn history_depth(mut self, depth: usize) -> Self {
        self.options.history_depth = depth;
        self
    }

    /// Longest a single [`poll()`](Session::poll) waits for bytes
    /// (default: 1ms).
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.options.poll_timeout = timeout;
        self
    }

    /// Build a [`Session`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `rfexplorer-test-harness`) and for callers that manage the transport
    /// themselves. The session starts `Disconnected`; call
    /// [`initialize()`](Session::initialize) next.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<Session> {
        let frame_len = crate::scanner::sweep_frame_len(self.model.sweep_points);
        if self.options.retain_buffer > self.options.max_buffer {
            return Err(Error::InvalidParameter(format!(
                "buffer retain length {} exceeds cap {}",
                self.options.retain_buffer, self.options.max_buffer
            )));
        }
        if self.options.retain_buffer < frame_len {
            return Err(Error::InvalidParameter(format!(
                "buffer retain length {} cannot hold a {frame_len}-byte sweep",
                self.options.retain_buffer
            )));
        }
        if self.options.init_max_bytes == 0 {
            return Err(Error::InvalidParameter(
                "init_max_bytes must be non-zero".into(),
            ));
        }
        if let Some((start_mhz, end_mhz)) = self.options.requested_span {
            self.model.validate_span(start_mhz, end_mhz)?;
        }

        Ok(Session::new(transport, self.model, self.options))
    }

    /// Build a [`Session`] on a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    /// The baud rate defaults to the model's default if not overridden.
    pub async fn build(self) -> Result<Session> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let baud = self.baud_rate.unwrap_or(self.model.default_baud_rate);

        let transport = rfexplorer_transport::SerialTransport::open(port, baud).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{rf_explorer_24g, rf_explorer_6g};
    use crate::session::SessionState;
    use rfexplorer_test_harness::MockTransport;

    #[tokio::test]
    async fn builder_defaults() {
        let session = SessionBuilder::new(rf_explorer_24g())
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.model().name, "RF Explorer 2.4G");
        assert_eq!(session.configuration().start_mhz, 2400.0);
        assert_eq!(session.scan_policy(), ScanPolicy::Exhaustive);
        assert_eq!(session.history().depth(), 50);
    }

    #[tokio::test]
    async fn builder_custom_settings() {
        let session = SessionBuilder::new(rf_explorer_6g())
            .scan_policy(ScanPolicy::LatestOnly)
            .history_depth(10)
            .buffer_limits(2000, 1000)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(session.scan_policy(), ScanPolicy::LatestOnly);
        assert_eq!(session.history().depth(), 10);
    }

    #[tokio::test]
    async fn builder_rejects_inverted_buffer_limits() {
        let result = SessionBuilder::new(rf_explorer_6g())
            .buffer_limits(1000, 2000)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_rejects_retain_smaller_than_frame() {
        let result = SessionBuilder::new(rf_explorer_6g())
            .buffer_limits(1000, 100)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn builder_rejects_out_of_range_span() {
        let result = SessionBuilder::new(rf_explorer_24g())
            .frequency_range(5500.0, 5700.0)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn build_requires_serial_port() {
        let result = SessionBuilder::new(rf_explorer_24g()).build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
