//! Session controller: device bring-up and the streaming read loop.
//!
//! A [`Session`] owns the transport and every piece of per-device state
//! (byte buffer, frequency axis, history, peak hold). It is driven entirely
//! by its caller: [`initialize()`](Session::initialize) performs the
//! handshake, then [`poll()`](Session::poll) is called periodically and
//! returns whatever sweeps completed since the last call.
//!
//! ```text
//! Disconnected -> Initializing -> Configuring -> Streaming
//!                                      ^             |
//!                                      +-------------+  set_frequency_range()
//! ```
//!
//! Any transport fault drops the session back to `Disconnected`. There is
//! no automatic reconnection and gaps in the sweep stream never change the
//! state.

use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use rfexplorer_core::error::{Error, Result};
use rfexplorer_core::transport::Transport;
use rfexplorer_core::types::{Configuration, SweepFrame};

use crate::buffer::{ByteBuffer, DEFAULT_MAX_LEN, DEFAULT_RETAIN_LEN};
use crate::commands::{cmd_query_config, cmd_set_frequency};
use crate::history::{DEFAULT_HISTORY_DEPTH, PeakHold, SweepHistory};
use crate::models::DeviceModel;
use crate::scanner::{self, ScanPolicy, ScannedFrame};
use crate::sweep::decode_sweep;
use crate::tracker::{ConfigSource, ConfigTracker};

/// Size of a single transport read.
const READ_CHUNK: usize = 4096;

/// Pause between empty reads while collecting the handshake response.
const INIT_IDLE_PAUSE: Duration = Duration::from_millis(5);

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No usable transport; call [`Session::initialize`].
    Disconnected,
    /// Waiting for the identity banner and configuration report.
    Initializing,
    /// Applying a frequency span.
    Configuring,
    /// Decoding sweeps on every poll.
    Streaming,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Initializing => "initializing",
            SessionState::Configuring => "configuring",
            SessionState::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

/// Tunables collected by [`SessionBuilder`](crate::SessionBuilder).
#[derive(Debug, Clone)]
pub(crate) struct SessionOptions {
    pub(crate) settle_delay: Duration,
    pub(crate) init_window: Duration,
    pub(crate) init_max_bytes: usize,
    pub(crate) query_config: bool,
    pub(crate) requested_span: Option<(f64, f64)>,
    pub(crate) policy: ScanPolicy,
    pub(crate) max_buffer: usize,
    pub(crate) retain_buffer: usize,
    pub(crate) history_depth: usize,
    pub(crate) poll_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            settle_delay: Duration::from_millis(300),
            init_window: Duration::from_millis(500),
            init_max_bytes: 2000,
            query_config: true,
            requested_span: None,
            policy: ScanPolicy::default(),
            max_buffer: DEFAULT_MAX_LEN,
            retain_buffer: DEFAULT_RETAIN_LEN,
            history_depth: DEFAULT_HISTORY_DEPTH,
            poll_timeout: Duration::from_millis(1),
        }
    }
}

/// What was learned about the device during initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Identity banner, if the device sent one inside the window.
    pub identity: Option<String>,
    /// Frequency axis in effect once streaming starts.
    pub configuration: Configuration,
    /// Where that axis came from.
    pub source: ConfigSource,
}

/// A stateful connection to one analyzer.
pub struct Session {
    transport: Box<dyn Transport>,
    model: DeviceModel,
    options: SessionOptions,
    state: SessionState,
    buffer: ByteBuffer,
    tracker: ConfigTracker,
    history: SweepHistory,
    peak_hold: PeakHold,
    identity: Option<String>,
    receiving: bool,
    sweeps_decoded: u64,
    read_buf: Vec<u8>,
}

impl Session {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        model: DeviceModel,
        options: SessionOptions,
    ) -> Self {
        let default = model.default_configuration();
        Session {
            transport,
            buffer: ByteBuffer::with_capacity(options.max_buffer + READ_CHUNK),
            peak_hold: PeakHold::new(default.point_count),
            tracker: ConfigTracker::new(default),
            history: SweepHistory::new(options.history_depth),
            model,
            options,
            state: SessionState::Disconnected,
            identity: None,
            receiving: false,
            sweeps_decoded: 0,
            read_buf: vec![0u8; READ_CHUNK],
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Bring the device up and start streaming.
    ///
    /// Clears the transport, waits for the device to settle, optionally
    /// queries its configuration, and listens for a bounded window for the
    /// identity banner and a configuration report. A silent device is not
    /// an error: the model default span is used. If a span was requested
    /// on the builder it is applied afterwards.
    ///
    /// May be called again to re-synchronize; all stream state is reset.
    pub async fn initialize(&mut self) -> Result<DeviceInfo> {
        self.set_state(SessionState::Initializing);
        self.receiving = false;
        self.identity = None;
        self.buffer.clear();
        if self.tracker.reset_to_default() {
            self.reset_stream_state();
        }

        if let Err(e) = self.handshake().await {
            return Err(self.fault(e));
        }

        self.set_state(SessionState::Configuring);
        if let Some((start_mhz, end_mhz)) = self.options.requested_span {
            if let Err(e) = self.configure(start_mhz, end_mhz).await {
                self.set_state(SessionState::Disconnected);
                return Err(e);
            }
        }
        self.start_streaming();

        Ok(DeviceInfo {
            identity: self.identity.clone(),
            configuration: self.tracker.current().clone(),
            source: self.tracker.source(),
        })
    }

    async fn handshake(&mut self) -> Result<()> {
        self.transport.clear_buffers().await?;
        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }

        if self.options.query_config {
            debug!("querying device configuration");
            self.transport.send(&cmd_query_config()).await?;
        }

        let limit = self.options.init_max_bytes;
        let deadline = Instant::now() + self.options.init_window;
        let mut collected: Vec<u8> = Vec::with_capacity(limit);
        let mut config = None;

        while collected.len() < limit {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;
            let want = (limit - collected.len()).min(self.read_buf.len());

            match self.transport.receive(&mut self.read_buf[..want], remaining).await {
                Ok(0) => return Err(Error::ConnectionLost),
                Err(Error::Timeout) => {
                    tokio::time::sleep(INIT_IDLE_PAUSE.min(remaining)).await;
                    continue;
                }
                Ok(n) => {
                    trace!(bytes = n, "handshake read");
                    collected.extend_from_slice(&self.read_buf[..n]);
                }
                Err(e) => return Err(e),
            }

            config = scanner::find_config_frame(&collected);
            if config.is_some() {
                break;
            }
        }

        self.identity = scanner::extract_identity(&collected);
        if let Some(identity) = &self.identity {
            info!(%identity, "device identified");
        }

        match config {
            Some(frame) => {
                self.apply_device_config(frame.start_khz, frame.end_khz);
                let current = self.tracker.current();
                info!(
                    start_mhz = current.start_mhz,
                    end_mhz = current.end_mhz,
                    points = current.point_count,
                    "device configuration received"
                );
            }
            None => {
                let current = self.tracker.current();
                info!(
                    bytes = collected.len(),
                    start_mhz = current.start_mhz,
                    end_mhz = current.end_mhz,
                    "no configuration reported, using model default"
                );
            }
        }
        Ok(())
    }

    /// Validate and send a new span, then adopt it optimistically.
    async fn configure(&mut self, start_mhz: f64, end_mhz: f64) -> Result<()> {
        let (start_khz, end_khz) = self.model.validate_span(start_mhz, end_mhz)?;
        let command = cmd_set_frequency(start_khz, end_khz)?;

        self.set_state(SessionState::Configuring);
        debug!(start_khz, end_khz, "setting frequency span");
        if let Err(e) = self.transport.send(&command).await {
            return Err(self.fault(e));
        }
        self.tracker.apply_requested(start_mhz, end_mhz);
        Ok(())
    }

    fn start_streaming(&mut self) {
        self.buffer.clear();
        self.reset_stream_state();
        self.receiving = false;
        self.set_state(SessionState::Streaming);
    }

    /// Change the sweep span while streaming.
    ///
    /// The span is checked against the model limits before anything is
    /// sent; an invalid request leaves the session untouched. On success
    /// the buffer, history and peak hold are cleared.
    pub async fn set_frequency_range(&mut self, start_mhz: f64, end_mhz: f64) -> Result<()> {
        if self.state != SessionState::Streaming {
            return Err(Error::NotConnected);
        }
        self.configure(start_mhz, end_mhz).await?;
        self.start_streaming();
        Ok(())
    }

    /// Close the transport. Safe to call in any state.
    pub async fn close(&mut self) -> Result<()> {
        debug!(state = %self.state, "closing session");
        self.set_state(SessionState::Disconnected);
        self.receiving = false;
        self.buffer.clear();
        self.transport.close().await
    }

    // -----------------------------------------------------------------
    // Streaming
    // -----------------------------------------------------------------

    /// Read whatever is available and return every sweep that completed.
    ///
    /// Waits at most the poll timeout for bytes and never for a whole
    /// frame, so an empty result is normal. Errors are transport faults
    /// only; they leave the session `Disconnected`.
    pub async fn poll(&mut self) -> Result<Vec<SweepFrame>> {
        if self.state != SessionState::Streaming {
            return Err(Error::NotConnected);
        }

        match self
            .transport
            .receive(&mut self.read_buf, self.options.poll_timeout)
            .await
        {
            Err(Error::Timeout) => {}
            Ok(0) => return Err(self.fault(Error::ConnectionLost)),
            Ok(n) => {
                trace!(bytes = n, "read");
                self.buffer.append(&self.read_buf[..n]);
            }
            Err(e) => return Err(self.fault(e)),
        }

        Ok(self.process_buffer())
    }

    /// Cap the buffer, scan it, and decode everything found.
    fn process_buffer(&mut self) -> Vec<SweepFrame> {
        let dropped = self
            .buffer
            .cap_if_oversized(self.options.max_buffer, self.options.retain_buffer);
        if dropped > 0 {
            debug!(dropped, kept = self.buffer.len(), "input buffer overflow, oldest bytes discarded");
        }

        let mut decoded = Vec::new();
        let scan = scanner::scan(
            self.buffer.as_slice(),
            self.tracker.current().point_count,
            self.options.policy,
        );

        for frame in &scan.frames {
            match frame {
                ScannedFrame::Sweep(payload) => {
                    let sweep = SweepFrame::new(decode_sweep(payload), self.tracker.current(), Utc::now());
                    self.peak_hold.update(sweep.readings());
                    self.history.push(sweep.clone());
                    decoded.push(sweep);
                }
                ScannedFrame::Config(config) => {
                    if self.tracker.apply_parsed(config.start_khz, config.end_khz) {
                        self.history.clear();
                        self.peak_hold.reset();
                    }
                }
            }
        }

        let consumed = scan.consumed;
        self.buffer.trim_from(consumed);

        if !decoded.is_empty() {
            self.sweeps_decoded += decoded.len() as u64;
            if !self.receiving {
                self.receiving = true;
                debug!("receiving sweeps");
            }
        }
        decoded
    }

    fn apply_device_config(&mut self, start_khz: u32, end_khz: u32) {
        if self.tracker.apply_parsed(start_khz, end_khz) {
            self.reset_stream_state();
        }
    }

    fn reset_stream_state(&mut self) {
        self.history.clear();
        self.peak_hold = PeakHold::new(self.tracker.current().point_count);
    }

    /// Record a transport fault: the session is no longer usable.
    fn fault(&mut self, err: Error) -> Error {
        if err.is_transport_fault() {
            warn!(error = %err, state = %self.state, "transport fault, disconnecting");
            self.set_state(SessionState::Disconnected);
            self.receiving = false;
        }
        err
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "session state");
            self.state = next;
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The frequency axis currently applied to decoded sweeps.
    pub fn configuration(&self) -> &Configuration {
        self.tracker.current()
    }

    pub fn config_source(&self) -> ConfigSource {
        self.tracker.source()
    }

    /// Identity banner captured during initialization.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// `true` once a sweep has been decoded since streaming (re)started.
    ///
    /// Purely informational; it never changes the session state.
    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    pub fn peak_hold(&self) -> &PeakHold {
        &self.peak_hold
    }

    /// Clear the peak hold without touching the span or history.
    pub fn reset_peak_hold(&mut self) {
        self.peak_hold.reset();
    }

    pub fn history(&self) -> &SweepHistory {
        &self.history
    }

    pub fn model(&self) -> &DeviceModel {
        &self.model
    }

    /// Bytes waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Total sweeps decoded over the session's lifetime.
    pub fn sweeps_decoded(&self) -> u64 {
        self.sweeps_decoded
    }

    pub fn scan_policy(&self) -> ScanPolicy {
        self.options.policy
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.model.name)
            .field("state", &self.state)
            .field("configuration", self.tracker.current())
            .field("receiving", &self.receiving)
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}
