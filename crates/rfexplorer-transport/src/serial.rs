//! Serial port transport for the analyzer.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait over a USB virtual COM port. The RF Explorer firmware
//! talks 8N1 without flow control; only the baud rate is user-selectable
//! (500000 on current firmware, 2400 on very old units).

use async_trait::async_trait;
use rfexplorer_core::error::{Error, Result};
use rfexplorer_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};

/// Default baud rate of current RF Explorer firmware.
pub const DEFAULT_BAUD_RATE: u32 = 500_000;

/// Serial port configuration.
///
/// Framing is fixed at 8 data bits, no parity, one stop bit, no flow control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate (500000 or 2400 for RF Explorer).
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Serial port transport for analyzer communication.
pub struct SerialTransport {
    port: Option<SerialStream>,
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate with 8N1 framing.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g. "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Baud rate (500000 for current firmware)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with_config(port, SerialConfig { baud_rate }).await
    }

    /// Open a serial port with an explicit configuration.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(port = %port, baud_rate = config.baud_rate, "Opening serial port");

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "cannot open analyzer port");
                Error::Transport(format!("cannot open {port}: {e}"))
            })?;

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
        })
    }

    /// Path the port was opened with.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Map an I/O error to the transport taxonomy: a vanished device is
/// [`Error::ConnectionLost`], anything else stays an I/O error.
fn classify_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::UnexpectedEof => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

/// A zero-length read into a non-empty buffer is EOF: the tty hung up.
fn classify_read(n: usize, requested: usize) -> Result<usize> {
    if n == 0 && requested > 0 {
        tracing::warn!("analyzer port hung up (0 bytes read)");
        return Err(Error::ConnectionLost);
    }
    Ok(n)
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(port = %self.port_name, bytes = data.len(), data = ?data, "Sending data");

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            classify_io_error(e)
        })?;
        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            classify_io_error(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                let n = classify_read(n, buf.len())?;
                tracing::trace!(port = %self.port_name, bytes = n, "Received data");
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(classify_io_error(e))
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn clear_buffers(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.clear(ClearBuffer::All).map_err(|e| {
            tracing::warn!(port = %self.port_name, error = %e, "Failed to clear serial buffers");
            Error::Transport(format!("Failed to clear buffers on {}: {}", self.port_name, e))
        })
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "flush before close failed, closing anyway"
                );
            }
            tracing::info!(port = %self.port_name, "analyzer port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "analyzer port dropped while open");
        }
    }
}
