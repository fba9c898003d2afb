//! Transport implementations for rfexplorer.
//!
//! RF Explorer modules enumerate as USB virtual COM ports (CP210x bridge),
//! so the only concrete transport is [`SerialTransport`].
//!
//! # Example
//!
//! ```no_run
//! use rfexplorer_transport::SerialTransport;
//! use rfexplorer_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> rfexplorer_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 500_000).await?;
//!
//! // Ask the analyzer for its current configuration.
//! transport.send(b"#\x04C0\r\n").await?;
//!
//! let mut buf = [0u8; 512];
//! let n = transport.receive(&mut buf, Duration::from_millis(500)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{SerialConfig, SerialTransport};
