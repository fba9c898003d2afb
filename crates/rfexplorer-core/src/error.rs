//! Error types for rfexplorer.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Only transport faults and invalid
//! caller input surface here: malformed frames on the wire are skipped by
//! the scanner and never become errors.

/// The error type for all rfexplorer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port could not be opened, configured,
    /// or cleared).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error raised by a transport or test double that saw
    /// traffic it did not expect.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for bytes from the analyzer.
    ///
    /// Inside a streaming session this simply means "nothing available yet"
    /// and is never returned from `poll()`.
    #[error("timeout waiting for data")]
    Timeout,

    /// An invalid parameter was passed (e.g. a frequency span outside the
    /// module's range).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the analyzer has been established, or the session
    /// is not streaming.
    #[error("not connected")]
    NotConnected,

    /// The connection to the analyzer was lost unexpectedly (USB unplugged).
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error means the transport is unusable and the
    /// session must be torn down.
    ///
    /// [`Error::Timeout`] and [`Error::InvalidParameter`] leave the link
    /// intact; everything else is treated as a fault.
    pub fn is_transport_fault(&self) -> bool {
        !matches!(self, Error::Timeout | Error::InvalidParameter(_))
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
