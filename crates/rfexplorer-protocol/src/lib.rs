//! RF Explorer sweep-stream protocol engine.
//!
//! This crate turns the analyzer's raw serial byte stream into decoded
//! spectrum sweeps. It provides:
//!
//! - **Byte buffer** ([`buffer`]) -- bounded store of unconsumed input.
//! - **Frame scanner** ([`scanner`]) -- locates sweep and configuration
//!   frames, with latest-only and exhaustive extraction policies.
//! - **Sweep decoder** ([`sweep`]) -- raw bytes to dBm.
//! - **Configuration tracker** ([`tracker`]) -- the active frequency axis.
//! - **Command builders** ([`commands`]) -- configuration query and
//!   frequency-set commands.
//! - **Model definitions** ([`models`]) -- the 2.4G and 6G modules.
//! - **History and peak hold** ([`history`]).
//! - **Session** ([`session`]) -- the state machine tying it together over
//!   a [`Transport`](rfexplorer_core::Transport).
//! - **SessionBuilder** ([`builder`]) -- fluent construction.
//!
//! # Example
//!
//! ```
//! use rfexplorer_protocol::scanner::{scan, ScanPolicy, ScannedFrame};
//! use rfexplorer_protocol::sweep::decode_sweep;
//!
//! let mut stream = b"$S\x03".to_vec();
//! stream.extend([120, 90, 121]);
//!
//! let result = scan(&stream, 3, ScanPolicy::Exhaustive);
//! if let ScannedFrame::Sweep(payload) = result.frames[0] {
//!     assert_eq!(decode_sweep(payload), vec![-60.0, -45.0, -60.5]);
//! }
//! assert_eq!(result.consumed, stream.len());
//! ```

pub mod buffer;
pub mod builder;
pub mod commands;
pub mod history;
pub mod models;
pub mod scanner;
pub mod session;
pub mod sweep;
pub mod tracker;

pub use builder::SessionBuilder;
pub use history::{PeakHold, SweepHistory};
pub use models::DeviceModel;
pub use scanner::ScanPolicy;
pub use session::{DeviceInfo, Session, SessionState};
pub use tracker::ConfigSource;
