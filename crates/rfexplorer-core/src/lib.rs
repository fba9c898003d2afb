//! rfexplorer-core: Core traits, types, and error definitions for rfexplorer.
//!
//! This crate defines the device-agnostic pieces shared by every other crate
//! in the workspace. Front ends (terminal renderers, recorders) depend on
//! these types without pulling in the serial stack or the protocol engine.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`Configuration`] -- the analyzer's active frequency window
//! - [`SweepFrame`] -- one decoded spectrum measurement
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use transport::Transport;
pub use types::{Configuration, SweepFrame, khz_to_mhz, mhz_to_khz};
