//! rfexplorer-test-harness: Test utilities for rfexplorer.
//!
//! This crate provides [`MockTransport`] for deterministic testing of the
//! session controller without an analyzer attached, and the [`frames`]
//! module for synthesizing the byte stream an analyzer would emit.

pub mod frames;
pub mod mock_serial;

pub use mock_serial::MockTransport;
