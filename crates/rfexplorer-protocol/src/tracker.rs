//! Tracks the frequency axis the analyzer is currently sweeping.
//!
//! The axis starts at the model default, follows every configuration line
//! the device reports, and can be set optimistically when the host requests
//! a new span (the device confirms later with its own line). Every change is
//! reported to the caller so dependent state (history, peak hold) can be
//! reset only when the axis really moved.

use rfexplorer_core::{Configuration, khz_to_mhz, mhz_to_khz};

/// Where the current configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Model default; the device has not reported anything yet.
    Default,
    /// Parsed from a configuration line sent by the device.
    Device,
    /// Set by the host when requesting a new span, not yet confirmed.
    Requested,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => f.write_str("default"),
            ConfigSource::Device => f.write_str("device"),
            ConfigSource::Requested => f.write_str("requested"),
        }
    }
}

/// Holds the active [`Configuration`] and its provenance.
#[derive(Debug, Clone)]
pub struct ConfigTracker {
    current: Configuration,
    default: Configuration,
    source: ConfigSource,
}

impl ConfigTracker {
    /// Start tracking from the given default.
    pub fn new(default: Configuration) -> Self {
        ConfigTracker {
            current: default.clone(),
            default,
            source: ConfigSource::Default,
        }
    }

    /// The configuration in effect.
    pub fn current(&self) -> &Configuration {
        &self.current
    }

    /// Where [`current`](Self::current) came from.
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Adopt a span reported by the device. Returns `true` if the frequency
    /// axis changed.
    pub fn apply_parsed(&mut self, start_khz: u32, end_khz: u32) -> bool {
        let next = Configuration::from_khz(start_khz, end_khz, self.current.point_count);
        self.replace(next, ConfigSource::Device)
    }

    /// Adopt a span the host has just requested. Returns `true` if the
    /// frequency axis changed.
    ///
    /// The span is rounded to whole kHz, the resolution the device echoes
    /// back, so that its confirmation compares equal.
    pub fn apply_requested(&mut self, start_mhz: f64, end_mhz: f64) -> bool {
        let next = Configuration::new(
            khz_to_mhz(mhz_to_khz(start_mhz)),
            khz_to_mhz(mhz_to_khz(end_mhz)),
            self.current.point_count,
        );
        self.replace(next, ConfigSource::Requested)
    }

    /// Return to the model default. Returns `true` if the axis changed.
    pub fn reset_to_default(&mut self) -> bool {
        let default = self.default.clone();
        self.replace(default, ConfigSource::Default)
    }

    fn replace(&mut self, next: Configuration, source: ConfigSource) -> bool {
        self.source = source;
        if next == self.current {
            return false;
        }
        tracing::debug!(
            start_mhz = next.start_mhz,
            end_mhz = next.end_mhz,
            %source,
            "frequency axis changed"
        );
        self.current = next;
        true
    }
}
