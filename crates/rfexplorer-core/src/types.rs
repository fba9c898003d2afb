//! Core types for rfexplorer.
//!
//! [`Configuration`] describes the frequency axis the analyzer is sweeping,
//! and [`SweepFrame`] is one decoded measurement across that axis. Both are
//! plain values: the protocol engine produces them, renderers and recorders
//! consume them.

use chrono::{DateTime, Utc};

/// Convert a frequency in kilohertz (the unit used on the wire) to megahertz.
pub fn khz_to_mhz(khz: u32) -> f64 {
    f64::from(khz) / 1000.0
}

/// Convert a frequency in megahertz to whole kilohertz, rounding to nearest.
///
/// Negative inputs saturate to zero.
pub fn mhz_to_khz(mhz: f64) -> u32 {
    (mhz * 1000.0).round() as u32
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The analyzer's active frequency window.
///
/// Bins are spaced so that bin `0` sits at [`start_mhz`](Self::start_mhz) and
/// the last bin sits exactly at [`end_mhz`](Self::end_mhz), i.e.
/// `step = (end - start) / (point_count - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Start of the sweep in MHz.
    pub start_mhz: f64,
    /// End of the sweep in MHz.
    pub end_mhz: f64,
    /// Number of power readings per sweep (fixed per device model).
    pub point_count: usize,
}

impl Configuration {
    /// Create a configuration from a span in MHz.
    pub fn new(start_mhz: f64, end_mhz: f64, point_count: usize) -> Self {
        Configuration {
            start_mhz,
            end_mhz,
            point_count,
        }
    }

    /// Create a configuration from a span in kHz, as reported by the device.
    pub fn from_khz(start_khz: u32, end_khz: u32, point_count: usize) -> Self {
        Self::new(khz_to_mhz(start_khz), khz_to_mhz(end_khz), point_count)
    }

    /// Width of the sweep in MHz.
    pub fn span_mhz(&self) -> f64 {
        self.end_mhz - self.start_mhz
    }

    /// Distance between adjacent bins in MHz.
    ///
    /// Zero when the sweep has fewer than two points.
    pub fn step_mhz(&self) -> f64 {
        if self.point_count < 2 {
            return 0.0;
        }
        self.span_mhz() / (self.point_count - 1) as f64
    }

    /// Centre frequency of bin `index` in MHz.
    pub fn frequency_at(&self, index: usize) -> f64 {
        self.start_mhz + index as f64 * self.step_mhz()
    }

    /// Frequencies of every bin, in order.
    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.point_count).map(|i| self.frequency_at(i)).collect()
    }

    /// Start frequency in whole kHz.
    pub fn start_khz(&self) -> u32 {
        mhz_to_khz(self.start_mhz)
    }

    /// End frequency in whole kHz.
    pub fn end_khz(&self) -> u32 {
        mhz_to_khz(self.end_mhz)
    }
}

// ---------------------------------------------------------------------------
// SweepFrame
// ---------------------------------------------------------------------------

/// One decoded spectrum measurement.
///
/// Statistics are computed once at construction; the frame is immutable
/// afterwards. When several bins share the maximum level the lowest index
/// is reported as the peak.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepFrame {
    readings: Vec<f32>,
    peak_dbm: f32,
    peak_index: usize,
    peak_freq_mhz: f64,
    avg_dbm: f32,
    min_dbm: f32,
    timestamp: DateTime<Utc>,
}

impl SweepFrame {
    /// Build a frame from power readings in dBm.
    ///
    /// `config` supplies the frequency axis used to place the peak. An empty
    /// reading set yields a peak of negative infinity at index 0.
    pub fn new(readings: Vec<f32>, config: &Configuration, timestamp: DateTime<Utc>) -> Self {
        let mut peak_index = 0;
        let mut peak_dbm = f32::NEG_INFINITY;
        let mut min_dbm = f32::INFINITY;
        let mut sum = 0.0f64;

        for (i, &dbm) in readings.iter().enumerate() {
            if dbm > peak_dbm {
                peak_dbm = dbm;
                peak_index = i;
            }
            min_dbm = min_dbm.min(dbm);
            sum += f64::from(dbm);
        }

        let avg_dbm = if readings.is_empty() {
            f32::NEG_INFINITY
        } else {
            (sum / readings.len() as f64) as f32
        };

        SweepFrame {
            peak_freq_mhz: config.frequency_at(peak_index),
            readings,
            peak_dbm,
            peak_index,
            avg_dbm,
            min_dbm,
            timestamp,
        }
    }

    /// Power readings in dBm, one per bin.
    pub fn readings(&self) -> &[f32] {
        &self.readings
    }

    /// Highest reading in dBm.
    pub fn peak_dbm(&self) -> f32 {
        self.peak_dbm
    }

    /// Bin index of the highest reading.
    pub fn peak_index(&self) -> usize {
        self.peak_index
    }

    /// Frequency of the highest reading in MHz, on the axis active when the
    /// frame was decoded.
    pub fn peak_freq_mhz(&self) -> f64 {
        self.peak_freq_mhz
    }

    /// Arithmetic mean of the readings in dBm.
    pub fn avg_dbm(&self) -> f32 {
        self.avg_dbm
    }

    /// Lowest reading in dBm (the sweep's noise floor).
    pub fn min_dbm(&self) -> f32 {
        self.min_dbm
    }

    /// When the frame was decoded.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
