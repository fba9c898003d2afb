//! RF Explorer model definitions.
//!
//! Each supported analyzer module is described by a [`DeviceModel`] that
//! captures its sweep size, tunable range, and the span it comes up on.
//! The session uses these to pick the default configuration and to validate
//! frequency requests before anything is sent to the device.
//!
//! | Model              | ID    | Points | Range (MHz)  | Default (MHz) |
//! |--------------------|-------|--------|--------------|---------------|
//! | RF Explorer 2.4G   | `24g` | 112    | 2350 - 2550  | 2400 - 2500   |
//! | RF Explorer 6G     | `6g`  | 112    | 4850 - 6100  | 5100 - 5900   |

use rfexplorer_core::{Configuration, Error, Result, khz_to_mhz, mhz_to_khz};

/// Sweep points per frame for every supported module.
pub const DEFAULT_SWEEP_POINTS: usize = 112;

/// Serial baud rate the modules ship with.
pub const DEFAULT_BAUD_RATE: u32 = 500_000;

/// Static model definition for an RF Explorer module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceModel {
    /// Human-readable name (e.g. "RF Explorer 6G").
    pub name: &'static str,
    /// Short identifier used on the command line.
    pub model_id: &'static str,
    /// Power readings per sweep frame.
    pub sweep_points: usize,
    /// Lowest tunable frequency in kHz.
    pub min_freq_khz: u32,
    /// Highest tunable frequency in kHz.
    pub max_freq_khz: u32,
    /// Sweep start after power-up, in kHz.
    pub default_start_khz: u32,
    /// Sweep end after power-up, in kHz.
    pub default_end_khz: u32,
    /// Default serial baud rate.
    pub default_baud_rate: u32,
}

impl DeviceModel {
    /// The span the module sweeps when nothing else is known.
    pub fn default_configuration(&self) -> Configuration {
        Configuration::from_khz(
            self.default_start_khz,
            self.default_end_khz,
            self.sweep_points,
        )
    }

    /// Check a requested span (MHz) against the module's limits.
    ///
    /// Returns the span in whole kHz, ready for the frequency-set command.
    pub fn validate_span(&self, start_mhz: f64, end_mhz: f64) -> Result<(u32, u32)> {
        if !start_mhz.is_finite() || !end_mhz.is_finite() || start_mhz < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "invalid span {start_mhz}..{end_mhz} MHz"
            )));
        }
        let start_khz = mhz_to_khz(start_mhz);
        let end_khz = mhz_to_khz(end_mhz);
        if start_khz >= end_khz {
            return Err(Error::InvalidParameter(format!(
                "start {start_mhz} MHz must be below end {end_mhz} MHz"
            )));
        }
        if start_khz < self.min_freq_khz || end_khz > self.max_freq_khz {
            return Err(Error::InvalidParameter(format!(
                "span {start_mhz}..{end_mhz} MHz outside {} range {}..{} MHz",
                self.name,
                khz_to_mhz(self.min_freq_khz),
                khz_to_mhz(self.max_freq_khz),
            )));
        }
        Ok((start_khz, end_khz))
    }
}

/// RF Explorer 2.4G module.
pub fn rf_explorer_24g() -> DeviceModel {
    DeviceModel {
        name: "RF Explorer 2.4G",
        model_id: "24g",
        sweep_points: DEFAULT_SWEEP_POINTS,
        min_freq_khz: 2_350_000,
        max_freq_khz: 2_550_000,
        default_start_khz: 2_400_000,
        default_end_khz: 2_500_000,
        default_baud_rate: DEFAULT_BAUD_RATE,
    }
}

/// RF Explorer 6G module.
pub fn rf_explorer_6g() -> DeviceModel {
    DeviceModel {
        name: "RF Explorer 6G",
        model_id: "6g",
        sweep_points: DEFAULT_SWEEP_POINTS,
        min_freq_khz: 4_850_000,
        max_freq_khz: 6_100_000,
        default_start_khz: 5_100_000,
        default_end_khz: 5_900_000,
        default_baud_rate: DEFAULT_BAUD_RATE,
    }
}

/// Returns every supported model definition.
pub fn all_models() -> Vec<DeviceModel> {
    vec![rf_explorer_24g(), rf_explorer_6g()]
}

/// Look up a model by its identifier, ignoring ASCII case.
pub fn find_model(model_id: &str) -> Option<DeviceModel> {
    all_models()
        .into_iter()
        .find(|m| m.model_id.eq_ignore_ascii_case(model_id))
}
