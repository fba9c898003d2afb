// Post-recording analysis report.
//
// Summarises a recording session: overall levels, the busiest and quietest
// bins, how often the band was active, and a rough link-quality verdict for
// a video downlink in the band.

use std::fmt;

use crate::recorder::Recording;

/// Number of bins listed in the busiest/quietest tables.
const TOP_BINS: usize = 5;
/// A capture is "active" when its peak exceeds the mean peak by this much.
const ACTIVITY_MARGIN_DB: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Weak,
    None,
}

impl SignalQuality {
    pub fn from_mean_peak(dbm: f32) -> Self {
        if dbm > -50.0 {
            SignalQuality::Excellent
        } else if dbm > -60.0 {
            SignalQuality::Good
        } else if dbm > -70.0 {
            SignalQuality::Fair
        } else if dbm > -80.0 {
            SignalQuality::Weak
        } else {
            SignalQuality::None
        }
    }

    fn label(self) -> &'static str {
        match self {
            SignalQuality::Excellent => "EXCELLENT",
            SignalQuality::Good => "GOOD",
            SignalQuality::Fair => "FAIR",
            SignalQuality::Weak => "WEAK",
            SignalQuality::None => "VERY WEAK / NO SIGNAL",
        }
    }

    fn description(self) -> &'static str {
        match self {
            SignalQuality::Excellent => "Very strong signal, optimal transmission possible.",
            SignalQuality::Good => "Good signal, stable transmission expected.",
            SignalQuality::Fair => "Acceptable signal, occasional interference possible.",
            SignalQuality::Weak => "Weak signal, dropouts likely.",
            SignalQuality::None => "Barely any signal, no link possible.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnrGrade {
    Excellent,
    Good,
    Acceptable,
    Low,
}

impl SnrGrade {
    pub fn from_snr(db: f32) -> Self {
        if db > 30.0 {
            SnrGrade::Excellent
        } else if db > 20.0 {
            SnrGrade::Good
        } else if db > 10.0 {
            SnrGrade::Acceptable
        } else {
            SnrGrade::Low
        }
    }

    fn description(self) -> &'static str {
        match self {
            SnrGrade::Excellent => "excellent SNR, very clear signal separation",
            SnrGrade::Good => "good SNR, sufficient for HD video",
            SnrGrade::Acceptable => "acceptable SNR, SD video possible",
            SnrGrade::Low => "low SNR, heavy interference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Stable,
    Hopping,
    Unstable,
}

impl Stability {
    pub fn from_std_dev(mhz: f64) -> Self {
        if mhz < 10.0 {
            Stability::Stable
        } else if mhz < 50.0 {
            Stability::Hopping
        } else {
            Stability::Unstable
        }
    }

    fn description(self) -> &'static str {
        match self {
            Stability::Stable => "very stable, fixed transmit frequency",
            Stability::Hopping => "normal variation, possibly frequency hopping",
            Stability::Unstable => "high variation, several sources or an unstable transmitter",
        }
    }
}

/// Level statistics for one frequency bin across the whole recording.
#[derive(Debug, Clone, PartialEq)]
pub struct BinStat {
    pub freq_mhz: f64,
    pub max_dbm: f32,
    pub avg_dbm: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub duration_sec: f64,
    pub captures: usize,

    pub peak_max_dbm: f32,
    pub peak_mean_dbm: f32,
    pub peak_min_dbm: f32,
    pub noise_floor_dbm: f32,
    pub mean_level_dbm: f32,

    /// Bins with the highest maximum level, strongest first.
    pub most_active: Vec<BinStat>,

    pub activity_threshold_dbm: f32,
    pub active_captures: usize,

    pub quality: SignalQuality,
    pub snr_db: f32,
    pub snr_grade: SnrGrade,
    pub peak_freq_std_mhz: f64,
    pub stability: Stability,

    /// Bins with the lowest average level, quietest first.
    pub quietest: Vec<BinStat>,
}

impl Report {
    pub fn active_percent(&self) -> f64 {
        if self.captures == 0 {
            return 0.0;
        }
        self.active_captures as f64 * 100.0 / self.captures as f64
    }
}

fn mean(values: impl ExactSizeIterator<Item = f32>) -> f32 {
    let n = values.len();
    if n == 0 {
        return f32::NAN;
    }
    values.sum::<f32>() / n as f32
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Analyse a recording. `frequencies` labels the bins. Returns `None` for
/// an empty recording.
pub fn analyze(recordings: &[Recording], frequencies: &[f64]) -> Option<Report> {
    let first = recordings.first()?;
    let last = recordings.last()?;
    let points = frequencies
        .len()
        .min(recordings.iter().map(|r| r.frame.readings().len()).min()?);

    let peaks: Vec<f32> = recordings.iter().map(|r| r.frame.peak_dbm()).collect();
    let peak_mean = mean(peaks.iter().copied());
    let noise_floor = recordings
        .iter()
        .map(|r| r.frame.min_dbm())
        .fold(f32::INFINITY, f32::min);

    let bins: Vec<BinStat> = (0..points)
        .map(|i| BinStat {
            freq_mhz: frequencies[i],
            max_dbm: recordings
                .iter()
                .map(|r| r.frame.readings()[i])
                .fold(f32::NEG_INFINITY, f32::max),
            avg_dbm: mean(recordings.iter().map(|r| r.frame.readings()[i])),
        })
        .collect();

    let mut most_active = bins.clone();
    most_active.sort_by(|a, b| b.max_dbm.total_cmp(&a.max_dbm));
    most_active.truncate(TOP_BINS);

    let mut quietest = bins;
    quietest.sort_by(|a, b| a.avg_dbm.total_cmp(&b.avg_dbm));
    quietest.truncate(TOP_BINS);

    let threshold = peak_mean + ACTIVITY_MARGIN_DB;
    let snr = peak_mean - noise_floor;
    let peak_freqs: Vec<f64> = recordings.iter().map(|r| r.frame.peak_freq_mhz()).collect();
    let freq_std = std_dev(&peak_freqs);

    Some(Report {
        duration_sec: (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0,
        captures: recordings.len(),
        peak_max_dbm: peaks.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        peak_mean_dbm: peak_mean,
        peak_min_dbm: peaks.iter().copied().fold(f32::INFINITY, f32::min),
        noise_floor_dbm: noise_floor,
        mean_level_dbm: mean(recordings.iter().map(|r| r.frame.avg_dbm())),
        most_active,
        activity_threshold_dbm: threshold,
        active_captures: peaks.iter().filter(|&&p| p > threshold).count(),
        quality: SignalQuality::from_mean_peak(peak_mean),
        snr_db: snr,
        snr_grade: SnrGrade::from_snr(snr),
        peak_freq_std_mhz: freq_std,
        stability: Stability::from_std_dev(freq_std),
        quietest,
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "RF SPECTRUM ANALYSIS")?;
        writeln!(f, "{rule}")?;
        writeln!(f)?;
        writeln!(f, "Recording period: {:.1} minutes", self.duration_sec / 60.0)?;
        writeln!(f, "Captures:         {}", self.captures)?;

        writeln!(f, "\n--- OVERALL ---")?;
        writeln!(f, "Peak maximum:  {:.1} dBm", self.peak_max_dbm)?;
        writeln!(f, "Peak mean:     {:.1} dBm", self.peak_mean_dbm)?;
        writeln!(f, "Peak minimum:  {:.1} dBm", self.peak_min_dbm)?;
        writeln!(f, "Noise floor:   {:.1} dBm", self.noise_floor_dbm)?;
        writeln!(f, "Mean level:    {:.1} dBm", self.mean_level_dbm)?;

        writeln!(f, "\n--- FREQUENCIES ---")?;
        writeln!(f, "Most active (highest measured level):")?;
        for (rank, bin) in self.most_active.iter().enumerate() {
            writeln!(
                f,
                "  {}. {:.0} MHz: max {:.1} dBm, avg {:.1} dBm",
                rank + 1,
                bin.freq_mhz,
                bin.max_dbm,
                bin.avg_dbm
            )?;
        }

        writeln!(f, "\n--- ACTIVITY ---")?;
        writeln!(f, "Activity threshold: {:.1} dBm", self.activity_threshold_dbm)?;
        writeln!(
            f,
            "Active captures:    {} of {} ({:.1}%)",
            self.active_captures,
            self.captures,
            self.active_percent()
        )?;

        writeln!(f, "\n--- LINK QUALITY ---")?;
        writeln!(f, "Signal quality: {}", self.quality.label())?;
        writeln!(f, "Assessment:     {}", self.quality.description())?;
        writeln!(f, "SNR: {:.1} dB ({})", self.snr_db, self.snr_grade.description())?;
        writeln!(
            f,
            "Peak frequency spread: +/-{:.1} MHz ({})",
            self.peak_freq_std_mhz,
            self.stability.description()
        )?;

        writeln!(f, "\n--- CHANNEL RECOMMENDATION ---")?;
        writeln!(f, "Quietest frequencies (least interference):")?;
        for bin in &self.quietest {
            writeln!(f, "  {:.0} MHz: avg {:.1} dBm", bin.freq_mhz, bin.avg_dbm)?;
        }
        writeln!(f, "\n{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rfexplorer_core::{Configuration, SweepFrame};

    fn recording(second: u32, readings: Vec<f32>) -> Recording {
        let config = Configuration::new(5100.0, 5900.0, readings.len());
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap();
        Recording {
            timestamp,
            elapsed_sec: f64::from(second),
            frame: SweepFrame::new(readings, &config, timestamp),
        }
    }

    fn freqs(points: usize) -> Vec<f64> {
        Configuration::new(5100.0, 5900.0, points).frequencies()
    }

    #[test]
    fn empty_recording_has_no_report() {
        assert!(analyze(&[], &freqs(8)).is_none());
    }

    #[test]
    fn overall_statistics() {
        let recs = vec![
            recording(0, vec![-90.0, -50.0, -95.0, -90.0]),
            recording(30, vec![-90.0, -70.0, -92.0, -90.0]),
        ];
        let report = analyze(&recs, &freqs(4)).unwrap();

        assert_eq!(report.captures, 2);
        assert_eq!(report.duration_sec, 30.0);
        assert_eq!(report.peak_max_dbm, -50.0);
        assert_eq!(report.peak_min_dbm, -70.0);
        assert_eq!(report.peak_mean_dbm, -60.0);
        assert_eq!(report.noise_floor_dbm, -95.0);
        assert_eq!(report.snr_db, 35.0);
        assert_eq!(report.snr_grade, SnrGrade::Excellent);
        assert_eq!(report.quality, SignalQuality::Fair);
        assert_eq!(report.stability, Stability::Stable);
    }

    #[test]
    fn busiest_and_quietest_bins() {
        let recs = vec![
            recording(0, vec![-90.0, -40.0, -99.0, -60.0, -80.0, -85.0, -70.0]),
            recording(1, vec![-90.0, -80.0, -99.0, -60.0, -80.0, -85.0, -70.0]),
        ];
        let report = analyze(&recs, &freqs(7)).unwrap();

        assert_eq!(report.most_active.len(), 5);
        assert_eq!(report.most_active[0].max_dbm, -40.0);
        assert_eq!(report.most_active[0].avg_dbm, -60.0);
        assert_eq!(report.most_active[1].max_dbm, -60.0);

        assert_eq!(report.quietest.len(), 5);
        assert_eq!(report.quietest[0].avg_dbm, -99.0);
        assert_eq!(report.quietest[1].avg_dbm, -90.0);
    }

    #[test]
    fn activity_uses_five_db_margin() {
        let mut recs: Vec<Recording> = (0..9).map(|s| recording(s, vec![-80.0, -90.0])).collect();
        recs.push(recording(9, vec![-40.0, -90.0]));
        let report = analyze(&recs, &freqs(2)).unwrap();

        // Mean peak is -76 dBm, threshold -71 dBm; only the last capture exceeds it.
        assert_eq!(report.activity_threshold_dbm, -71.0);
        assert_eq!(report.active_captures, 1);
        assert_eq!(report.active_percent(), 10.0);
    }

    #[test]
    fn hopping_peak_frequency() {
        let recs = vec![
            recording(0, vec![-40.0, -90.0]),
            recording(1, vec![-90.0, -40.0]),
        ];
        let report = analyze(&recs, &freqs(2)).unwrap();
        assert_eq!(report.peak_freq_std_mhz, 400.0);
        assert_eq!(report.stability, Stability::Unstable);
    }

    #[test]
    fn quality_grades() {
        assert_eq!(SignalQuality::from_mean_peak(-45.0), SignalQuality::Excellent);
        assert_eq!(SignalQuality::from_mean_peak(-50.0), SignalQuality::Good);
        assert_eq!(SignalQuality::from_mean_peak(-65.0), SignalQuality::Fair);
        assert_eq!(SignalQuality::from_mean_peak(-75.0), SignalQuality::Weak);
        assert_eq!(SignalQuality::from_mean_peak(-80.0), SignalQuality::None);
        assert_eq!(SnrGrade::from_snr(25.0), SnrGrade::Good);
        assert_eq!(SnrGrade::from_snr(10.0), SnrGrade::Low);
        assert_eq!(Stability::from_std_dev(25.0), Stability::Hopping);
    }

    #[test]
    fn report_renders_sections() {
        let recs = vec![recording(0, vec![-90.0, -50.0, -95.0])];
        let text = analyze(&recs, &freqs(3)).unwrap().to_string();
        assert!(text.contains("--- OVERALL ---"));
        assert!(text.contains("Signal quality: GOOD"));
        assert!(text.contains("  1. 5500 MHz: max -50.0 dBm, avg -50.0 dBm"));
    }
}
