// ASCII renderers for the live display.
//
// Both renderers are pure: they take decoded data and return the text to
// print, so the live loop only has to clear the screen and write it out.

use rfexplorer_core::{Configuration, SweepFrame};
use rfexplorer_protocol::SweepHistory;

/// Bar graph height in rows.
pub const SPECTRUM_ROWS: usize = 10;
/// Level of the top row.
pub const SPECTRUM_TOP_DBM: f32 = -20.0;
/// Level just below the bottom row.
pub const SPECTRUM_BOTTOM_DBM: f32 = -100.0;

/// Waterfall colour scale, weakest to strongest.
const SHADES: &[u8] = b" .:-=+*#%@";
const WATERFALL_LOW_DBM: f32 = -100.0;
const WATERFALL_HIGH_DBM: f32 = -40.0;

/// Width of the `-20dBm |` row label.
const LABEL_WIDTH: usize = 9;

/// Pick `cols` readings spread evenly across `readings`. Shorter sweeps are
/// returned unchanged.
pub fn resample(readings: &[f32], cols: usize) -> Vec<f32> {
    if cols == 0 || readings.len() <= cols {
        return readings.to_vec();
    }
    let step = readings.len() as f64 / cols as f64;
    (0..cols)
        .map(|i| readings[(i as f64 * step) as usize])
        .collect()
}

/// Render one sweep as a bar graph.
///
/// Bins reaching a row's level are drawn `#`; bins where only the peak hold
/// reaches it are drawn `.`.
pub fn render_spectrum(
    frame: &SweepFrame,
    config: &Configuration,
    peak_hold: Option<&[f32]>,
    cols: usize,
    receiving: bool,
) -> String {
    let current = resample(frame.readings(), cols);
    let held = peak_hold.map(|levels| resample(levels, cols)).unwrap_or_default();
    let cols = current.len();

    let status = if receiving { "LIVE" } else { "WAITING" };
    let mut out = String::new();
    out.push_str(&format!(
        "RF Explorer Live | {:.0}-{:.0} MHz | Peak: {:.1} MHz @ {:.1} dBm  [{status}]\n",
        config.start_mhz,
        config.end_mhz,
        frame.peak_freq_mhz(),
        frame.peak_dbm(),
    ));
    out.push_str(&"=".repeat(cols + LABEL_WIDTH + 1));
    out.push('\n');

    let row_step = (SPECTRUM_TOP_DBM - SPECTRUM_BOTTOM_DBM) / SPECTRUM_ROWS as f32;
    for row in 0..SPECTRUM_ROWS {
        let threshold = SPECTRUM_TOP_DBM - row as f32 * row_step;
        out.push_str(&format!("{threshold:5.0}dBm |"));
        for (i, &level) in current.iter().enumerate() {
            let ch = if level >= threshold {
                '#'
            } else if held.get(i).is_some_and(|&h| h >= threshold) {
                '.'
            } else {
                ' '
            };
            out.push(ch);
        }
        out.push('\n');
    }

    out.push_str(&" ".repeat(LABEL_WIDTH));
    out.push('+');
    out.push_str(&"-".repeat(cols));
    out.push('\n');

    let start = format!("{:.0}", config.start_mhz);
    let end = format!("{:.0} MHz", config.end_mhz);
    let gap = (cols + 1).saturating_sub(start.len() + end.len()).max(1);
    out.push_str(&format!("{}{start}{}{end}\n\n", " ".repeat(LABEL_WIDTH), " ".repeat(gap)));

    out.push_str(&format!(
        "Peak: {:.1} dBm @ {:.1} MHz | Avg: {:.1} dBm | Noise: {:.1} dBm\n",
        frame.peak_dbm(),
        frame.peak_freq_mhz(),
        frame.avg_dbm(),
        frame.min_dbm(),
    ));
    out
}

fn shade(level: f32) -> char {
    let span = WATERFALL_HIGH_DBM - WATERFALL_LOW_DBM;
    let norm = ((level - WATERFALL_LOW_DBM) / span).clamp(0.0, 1.0);
    let idx = (norm * (SHADES.len() - 1) as f32).round() as usize;
    char::from(SHADES[idx])
}

/// Render the newest `rows` sweeps of `history`, newest on top.
pub fn render_waterfall(history: &SweepHistory, cols: usize, rows: usize) -> String {
    let mut out = String::new();
    for frame in history.iter().rev().take(rows) {
        out.push_str(&" ".repeat(LABEL_WIDTH));
        out.push('|');
        out.extend(resample(frame.readings(), cols).into_iter().map(shade));
        out.push('\n');
    }
    out
}
