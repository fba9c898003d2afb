// Long-running capture: one sweep per interval, kept in memory and written
// to CSV when the run ends.

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use rfexplorer_core::{Configuration, SweepFrame};
use rfexplorer_protocol::Session;

/// One captured sweep.
#[derive(Debug, Clone)]
pub struct Recording {
    pub timestamp: DateTime<Utc>,
    /// Seconds since the recording started.
    pub elapsed_sec: f64,
    pub frame: SweepFrame,
}

#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub duration: Duration,
    pub interval: Duration,
    /// How often the session is polled between captures.
    pub poll_interval: Duration,
}

/// Captures taken on a single frequency axis.
#[derive(Debug, Clone)]
pub struct Capture {
    pub configuration: Configuration,
    pub recordings: Vec<Recording>,
}

/// Capture sweeps until `duration` elapses or `cancel` fires.
///
/// Only the newest sweep at each capture point is kept; sweeps in between
/// still feed the session's peak hold and history. Recording stops early if
/// the device reports a different span, so every row shares one axis.
pub async fn record(
    session: &mut Session,
    opts: &RecordOptions,
    cancel: &CancellationToken,
) -> Result<Capture> {
    let configuration = session.configuration().clone();
    let started = Instant::now();
    let mut ticker = tokio::time::interval(opts.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut recordings = Vec::new();
    let mut last_capture: Option<Instant> = None;

    while started.elapsed() < opts.duration {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                println!("\nRecording interrupted.");
                break;
            }
            _ = ticker.tick() => {}
        }

        let frames = session.poll().await.context("reading from analyzer")?;
        if session.configuration() != &configuration {
            warn!(
                from = ?configuration,
                to = ?session.configuration(),
                "span changed, stopping recording"
            );
            println!("\nSpan changed on the device; recording stopped.");
            break;
        }
        let Some(frame) = frames.into_iter().last() else {
            continue;
        };

        let due = last_capture.is_none_or(|t| t.elapsed() >= opts.interval);
        if !due {
            continue;
        }
        last_capture = Some(Instant::now());

        let recording = Recording {
            timestamp: frame.timestamp(),
            elapsed_sec: started.elapsed().as_secs_f64(),
            frame,
        };
        println!("{}", summary_line(&recording));
        recordings.push(recording);
    }

    debug!(count = recordings.len(), "recording finished");
    Ok(Capture {
        configuration,
        recordings,
    })
}

/// One-line progress report for a capture.
pub fn summary_line(rec: &Recording) -> String {
    format!(
        "[{:4.0}s] Peak: {:6.1} dBm @ {:.0} MHz | Avg: {:.1} dBm",
        rec.elapsed_sec,
        rec.frame.peak_dbm(),
        rec.frame.peak_freq_mhz(),
        rec.frame.avg_dbm(),
    )
}

/// Default output name, derived from the start of the recording.
pub fn default_csv_name(started: DateTime<Utc>) -> String {
    format!("rf_recording_{}.csv", started.format("%Y%m%d_%H%M%S"))
}

/// Write recordings as CSV: summary columns, then one column per bin.
pub fn write_csv<W: io::Write>(
    writer: W,
    recordings: &[Recording],
    frequencies: &[f64],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = ["timestamp", "elapsed_sec", "peak_dbm", "peak_freq_mhz", "avg_dbm"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(frequencies.iter().map(|f| format!("{f:.1}MHz")));
    wtr.write_record(&header)?;

    for rec in recordings {
        let mut row = vec![
            rec.timestamp.to_rfc3339(),
            format!("{:.3}", rec.elapsed_sec),
            rec.frame.peak_dbm().to_string(),
            format!("{:.3}", rec.frame.peak_freq_mhz()),
            format!("{:.2}", rec.frame.avg_dbm()),
        ];
        row.extend(rec.frame.readings().iter().map(|r| r.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write recordings to a CSV file at `path`.
pub fn save_csv(path: &Path, recordings: &[Recording], frequencies: &[f64]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(file, recordings, frequencies)
        .with_context(|| format!("writing {}", path.display()))
}
