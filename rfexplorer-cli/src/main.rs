// rfexplorer -- terminal front end for RF Explorer spectrum analyzers.
//
// Usage:
//   rfexplorer list
//   rfexplorer --model 6g --port /dev/ttyUSB0 info
//   rfexplorer --model 24g --port /dev/ttyUSB0 live --waterfall
//   rfexplorer --model 6g --port /dev/ttyUSB0 --start 5500 --end 5700 live
//   rfexplorer --model 6g --port /dev/ttyUSB0 record --duration 10 --interval 1
//   rfexplorer --mock live
//
// Logging goes to stderr and is controlled with RUST_LOG (default: info).

mod analysis;
mod recorder;
mod render;
mod simulator;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rfexplorer_protocol::models::{self, DeviceModel};
use rfexplorer_protocol::{ScanPolicy, Session, SessionBuilder};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// rfexplorer -- live spectrum display and recorder for RF Explorer analyzers.
#[derive(Parser)]
#[command(name = "rfexplorer", version, about)]
struct Cli {
    /// Analyzer module: 24g or 6g.
    #[arg(long, default_value = "6g")]
    model: String,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3). Required unless --mock.
    #[arg(long)]
    port: Option<String>,

    /// Override the default baud rate (500000).
    #[arg(long)]
    baud: Option<u32>,

    /// Sweep start in MHz. Must be given together with --end.
    #[arg(long, requires = "end")]
    start: Option<f64>,

    /// Sweep end in MHz. Must be given together with --start.
    #[arg(long, requires = "start")]
    end: Option<f64>,

    /// How sweeps are pulled from the stream.
    #[arg(long, value_enum, default_value = "exhaustive")]
    policy: PolicyArg,

    /// Use a simulated analyzer instead of a serial port.
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Decode every complete sweep in arrival order.
    Exhaustive,
    /// Decode only the newest sweep on each read.
    Latest,
}

impl From<PolicyArg> for ScanPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Exhaustive => ScanPolicy::Exhaustive,
            PolicyArg::Latest => ScanPolicy::LatestOnly,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List supported analyzer models.
    List,

    /// Connect, print device identity and configuration, show one sweep.
    Info,

    /// Live ASCII spectrum display.
    Live {
        /// Columns used for the spectrum (bins are resampled to fit).
        #[arg(long, default_value_t = 80)]
        width: usize,

        /// Minimum time between redraws in milliseconds.
        #[arg(long, default_value_t = 100)]
        refresh_ms: u64,

        /// Show a waterfall of recent sweeps under the spectrum.
        #[arg(long)]
        waterfall: bool,

        /// Waterfall height in rows.
        #[arg(long, default_value_t = 16)]
        waterfall_rows: usize,

        /// Reset the peak hold every N seconds.
        #[arg(long)]
        reset_peak_secs: Option<u64>,
    },

    /// Record sweeps to CSV and print an analysis report.
    Record {
        /// Recording duration in minutes.
        #[arg(short, long, default_value_t = 5.0)]
        duration: f64,

        /// Capture interval in seconds.
        #[arg(short, long, default_value_t = 1.0)]
        interval: f64,

        /// Output CSV file (default: rf_recording_<timestamp>.csv).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// How often the session is polled while streaming.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Session setup
// ---------------------------------------------------------------------------

fn resolve_model(name: &str) -> Result<DeviceModel> {
    models::find_model(name).with_context(|| {
        let known: Vec<&str> = models::all_models().iter().map(|m| m.model_id).collect();
        format!("unknown model '{name}' (known: {})", known.join(", "))
    })
}

async fn create_session(
    cli: &Cli,
    cancel: &CancellationToken,
) -> Result<(Session, Option<JoinHandle<()>>)> {
    let model = resolve_model(&cli.model)?;
    let points = model.sweep_points;

    let mut builder = SessionBuilder::new(model.clone()).scan_policy(cli.policy.into());
    if let (Some(start), Some(end)) = (cli.start, cli.end) {
        builder = builder.frequency_range(start, end);
    }
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }

    if cli.mock {
        let mock = simulator::scripted_transport(&model);
        let session = builder
            .settle_delay(Duration::ZERO)
            .build_with_transport(Box::new(mock.clone()))
            .await
            .context("configuring simulated session")?;
        let feeder = simulator::spawn_feeder(mock, points, cancel.child_token());
        return Ok((session, Some(feeder)));
    }

    let Some(port) = cli.port.as_deref() else {
        bail!("--port is required (or use --mock)");
    };
    let session = builder
        .serial_port(port)
        .build()
        .await
        .with_context(|| format!("opening {port}"))?;
    Ok((session, None))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    println!("{:<6} {:<20} {:>6}  {:<16} {:<16}", "ID", "Model", "Points", "Range (MHz)", "Default (MHz)");
    for m in models::all_models() {
        println!(
            "{:<6} {:<20} {:>6}  {:<16} {:<16}",
            m.model_id,
            m.name,
            m.sweep_points,
            format!("{}-{}", m.min_freq_khz / 1000, m.max_freq_khz / 1000),
            format!("{}-{}", m.default_start_khz / 1000, m.default_end_khz / 1000),
        );
    }
    Ok(())
}

async fn cmd_info(session: &mut Session) -> Result<()> {
    let info = session.initialize().await.context("initializing analyzer")?;
    let config = &info.configuration;

    println!("Model:       {}", session.model().name);
    println!("Identity:    {}", info.identity.as_deref().unwrap_or("(not reported)"));
    println!("Span:        {:.1} - {:.1} MHz ({})", config.start_mhz, config.end_mhz, info.source);
    println!("Step:        {:.1} kHz", config.step_mhz() * 1000.0);
    println!("Points:      {}", config.point_count);
    println!("Scan policy: {:?}", session.scan_policy());

    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if let Some(frame) = session.poll().await?.pop() {
            println!(
                "Sweep:       peak {:.1} dBm @ {:.1} MHz, avg {:.1} dBm, noise {:.1} dBm",
                frame.peak_dbm(),
                frame.peak_freq_mhz(),
                frame.avg_dbm(),
                frame.min_dbm()
            );
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    println!("Sweep:       none received within 2 s");
    Ok(())
}

async fn cmd_live(
    session: &mut Session,
    cancel: &CancellationToken,
    width: usize,
    refresh: Duration,
    waterfall_rows: Option<usize>,
    reset_peak: Option<Duration>,
) -> Result<()> {
    session.initialize().await.context("initializing analyzer")?;
    println!("Starting live display... (Ctrl+C to quit)");

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_draw: Option<Instant> = None;
    let mut last_reset = Instant::now();
    let mut stdout = io::stdout();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let frames = session.poll().await.context("reading from analyzer")?;
        if let Some(period) = reset_peak {
            if last_reset.elapsed() >= period {
                session.reset_peak_hold();
                last_reset = Instant::now();
            }
        }

        let Some(frame) = frames.last() else {
            continue;
        };
        if last_draw.is_some_and(|t| t.elapsed() < refresh) {
            continue;
        }
        last_draw = Some(Instant::now());

        let mut screen = String::from("\x1b[H\x1b[J");
        screen.push_str(&render::render_spectrum(
            frame,
            session.configuration(),
            Some(session.peak_hold().levels()),
            width,
            session.is_receiving(),
        ));
        if let Some(rows) = waterfall_rows {
            screen.push('\n');
            screen.push_str(&render::render_waterfall(session.history(), width, rows));
        }
        stdout.write_all(screen.as_bytes())?;
        stdout.flush()?;
    }

    println!("\n\nStopped after {} sweeps.", session.sweeps_decoded());
    Ok(())
}

async fn cmd_record(
    session: &mut Session,
    cancel: &CancellationToken,
    duration_min: f64,
    interval_sec: f64,
    output: Option<PathBuf>,
) -> Result<()> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(duration_min) || !positive(interval_sec) {
        bail!("duration and interval must be positive");
    }
    let info = session.initialize().await.context("initializing analyzer")?;
    let started = chrono::Utc::now();

    println!("=== RF Explorer recording ===");
    println!(
        "Span:     {:.0}-{:.0} MHz",
        info.configuration.start_mhz, info.configuration.end_mhz
    );
    println!("Duration: {duration_min} minutes");
    println!("Interval: {interval_sec}s");
    println!("Start:    {}", started.format("%Y-%m-%d %H:%M:%S"));
    println!("{}", "-".repeat(40));

    let opts = recorder::RecordOptions {
        duration: Duration::from_secs_f64(duration_min * 60.0),
        interval: Duration::from_secs_f64(interval_sec),
        poll_interval: POLL_INTERVAL,
    };
    let capture = recorder::record(session, &opts, cancel).await?;
    let recordings = capture.recordings;
    println!("\n{} captures recorded.", recordings.len());

    let frequencies = capture.configuration.frequencies();
    let path = output.unwrap_or_else(|| PathBuf::from(recorder::default_csv_name(started)));
    recorder::save_csv(&path, &recordings, &frequencies)?;
    println!("Data saved: {}", path.display());

    match analysis::analyze(&recordings, &frequencies) {
        Some(report) => print!("\n{report}"),
        None => println!("No data to analyse."),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // The `list` command does not need an analyzer.
    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        ctrl_c.cancel();
    });

    let (mut session, feeder) = create_session(&cli, &cancel).await?;

    let result = match &cli.command {
        Command::Info => cmd_info(&mut session).await,
        Command::Live {
            width,
            refresh_ms,
            waterfall,
            waterfall_rows,
            reset_peak_secs,
        } => {
            cmd_live(
                &mut session,
                &cancel,
                *width,
                Duration::from_millis(*refresh_ms),
                waterfall.then_some(*waterfall_rows),
                reset_peak_secs.map(Duration::from_secs),
            )
            .await
        }
        Command::Record {
            duration,
            interval,
            output,
        } => cmd_record(&mut session, &cancel, *duration, *interval, output.clone()).await,
        Command::List => unreachable!("list handled above"),
    };

    session.close().await.ok();
    cancel.cancel();
    if let Some(feeder) = feeder {
        feeder.await.ok();
    }
    result
}
