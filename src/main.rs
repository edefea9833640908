//! Parkwatch binary.
//!
//! `run` drives the capture loop on the device, `once` does a single cycle,
//! and `report` turns a synced-down archival store into aggregate reports.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use parkwatch::delivery::transport::{HttpHubTransport, HubTransport, LocalArchiveTransport};
use parkwatch::hardware::{LogDisplay, SimulatedCamera, SimulatedProbe, StillCamera, SysfsProbe};
use parkwatch::vision::{HttpClassifier, SimulatedClassifier};
use parkwatch::{
    aggregate, AppConfig, ArchiveReader, ArchiveScan, CaptureLoop, CycleOutcome, DeliveryClient,
    DirArchiveStore, Journal, Reading, ReadingDisplay, ReadingProducer, Report,
    DEFAULT_REPORT_LATEST,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "parkwatch")]
#[command(about = "🅿️ Parkwatch - Parking-lot telemetry for Raspberry Pi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Captures temperature and parking occupancy on a Raspberry Pi, journals and delivers readings to a cloud hub, and decodes the hub's archive back into reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the periodic capture loop (default)
    Run(RunArgs),

    /// Capture, journal and deliver a single reading, then exit
    Once(CaptureArgs),

    /// Decode the archival store and print a report
    Report(ReportArgs),
}

#[derive(Args, Default)]
struct RunArgs {
    /// Capture period in seconds (overrides the config file)
    #[arg(short, long)]
    period: Option<u64>,

    #[command(flatten)]
    capture: CaptureArgs,
}

#[derive(Args, Default)]
struct CaptureArgs {
    /// Use the simulated sensor, camera and classifier
    #[arg(long)]
    simulate: bool,

    /// Journal file path (overrides the config file)
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Drive the I2C LCD (needs the `hardware` feature)
    #[arg(long)]
    lcd: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Archive directory to scan (overrides the config file)
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,

    /// Include the per-day category breakdown
    #[arg(long)]
    daily: bool,

    /// How many of the newest readings to list
    #[arg(long, default_value_t = DEFAULT_REPORT_LATEST)]
    latest: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    init_logging(&cli)?;

    // Print banner
    print_banner();

    match &cli.command {
        Some(Commands::Run(args)) => {
            run_command(&cli, args).await?;
        }
        Some(Commands::Once(args)) => {
            once_command(&cli, args).await?;
        }
        Some(Commands::Report(args)) => {
            report_command(&cli, args).await?;
        }
        None => {
            // Default to the capture loop
            run_command(&cli, &RunArgs::default()).await?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn print_banner() {
    println!("🅿️ Parkwatch - Parking-lot telemetry");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    match &cli.config {
        Some(path) => {
            let config = AppConfig::load(path)?;
            info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(AppConfig::default()),
    }
}

async fn run_command(cli: &Cli, args: &RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(cli)?;
    if let Some(period) = args.period {
        config.capture.period = Duration::from_secs(period);
    }
    if let Some(journal) = &args.capture.journal {
        config.capture.journal_path = journal.clone();
    }

    let shutdown = CancellationToken::new();
    spawn_shutdown_watcher(shutdown.clone());

    let capture = build_capture_loop(&config, &args.capture, shutdown)?;
    info!(
        period = ?config.capture.period,
        "starting capture loop (ctrl-c to stop)"
    );
    capture.run().await;
    info!("shutdown complete");

    Ok(())
}

async fn once_command(cli: &Cli, args: &CaptureArgs) -> anyhow::Result<()> {
    let mut config = load_config(cli)?;
    if let Some(journal) = &args.journal {
        config.capture.journal_path = journal.clone();
    }

    let capture = build_capture_loop(&config, args, CancellationToken::new())?;
    match capture.run_once().await {
        CycleOutcome::Completed {
            reading,
            journaled,
            delivered,
        } => {
            print_pretty_reading(&reading);
            println!();
            println!("  Journaled: {}", if journaled { "✓" } else { "✗" });
            println!("  Delivered: {}", if delivered { "✓" } else { "✗" });
        }
        CycleOutcome::SkippedCapture => {
            error!("capture failed; nothing was journaled or delivered");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn report_command(cli: &Cli, args: &ReportArgs) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let dir = args.archive.clone().unwrap_or(config.archive.dir);
    info!(dir = %dir.display(), "scanning archive");

    let reader = ArchiveReader::new(DirArchiveStore::new(&dir));
    let scan = reader.read_all().await?;

    if scan.readings.is_empty() {
        println!(
            "No valid readings in {} ({} objects scanned, {} lines skipped)",
            dir.display(),
            scan.objects,
            scan.skipped_lines
        );
        return Ok(());
    }

    let report = aggregate(&scan.readings);
    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "pretty" => {
            print_pretty_report(&report, &scan, args);
        }
        _ => {
            error!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn build_capture_loop(
    config: &AppConfig,
    args: &CaptureArgs,
    shutdown: CancellationToken,
) -> anyhow::Result<CaptureLoop> {
    let producer = build_producer(config, args.simulate)?;
    let journal = Journal::open(&config.capture.journal_path).with_context(|| {
        format!(
            "cannot open journal at {}",
            config.capture.journal_path.display()
        )
    })?;
    info!(path = %journal.path().display(), "journal open");

    let transport = build_transport(config)?;
    let delivery = DeliveryClient::new(transport, config.delivery.retry_policy(), shutdown.clone());
    let display = build_display(config, args.lcd);

    Ok(CaptureLoop::new(
        producer,
        journal,
        delivery,
        display,
        config.capture.period,
        shutdown,
    ))
}

fn build_producer(config: &AppConfig, simulate: bool) -> anyhow::Result<ReadingProducer> {
    if simulate {
        info!("using simulated sensor, camera and classifier");
        return Ok(ReadingProducer::new(
            Box::new(SimulatedProbe::new(21.0)),
            Box::new(SimulatedCamera::new()),
            Box::new(SimulatedClassifier::new()),
        ));
    }

    let hardware = &config.hardware;
    let probe = SysfsProbe::new(&hardware.sensor_path);
    let camera = StillCamera::new(
        &hardware.camera_command,
        hardware.camera_width,
        hardware.camera_height,
        hardware.camera_rotation,
    );
    let endpoint = config
        .vision
        .endpoint
        .as_deref()
        .context("vision.endpoint is not configured; set it or pass --simulate")?;
    let classifier = HttpClassifier::new(
        endpoint,
        &config.vision.prediction_key,
        config.vision.request_timeout,
    )?;

    Ok(ReadingProducer::new(
        Box::new(probe),
        Box::new(camera),
        Box::new(classifier),
    ))
}

fn build_transport(config: &AppConfig) -> anyhow::Result<Box<dyn HubTransport>> {
    match &config.hub.endpoint {
        Some(endpoint) => {
            info!(endpoint, "delivering to hub");
            Ok(Box::new(HttpHubTransport::new(
                endpoint,
                &config.hub.sas_token,
                config.hub.request_timeout,
            )?))
        }
        None => {
            let path = config.archive.dir.join("local").join("envelopes-00.json");
            warn!(
                path = %path.display(),
                "no hub endpoint configured; envelopes will be archived locally"
            );
            Ok(Box::new(LocalArchiveTransport::new(&path)?))
        }
    }
}

#[cfg_attr(not(feature = "hardware"), allow(unused_variables))]
fn build_display(config: &AppConfig, lcd: bool) -> Box<dyn ReadingDisplay> {
    if lcd {
        #[cfg(feature = "hardware")]
        {
            match parkwatch::hardware::Lcd::open(
                config.hardware.lcd_bus,
                config.hardware.lcd_address,
            ) {
                Ok(panel) => {
                    info!("LCD initialized");
                    return Box::new(panel);
                }
                Err(err) => {
                    warn!(%err, "LCD unavailable; falling back to the log display");
                }
            }
        }

        #[cfg(not(feature = "hardware"))]
        warn!("--lcd requested but the hardware feature is not compiled in; using the log display");
    }

    Box::new(LogDisplay::new())
}

fn spawn_shutdown_watcher(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        let sigterm_token = shutdown.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("received SIGTERM; shutting down");
                    sigterm_token.cancel();
                }
                Err(err) => error!(%err, "failed to listen for SIGTERM"),
            }
        });
    }

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received ctrl-c; shutting down");
                shutdown.cancel();
            }
            Err(err) => error!(%err, "failed to listen for ctrl-c"),
        }
    });
}

fn print_pretty_reading(reading: &Reading) {
    println!(
        "🅿️ Reading ({})",
        reading.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!();
    println!("  🌡️  Temperature: {:.1}°C", reading.temperature);
    println!("  🚗 Occupancy:   {}", reading.occupancy.label());
}

fn print_pretty_report(report: &Report, scan: &ArchiveScan, args: &ReportArgs) {
    println!("🅿️ Parkwatch Report");
    println!("==========================================");
    println!();

    println!("📦 Archive:");
    println!("  Objects scanned: {}", scan.objects);
    println!("  Readings decoded: {}", report.len());
    if scan.skipped_lines > 0 {
        println!("  Lines skipped: {}", scan.skipped_lines);
    }
    if scan.skipped_objects > 0 {
        println!("  Objects unreadable: {}", scan.skipped_objects);
    }
    if let (Some(first), Some(last)) = (report.time_series.first(), report.time_series.last()) {
        println!(
            "  Covering: {} to {}",
            first.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            last.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!();

    println!("📊 Occupancy:");
    for entry in &report.category_counts {
        println!("  {:<18} {:>5}", entry.category.label(), entry.count);
    }
    println!();

    if args.daily {
        println!("📅 Daily:");
        for day in &report.daily_counts {
            let total: usize = day.counts.iter().map(|entry| entry.count).sum();
            println!("  {} ({} readings)", day.day, total);
            for entry in day.counts.iter().filter(|entry| entry.count > 0) {
                println!("    {:<16} {:>5}", entry.category.label(), entry.count);
            }
        }
        println!();
    }

    if args.latest > 0 {
        let latest = report.latest(args.latest);
        println!("🕐 Latest {} readings:", latest.len());
        for reading in latest {
            println!(
                "  {}  {:>6.1}°C  {}",
                reading.timestamp.format("%Y-%m-%d %H:%M:%S"),
                reading.temperature,
                reading.occupancy.label()
            );
        }
    }
}
