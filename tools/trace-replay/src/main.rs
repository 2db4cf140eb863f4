use anyhow::{Context, Result};
use clap::Parser;
use shuttle_core::animation::{AnimationConfig, BacklogPolicy};
use std::path::PathBuf;
use std::time::Duration;

mod output;
mod replay;
mod trace;

use output::write_report;
use replay::{replay, ReplaySettings};
use trace::read_trace;

#[derive(Parser, Debug)]
#[command(
    name = "trace-replay",
    author,
    version,
    about = "Replay a recorded GPS trace through the bus marker animation queue",
    long_about = "Reads recorded fixes from a GeoJSON LineString or MultiPoint, feeds them \
                  through the same animation queue the app uses for live bus markers, and \
                  writes the raw trace alongside the rendered marker path as GeoJSON.\n\n\
                  Replay runs on a simulated clock, so long traces finish instantly."
)]
struct Args {
    /// Input GeoJSON file with the recorded fixes
    #[arg(short, long)]
    input: PathBuf,

    /// Output GeoJSON file for the raw and rendered paths
    #[arg(short, long)]
    output: PathBuf,

    /// Minimum movement in meters for a fix to be animated to
    #[arg(short, long, default_value_t = 5.0)]
    threshold: f64,

    /// Time between recorded fixes in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Animation time per fix in milliseconds
    #[arg(long, default_value_t = 600)]
    duration_ms: u64,

    /// Delay between rendered frames in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Skip stale pending fixes instead of visiting every one
    #[arg(long)]
    keep_latest: bool,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    log::info!("=== Trace Replay ===");
    log::info!("Input: {}", args.input.display());
    log::info!("Output: {}", args.output.display());

    let trace = read_trace(&args.input)?;
    log::info!("Loaded {} fixes", trace.len());

    let settings = ReplaySettings {
        threshold_meters: args.threshold,
        interval: Duration::from_millis(args.interval_ms),
        animation: AnimationConfig {
            duration: Duration::from_millis(args.duration_ms),
            frame_interval: Duration::from_millis(args.frame_ms),
            backlog: if args.keep_latest {
                BacklogPolicy::KeepLatest
            } else {
                BacklogPolicy::Fifo
            },
        },
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .context("Failed to build replay runtime")?;

    let report = runtime.block_on(replay(&trace, &settings))?;
    report.stats.log_summary();

    write_report(&args.output, &trace, &report.rendered, &report.stats)?;
    log::info!("Output written to: {}", args.output.display());

    Ok(())
}
