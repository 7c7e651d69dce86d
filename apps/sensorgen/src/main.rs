//! sensorgen — synthetic telemetry for a fleet of virtual sensors.
//!
//! Subcommands:
//!
//! - `run` (default): provision tables and indices, then start one Driver
//!   thread per sensor type streaming into SQLite and the search service
//!   until Ctrl-C.
//! - `provision`: create missing tables and indices, then exit.
//! - `backfill`: simulate N seconds flat out and write one CSV per sensor.

mod config;
mod logging;
mod sinks;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use sg_core::{SensorType, SimClock};
use sg_driver::{DriverSummary, Runner, RunnerConfig, RunnerHandle};
use tracing::{error, info};

use config::AppConfig;
use sinks::{BackfillSinks, LiveSinks};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sensorgen", version, about = "Synthetic sensor telemetry generator")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "SENSORGEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Flags that override values from the configuration file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// SQLite database file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Base URL of the search service.
    #[arg(long, global = true)]
    search_url: Option<String>,

    /// Do not write to the search service.
    #[arg(long, global = true)]
    no_search: bool,

    /// Global RNG seed for reproducible series.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Milliseconds between ticks in live mode.
    #[arg(long, global = true)]
    tick_ms: Option<u64>,

    /// Flush after this many ticks' worth of measurements.
    #[arg(long, global = true)]
    flush_factor: Option<usize>,

    /// Comma-separated sensor types (temperature,humidity,wind,esd,particle).
    #[arg(long, global = true, value_delimiter = ',')]
    types: Option<Vec<SensorType>>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream live telemetry until interrupted.
    Run,
    /// Create missing tables and search indices.
    Provision,
    /// Generate historic CSV files without sleeping.
    Backfill {
        /// Simulated seconds (ticks) to generate.
        #[arg(long, default_value_t = 3_600)]
        seconds: u64,

        /// Timestamp of the first tick (RFC 3339). Default 2025-07-15T09:32:00Z.
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Output directory; files land in `<out>/<type>/<sensor_id>.csv`.
        #[arg(long, default_value = "Data")]
        out: PathBuf,
    },
}

impl Overrides {
    fn apply(self, config: &mut AppConfig) {
        if let Some(db) = self.db {
            config.database.path = db;
        }
        if let Some(url) = self.search_url {
            config.search.url = url;
        }
        if self.no_search {
            config.search.enabled = false;
        }
        if self.seed.is_some() {
            config.simulation.seed = self.seed;
        }
        if let Some(ms) = self.tick_ms {
            config.simulation.tick_ms = ms;
        }
        if let Some(f) = self.flush_factor {
            config.simulation.flush_factor = f;
        }
        if let Some(types) = self.types {
            config.simulation.sensor_types = types;
        }
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.overrides.apply(&mut config);
    logging::init_tracing(&config.logging)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config).await,
        Command::Provision => {
            let registry = config.registry()?;
            sinks::provision(&live_sinks(&config), &config.selected_types(&registry))
        }
        Command::Backfill { seconds, start, out } => {
            let start = start.unwrap_or_else(|| SimClock::backfill_default().start);
            backfill(&config, seconds, start, out).await
        }
    }
}

fn live_sinks(config: &AppConfig) -> LiveSinks {
    LiveSinks {
        db:     config.database.path.clone(),
        search: config.search.sink_config(),
    }
}

async fn run(config: &AppConfig) -> Result<()> {
    let registry = config.registry()?;
    let types = config.selected_types(&registry);
    let sinks = live_sinks(config);
    sinks::provision(&sinks, &types)?;

    let runner_config = RunnerConfig {
        seed:           config.simulation.seed,
        flush_factor:   config.simulation.flush_factor,
        tick_interval:  config.tick_interval(),
        start:          None,
        max_ticks:      None,
        progress_every: config.simulation.progress_every,
    };
    let handle = Runner::new(&registry, runner_config)
        .sensor_types(&types)
        .start(&sinks)?;
    info!(types = ?types, "simulation running; press Ctrl-C to stop");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("interrupt received, stopping drivers");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                if handle.is_finished() {
                    error!("every driver exited without a stop request");
                    break;
                }
            }
        }
    }
    handle.request_stop();
    finish(handle).await
}

async fn backfill(config: &AppConfig, seconds: u64, start: DateTime<Utc>, out: PathBuf) -> Result<()> {
    let registry = config.registry()?;
    let types = config.selected_types(&registry);
    let runner_config = RunnerConfig {
        seed:           config.simulation.seed,
        flush_factor:   config.simulation.flush_factor,
        tick_interval:  Duration::ZERO,
        start:          Some(start),
        max_ticks:      Some(seconds),
        progress_every: 600,
    };
    info!(seconds, start = %start, out = %out.display(), "backfill started");
    let began = Instant::now();
    let handle = Runner::new(&registry, runner_config)
        .sensor_types(&types)
        .start(&BackfillSinks { out })?;
    finish(handle).await?;
    info!(elapsed_ms = began.elapsed().as_millis() as u64, "backfill complete");
    Ok(())
}

/// Join every Driver off the async runtime and log the summaries.
async fn finish(handle: RunnerHandle) -> Result<()> {
    let results = tokio::task::spawn_blocking(move || handle.join()).await?;
    let mut failed = 0;
    for result in results {
        match result {
            Ok(DriverSummary { sensor_type, ticks, measurements, flushes, failed_flushes }) => info!(
                %sensor_type,
                ticks,
                measurements,
                flushes,
                failed_flushes,
                "driver finished"
            ),
            Err(e) => {
                error!(error = %e, "driver failed");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} driver(s) did not shut down cleanly");
    }
    Ok(())
}
