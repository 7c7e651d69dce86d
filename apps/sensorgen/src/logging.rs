//! Tracing subscriber setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "SENSORGEN_LOG";

/// Console log formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Pick the filter: `SENSORGEN_LOG`, then `RUST_LOG`, then the configured
/// directive, then `info`.
fn filter(config: &LoggingConfig) -> EnvFilter {
    let fallback = || {
        let directive = config.filter.as_deref().unwrap_or("info");
        EnvFilter::try_new(directive).unwrap_or_else(|err| {
            eprintln!("invalid log filter {directive:?} ({err}); defaulting to info");
            EnvFilter::new("info")
        })
    };
    match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); ignoring it");
            fallback()
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
    }
}

/// Install the global subscriber.  Driver thread names are included so each
/// line shows which sensor type produced it.  Fails if a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .with_target(false)
            .with_thread_names(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .json()
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter(config))
        .with(fmt_layer)
        .try_init()
        .context("installing the global tracing subscriber")?;

    info!(format = ?config.format, "tracing initialised");
    Ok(())
}
