//! Logging configuration and initialization
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init`] or [`init_with_config`] once at startup.

use anyhow::{Context, Result};
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const JSON_LOGS_ENV: &str = "REST_CONNECTOR_JSON_LOGS";

/// Initialize logging from `RUST_LOG` and `REST_CONNECTOR_JSON_LOGS`
pub fn init() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let json_logs = std::env::var(JSON_LOGS_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    init_with_config(&log_level, json_logs)
}

/// Install a global subscriber. Fails if one is already installed.
pub fn init_with_config(log_level: &str, json_logs: bool) -> Result<()> {
    let env_filter = EnvFilter::from_str(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
            .context("failed to install JSON log subscriber")?;
    } else {
        registry
            .with(fmt::layer().pretty().with_target(true).with_level(true))
            .try_init()
            .context("failed to install log subscriber")?;
    }

    tracing::info!(log_level = %log_level, json_logs, "Logging initialized");
    Ok(())
}
