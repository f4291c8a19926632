//! Probe binary

use anyhow::Context;
use probe::{Config, ProbeEngine};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional single argument: the configuration file
    let path = std::env::args_os().nth(1).map(PathBuf::from);

    // Can't use tracing yet - not initialized
    let config = Config::load(path.as_deref()).context("failed to load configuration")?;

    let level = config.logging.level.as_deref().unwrap_or("info");
    match config.logging.format.as_deref() {
        Some("json") => common::logging::init_json(level),
        _ => common::logging::init(level),
    }

    tracing::info!(
        probe = %config.probe_name,
        port = %config.port,
        notifications = config.notifications_enabled(),
        "Probe configuration loaded"
    );

    let engine = Arc::new(ProbeEngine::from_config(&config).context("failed to build probe engine")?);

    engine
        .run_until(tokio::signal::ctrl_c())
        .await
        .context("probe stopped abnormally")?;

    Ok(())
}
