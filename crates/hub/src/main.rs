mod clock;
mod config;
mod device;
mod service;
mod store;
mod web;

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use clock::Clock;
use device::FileStateStore;
use service::Service;
use store::CsvLog;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ──────────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::load_or_default(&config_path)?;

    // ── Stores ──────────────────────────────────────────────────────
    let log = CsvLog::open(&cfg.storage.data_file, cfg.storage.motion_column)
        .with_context(|| format!("failed to open readings log: {}", cfg.storage.data_file))?;
    let state = FileStateStore::new(&cfg.storage.state_file);

    let clock = Clock::with_offset_minutes(cfg.clock.utc_offset_minutes)?;

    tracing::info!(
        data_file = %cfg.storage.data_file,
        state_file = %cfg.storage.state_file,
        utc_offset_minutes = cfg.clock.utc_offset_minutes,
        "telemetry hub starting"
    );

    // ── Web server ──────────────────────────────────────────────────
    let service = Arc::new(Service::new(clock, Box::new(log), Box::new(state)));
    web::serve(service, cfg.server.listen_port).await
}
