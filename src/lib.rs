pub mod config;
pub mod derive;
pub mod history;
pub mod panels;
pub mod scheduler;
pub mod sources;
pub mod state;
pub mod types;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::DashboardConfig;
use crate::panels::TracingRenderer;
use crate::scheduler::RefreshScheduler;

/// Initialize structured logging with tracing.
/// Respects RUST_LOG env var; defaults to `info` level for this crate.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("statusboard_lib=info,statusboard=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load config, render placeholders, refresh once, then keep refreshing on
/// the configured interval until ctrl-c.
pub async fn run() -> Result<(), String> {
    init_tracing();

    let config = DashboardConfig::from_env().map_err(|e| e.to_string())?;
    let adapters = sources::build_adapters(&config)?;
    info!(
        sources = adapters.len(),
        interval = config.refresh_interval.label(),
        "Starting status dashboard"
    );

    let scheduler = RefreshScheduler::new(
        adapters,
        Arc::new(TracingRenderer),
        config.packages.clone(),
    );
    scheduler.render_all();
    drop(scheduler.trigger_now());
    scheduler.start(config.refresh_interval.seconds());

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for ctrl-c: {}", e))?;
    info!("Shutting down");
    scheduler.stop();
    Ok(())
}
