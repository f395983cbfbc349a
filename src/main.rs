//! Airflow Health Monitor Binary

use airflow_monitor::store::DEFAULT_STATUS_FILE;
use airflow_monitor::{HealthMonitor, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = "Alerts a Discord webhook when Airflow components go down or recover")]
struct Args {
    /// JSON configuration file
    #[arg(long, env = "MONITOR_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Status snapshot carried across restarts
    #[arg(long, env = "MONITOR_STATUS_FILE", default_value = DEFAULT_STATUS_FILE)]
    status_file: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    initialize_tracing();

    info!("Starting Airflow health monitor v{}", env!("CARGO_PKG_VERSION"));

    let monitor = match HealthMonitor::bootstrap(&args.config, &args.status_file).await {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = monitor.run().await {
        error!("Monitor failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
