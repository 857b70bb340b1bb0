//! Trigger server - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Trigger server for conditional BUY/SELL orders
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TRIGGER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    trig_telemetry::init_logging(None)?;

    info!("Starting trigger server v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > TRIGGER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("TRIGGER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = trig_server::AppConfig::load(&config_path)?;
    info!(
        listen = %config.server.listen_addr(),
        quote = ?config.quote.kind,
        ledger = %config.ledger.addr,
        "Configuration loaded"
    );

    let app = trig_server::Application::new(config)?;
    let stats = app.run().await?;

    info!(
        delivered = stats.delivered,
        failed = stats.failed,
        dropped = stats.dropped,
        "Trigger server exited"
    );
    Ok(())
}
