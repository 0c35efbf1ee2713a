mod config;

use anyhow::Context;
use clap::Parser;
use config::AppConfig;
use range_api::{AppState, create_app};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the ev-range server
#[derive(Parser, Debug)]
#[command(name = "ev-range")]
#[command(about = "EV range calculator and charging station finder")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Port to bind the server to
    #[arg(short, long, default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_content = tokio::fs::read_to_string(&args.config)
        .await
        .with_context(|| format!("Failed to read config file '{}'", args.config.display()))?;

    let config: AppConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file '{}'", args.config.display()))?;

    tracing::info!(
        "Loaded config from {}: {} local station(s), {} network station(s)",
        args.config.display(),
        config.verified_stations.len(),
        config.network_stations.len()
    );

    let geocoder = config
        .geocoder
        .build()
        .context("Failed to set up the geocoder")?;

    let app_state = AppState::new(
        geocoder,
        config.station_directory(),
        config.network_directory(),
        config.search,
    );
    let app = create_app(app_state);

    let bind_addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
