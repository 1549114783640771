//! # educert-api: Binary Entry Point
//!
//! Reads configuration from the environment, initializes the ledger with
//! the default schema, and serves the API.

use educert_api::state::{AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(config = ?config, "configuration loaded");

    let port = config.port;
    let state = AppState::try_with_config(config).map_err(|e| {
        tracing::error!("ledger initialization failed: {e}");
        e
    })?;
    let app = educert_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("EduCert API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
