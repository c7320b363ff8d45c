//! Main Entrypoint for the Weird Traffic Game Client
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Loading the persisted session snapshot.
//! 4. Building the HTTP backend client and the game session.
//! 5. Handing control to the interactive terminal app.

use anyhow::Context;
use std::sync::Arc;
use traffic_core::backend::HttpGameBackend;
use traffic_game::{app::App, config::Config, snapshot::SnapshotStore};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing game session...");

    // --- 3. Build Shared Services ---
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let backend = Arc::new(HttpGameBackend::new(client, config.backend_base_url.clone()));
    let snapshots = SnapshotStore::new(config.snapshot_path.clone());

    // --- 4. Run the App ---
    let app = App::new(backend, snapshots);
    info!(backend = %config.backend_base_url, "Session ready.");
    app.run().await?;

    info!("Game client has shut down.");
    Ok(())
}
