//! NEXUS Server — Application entry point.

use nexus_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nexus=info".parse().unwrap()))
        .json()
        .init();

    tracing::info!("Starting NEXUS server...");

    let config = DbConfig::from_env();
    let _manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "database bootstrap failed");
            std::process::exit(1);
        }
    };

    // TODO: Wire the HTTP API once the REST surface is specified.

    tracing::info!("NEXUS server stopped.");
}
