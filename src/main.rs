//! # Nova Import Main Entry Point
//!
//! This is the main entry point for the Nova Import service.

use migration::MigratorTrait;
use nova_import::{config::ConfigLoader, db::init_pool, server::run_server, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    telemetry::init_tracing(&config)?;

    tracing::info!("Loaded configuration for profile: {}", config.profile);
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!("Configuration: {}", redacted_json);
    }

    let db = init_pool(&config).await?;
    migration::Migrator::up(&db, None).await?;

    run_server(config, db).await
}
