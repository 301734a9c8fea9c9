//! Fordon Server — Application entry point.

use fordon_authz::{CatalogService, default_catalog};
use fordon_core::error::FordonResult;
use fordon_db::repository::SurrealResourceRepository;
use fordon_db::{DbConfig, DbManager, run_migrations};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("fordon=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Fordon server...");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Fordon server failed");
        std::process::exit(1);
    }

    tracing::info!("Fordon server stopped.");
}

async fn run() -> FordonResult<()> {
    let config = DbConfig::from_env();
    let manager = DbManager::connect(&config)
        .await
        .map_err(|e| fordon_core::error::FordonError::Database(e.to_string()))?;

    run_migrations(manager.client()).await?;

    let catalog = CatalogService::new(SurrealResourceRepository::new(manager.client().clone()));
    let seeded = catalog.ensure_seeded(&default_catalog()).await?;
    tracing::info!(resources = seeded.len(), "Catalog ready");

    // TODO: Start REST API server

    Ok(())
}
