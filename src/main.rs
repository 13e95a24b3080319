// ABOUTME: Entry point for mysql-pg-migrator
// ABOUTME: Reads configuration from the environment and runs one resumable migration

use mysql_pg_migrator::{orchestrator, MigrationConfig, MigrationError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = MigrationConfig::from_env().map_err(MigrationError::config)?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let summary = orchestrator::run(&config).await?;
    tracing::info!(
        "Copied {} row(s) across {} table(s)",
        summary.rows_copied(),
        summary.tables.len()
    );

    Ok(())
}
