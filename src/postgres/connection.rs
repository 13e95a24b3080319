// ABOUTME: PostgreSQL connection utilities for the destination database
// ABOUTME: Handles TLS setup, error explanation, retry and connection lifecycle

use crate::config::ConnectionSettings;
use crate::utils::{retry_with_backoff, RetryPolicy};
use anyhow::{Context, Result};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::Client;

/// A live client plus the background task driving its socket
pub struct PgConnection {
    pub client: Client,
    pub driver: JoinHandle<()>,
}

/// Turn a raw driver error into an actionable message
///
/// ```
/// # use mysql_pg_migrator::postgres::connection::explain_connect_error;
/// let msg = explain_connect_error("password authentication failed for user \"x\"");
/// assert!(msg.to_string().starts_with("Authentication failed"));
/// ```
pub fn explain_connect_error(error_msg: &str) -> anyhow::Error {
    if error_msg.contains("password authentication failed") {
        anyhow::anyhow!(
            "Authentication failed: Invalid username or password.\n\
             Please verify your database credentials."
        )
    } else if error_msg.contains("database") && error_msg.contains("does not exist") {
        anyhow::anyhow!(
            "Database does not exist: {}\n\
             Please create the database first or check POSTGRES_DATABASE.",
            error_msg
        )
    } else if error_msg.contains("Connection refused") || error_msg.contains("could not connect")
    {
        anyhow::anyhow!(
            "Connection refused: Unable to reach database server.\n\
             Please check:\n\
             - The host and port are correct\n\
             - The database server is running\n\
             - Firewall rules allow connections\n\
             Error: {}",
            error_msg
        )
    } else if error_msg.contains("timeout") || error_msg.contains("timed out") {
        anyhow::anyhow!(
            "Connection timeout: Database server did not respond in time.\n\
             This could indicate network issues or server overload.\n\
             Error: {}",
            error_msg
        )
    } else if error_msg.contains("SSL") || error_msg.contains("TLS") {
        anyhow::anyhow!(
            "TLS/SSL error: Failed to establish secure connection.\n\
             Please verify SSL/TLS configuration.\n\
             Error: {}",
            error_msg
        )
    } else if error_msg.contains("no pg_hba.conf entry") {
        anyhow::anyhow!(
            "Access denied: No pg_hba.conf entry for host.\n\
             The database server is not configured to accept connections from your host.\n\
             Contact your database administrator to update pg_hba.conf.\n\
             Error: {}",
            error_msg
        )
    } else {
        anyhow::anyhow!("Failed to connect to database: {}", error_msg)
    }
}

/// Connect to PostgreSQL database with TLS support
///
/// TLS is negotiated when the server offers it and skipped otherwise (the
/// driver's default `prefer` mode). The socket is driven by a spawned task
/// whose handle is returned so callers can wait for it on shutdown.
///
/// # Errors
///
/// This function will return an error if:
/// - Authentication fails (invalid username or password)
/// - The database does not exist
/// - The database server is unreachable
/// - TLS negotiation fails
/// - Connection times out
/// - pg_hba.conf does not allow the connection
pub async fn connect(settings: &ConnectionSettings) -> Result<PgConnection> {
    tracing::info!(
        "Connecting to PostgreSQL at {}:{}/{}",
        settings.host,
        settings.port,
        settings.database
    );

    let tls_connector = TlsConnector::builder()
        .danger_accept_invalid_certs(false)
        .build()
        .context("Failed to build TLS connector")?;
    let tls = MakeTlsConnector::new(tls_connector);

    let (client, connection) = settings
        .postgres_config()
        .connect(tls)
        .await
        .map_err(|e| explain_connect_error(&e.to_string()))?;

    let driver = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("PostgreSQL connection error: {}", e);
        }
    });

    tracing::debug!("Successfully connected to PostgreSQL");

    Ok(PgConnection { client, driver })
}

/// Connect to PostgreSQL with automatic retry for transient failures
///
/// Attempts to connect up to 3 times with exponential backoff (1s, 2s, 4s).
pub async fn connect_with_retry(settings: &ConnectionSettings) -> Result<PgConnection> {
    retry_with_backoff(
        || connect(settings),
        RetryPolicy::new(3, Duration::from_secs(1)),
    )
    .await
    .context("Failed to connect to PostgreSQL after retries")
}
