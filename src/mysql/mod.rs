// ABOUTME: MySQL source access for the copy engine
// ABOUTME: Connection setup plus the SourceDatabase implementation over mysql_async

pub mod converter;
pub mod reader;

pub use reader::MySqlSource;

use crate::config::ConnectionSettings;
use crate::utils::{retry_with_backoff, RetryPolicy};
use anyhow::{Context, Result};
use mysql_async::prelude::*;
use mysql_async::Conn;
use std::time::Duration;

/// Connect to MySQL database
///
/// Opens a single connection and verifies connectivity by executing a
/// trivial query, so that authentication problems surface here rather than
/// on the first real statement.
///
/// # Errors
///
/// Returns error if:
/// - The server is unreachable
/// - Authentication fails
/// - The database does not exist
pub async fn connect_mysql(settings: &ConnectionSettings) -> Result<Conn> {
    tracing::info!(
        "Connecting to MySQL at {}:{}/{}",
        settings.host,
        settings.port,
        settings.database
    );

    let mut conn = Conn::new(settings.mysql_opts())
        .await
        .with_context(|| {
            format!(
                "Failed to connect to MySQL at {}:{} as '{}'",
                settings.host, settings.port, settings.user
            )
        })?;

    conn.query_drop("SELECT 1")
        .await
        .context("MySQL connection check failed")?;

    tracing::debug!("Successfully connected to MySQL");

    Ok(conn)
}

/// Connect to MySQL with automatic retry for transient failures
///
/// Attempts to connect up to 3 times with exponential backoff (1s, 2s, 4s).
pub async fn connect_mysql_with_retry(settings: &ConnectionSettings) -> Result<Conn> {
    retry_with_backoff(
        || connect_mysql(settings),
        RetryPolicy::new(3, Duration::from_secs(1)),
    )
    .await
    .context("Failed to connect to MySQL after retries")
}
