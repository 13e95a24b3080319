// ABOUTME: Utility functions for retries, identifier quoting and log sanitising
// ABOUTME: Shared by the MySQL reader, PostgreSQL writer and batch copier

use anyhow::Result;
use std::time::Duration;

/// Bounded exponential backoff settings
///
/// `max_retries = 0` means the operation is attempted exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// No retries at all
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay to wait before retry number `attempt` (0-based), doubling each time
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Retry a function with exponential backoff
///
/// Executes an async operation with automatic retry on failure. Each retry doubles
/// the delay (exponential backoff) to handle transient failures gracefully.
///
/// # Arguments
///
/// * `operation` - Async function to retry (FnMut returning Future\<Output = Result\<T\>\>)
/// * `policy` - How many times to retry and how long to wait before the first retry
///
/// # Returns
///
/// Returns the successful result or the last error after all retries exhausted.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use std::time::Duration;
/// # use mysql_pg_migrator::utils::{retry_with_backoff, RetryPolicy};
/// # async fn example() -> Result<()> {
/// let result = retry_with_backoff(
///     || async { Ok("success") },
///     RetryPolicy::new(3, Duration::from_secs(1)),
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T>(mut operation: F, policy: RetryPolicy) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt < policy.max_retries {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        "Operation failed (attempt {}/{}), retrying in {:?}: {:#}",
                        attempt + 1,
                        policy.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Operation failed after retries")))
}

/// Quote an identifier for PostgreSQL
///
/// Wraps the name in double quotes and doubles any embedded double quote, so
/// reserved words and mixed-case names survive untouched.
///
/// ```
/// # use mysql_pg_migrator::utils::quote_pg_ident;
/// assert_eq!(quote_pg_ident("users"), "\"users\"");
/// assert_eq!(quote_pg_ident("we\"ird"), "\"we\"\"ird\"");
/// ```
pub fn quote_pg_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Quote an identifier for MySQL using backticks
///
/// ```
/// # use mysql_pg_migrator::utils::quote_mysql_ident;
/// assert_eq!(quote_mysql_ident("order"), "`order`");
/// assert_eq!(quote_mysql_ident("a`b"), "`a``b`");
/// ```
pub fn quote_mysql_ident(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Sanitize an identifier (table name, column name, etc.) for display
///
/// Removes control characters and limits length to prevent log injection attacks
/// and ensure readable error messages.
///
/// **Note**: This is for display purposes only. SQL safety comes from
/// [`quote_pg_ident`] and [`quote_mysql_ident`].
///
/// ```
/// # use mysql_pg_migrator::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
