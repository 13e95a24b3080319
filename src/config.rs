// ABOUTME: Migration settings read once from the process environment
// ABOUTME: Validates connection parameters up front and builds driver configs

use crate::checkpoint::DEFAULT_CHECKPOINT_FILE;
use crate::utils::RetryPolicy;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: u64 = 100_000;
pub const DEFAULT_FETCH_RETRIES: u32 = 3;

/// Host, port and credentials for one database
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

// Keep passwords out of logs
impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionSettings {
    fn from_lookup<F>(prefix: &str, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_key = format!("{}_PORT", prefix);
        let port_raw = required(lookup, &port_key)?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("{} must be a port number, got '{}'", port_key, port_raw))?;

        Ok(Self {
            host: required(lookup, &format!("{}_HOST", prefix))?,
            port,
            user: required(lookup, &format!("{}_USER", prefix))?,
            // An empty password is valid for trust/socket auth setups
            password: lookup(&format!("{}_PASSWORD", prefix)).unwrap_or_default(),
            database: required(lookup, &format!("{}_DATABASE", prefix))?,
        })
    }

    /// Driver options for a MySQL connection
    pub fn mysql_opts(&self) -> mysql_async::Opts {
        mysql_async::OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.clone()))
            .db_name(Some(self.database.clone()))
            .init(vec!["SET NAMES utf8mb4"])
            .into()
    }

    /// Driver config for a PostgreSQL connection, pinned to the public schema
    pub fn postgres_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(self.password.as_bytes())
            .dbname(&self.database)
            .options("-c search_path=public")
            .keepalives(true)
            .keepalives_idle(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30));
        config
    }
}

/// Everything a run needs, constructed once at startup
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source: ConnectionSettings,
    pub destination: ConnectionSettings,
    pub batch_size: u64,
    pub webhook_url: Option<String>,
    pub checkpoint_file: PathBuf,
    pub fetch_retry: RetryPolicy,
}

impl MigrationConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value
    ///
    /// Required keys: `MYSQL_{HOST,PORT,USER,DATABASE}` and
    /// `POSTGRES_{HOST,PORT,USER,DATABASE}`. Optional: `*_PASSWORD`,
    /// `BATCH_SIZE`, `DISCORD_WEBHOOK_URL`, `CHECKPOINT_FILE`, `FETCH_RETRIES`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = ConnectionSettings::from_lookup("MYSQL", &lookup)
            .context("Invalid MySQL source settings")?;
        let destination = ConnectionSettings::from_lookup("POSTGRES", &lookup)
            .context("Invalid PostgreSQL destination settings")?;

        let batch_size = match non_empty(&lookup, "BATCH_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("BATCH_SIZE must be a positive integer, got '{}'", raw))?,
            None => DEFAULT_BATCH_SIZE,
        };
        if batch_size == 0 {
            bail!("BATCH_SIZE must be greater than zero");
        }

        let fetch_retries = match non_empty(&lookup, "FETCH_RETRIES") {
            Some(raw) => raw.trim().parse::<u32>().with_context(|| {
                format!("FETCH_RETRIES must be a non-negative integer, got '{}'", raw)
            })?,
            None => DEFAULT_FETCH_RETRIES,
        };

        let webhook_url = non_empty(&lookup, "DISCORD_WEBHOOK_URL");
        if let Some(url) = &webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("DISCORD_WEBHOOK_URL must be an http(s) URL");
            }
        }

        let checkpoint_file = non_empty(&lookup, "CHECKPOINT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKPOINT_FILE));

        Ok(Self {
            source,
            destination,
            batch_size,
            webhook_url,
            checkpoint_file,
            fetch_retry: RetryPolicy::new(fetch_retries, Duration::from_secs(1)),
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(value) => Ok(value),
        None => bail!("Missing required environment variable {}", key),
    }
}
