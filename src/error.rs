// ABOUTME: Stage-tagged error kinds for a migration run
// ABOUTME: Every fatal failure surfaces as one MigrationError variant

use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which side of the copy a connection error concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Destination,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => f.write_str("MySQL source"),
            Endpoint::Destination => f.write_str("PostgreSQL destination"),
        }
    }
}

/// Fatal errors that halt a migration run
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required settings missing or malformed.
    #[error("invalid configuration")]
    Config(#[source] Source),

    /// A database could not be reached or refused the login.
    #[error("failed to connect to {endpoint}")]
    Connection {
        endpoint: Endpoint,
        #[source]
        source: Source,
    },

    /// Listing tables or describing a table failed.
    #[error("failed to introspect source schema{}", table_suffix(.table))]
    SchemaIntrospection {
        table: Option<String>,
        #[source]
        source: Source,
    },

    #[error("failed to create destination table '{table}'")]
    SchemaCreation {
        table: String,
        #[source]
        source: Source,
    },

    #[error("failed to fetch rows of '{table}' at offset {offset}")]
    BatchFetch {
        table: String,
        offset: u64,
        #[source]
        source: Source,
    },

    #[error("failed to write rows of '{table}' at offset {offset}")]
    BatchWrite {
        table: String,
        offset: u64,
        #[source]
        source: Source,
    },

    /// Loading or persisting the checkpoint failed.
    #[error("checkpoint error")]
    Checkpoint(#[source] Source),
}

fn table_suffix(table: &Option<String>) -> String {
    match table {
        Some(t) => format!(" of table '{}'", t),
        None => String::new(),
    }
}

impl MigrationError {
    pub fn config(err: anyhow::Error) -> Self {
        MigrationError::Config(err.into())
    }

    pub fn connection(endpoint: Endpoint, err: anyhow::Error) -> Self {
        MigrationError::Connection {
            endpoint,
            source: err.into(),
        }
    }

    pub fn introspection(table: Option<&str>, err: anyhow::Error) -> Self {
        MigrationError::SchemaIntrospection {
            table: table.map(str::to_string),
            source: err.into(),
        }
    }

    pub fn creation(table: &str, err: anyhow::Error) -> Self {
        MigrationError::SchemaCreation {
            table: table.to_string(),
            source: err.into(),
        }
    }

    pub fn fetch(table: &str, offset: u64, err: anyhow::Error) -> Self {
        MigrationError::BatchFetch {
            table: table.to_string(),
            offset,
            source: err.into(),
        }
    }

    pub fn write(table: &str, offset: u64, err: anyhow::Error) -> Self {
        MigrationError::BatchWrite {
            table: table.to_string(),
            offset,
            source: err.into(),
        }
    }

    pub fn checkpoint(err: anyhow::Error) -> Self {
        MigrationError::Checkpoint(err.into())
    }

    /// Short name of the run stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            MigrationError::Config(_) => "init",
            MigrationError::Connection { .. } => "connect",
            MigrationError::SchemaIntrospection { .. } => "introspect",
            MigrationError::SchemaCreation { .. } => "create",
            MigrationError::BatchFetch { .. } | MigrationError::BatchWrite { .. } => "copy",
            MigrationError::Checkpoint(_) => "checkpoint",
        }
    }

    /// This error and all of its causes joined with `: `
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }

    /// Table the failure happened on, if it is table-scoped
    pub fn table(&self) -> Option<&str> {
        match self {
            MigrationError::SchemaIntrospection { table, .. } => table.as_deref(),
            MigrationError::SchemaCreation { table, .. }
            | MigrationError::BatchFetch { table, .. }
            | MigrationError::BatchWrite { table, .. } => Some(table),
            _ => None,
        }
    }
}
