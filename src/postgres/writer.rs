// ABOUTME: Write migrated rows and table definitions to PostgreSQL
// ABOUTME: Each call runs in its own transaction and is committed before returning

use crate::config::ConnectionSettings;
use crate::destination::DestinationDatabase;
use crate::postgres::connection::{self, PgConnection};
use crate::postgres::literal::row_literal;
use crate::schema::{CreateTableStatement, TableDescriptor};
use crate::source::Row;
use crate::utils::{quote_pg_ident, sanitize_identifier};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;

/// Build one multi-row INSERT for `rows`, naming columns in descriptor order
///
/// Values are rendered as literals, so the statement has no bind
/// parameters and is not subject to PostgreSQL's parameter limit.
pub fn build_insert_sql(table: &TableDescriptor, rows: &[Row]) -> Result<String> {
    let width = table.columns.len();
    let columns: Vec<String> = table.column_names().map(quote_pg_ident).collect();

    let mut values = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != width {
            bail!(
                "Row {} of batch has {} value(s), expected {} for table '{}'",
                idx,
                row.len(),
                width,
                sanitize_identifier(&table.name)
            );
        }
        values.push(row_literal(&table.columns, row));
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_pg_ident(&table.name),
        columns.join(", "),
        values.join(", ")
    ))
}

/// PostgreSQL destination over a single client connection
pub struct PostgresDestination {
    conn: PgConnection,
}

impl PostgresDestination {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// Connect (with retry) using `settings`
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        Ok(Self::new(connection::connect_with_retry(settings).await?))
    }

    /// Drop the client and wait for the socket task to finish
    pub async fn close(self) -> Result<()> {
        let PgConnection { client, driver } = self.conn;
        drop(client);
        driver
            .await
            .context("PostgreSQL connection task did not shut down cleanly")
    }
}

#[async_trait]
impl DestinationDatabase for PostgresDestination {
    async fn create_table(&mut self, statement: &CreateTableStatement) -> Result<()> {
        let sql = statement.to_sql();
        let tx = self
            .conn
            .client
            .transaction()
            .await
            .context("Failed to begin transaction")?;

        tx.batch_execute(&sql)
            .await
            .with_context(|| format!("Failed to execute: {}", sql))?;

        tx.commit()
            .await
            .context("Failed to commit table creation")?;

        Ok(())
    }

    async fn insert_batch(&mut self, table: &TableDescriptor, rows: &[Row]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = build_insert_sql(table, rows)?;

        let tx = self
            .conn
            .client
            .transaction()
            .await
            .context("Failed to begin transaction")?;

        tx.batch_execute(&sql).await.with_context(|| {
            format!(
                "Failed to insert {} rows into '{}'",
                rows.len(),
                sanitize_identifier(&table.name)
            )
        })?;

        tx.commit().await.with_context(|| {
            format!(
                "Failed to commit {} rows into '{}'",
                rows.len(),
                sanitize_identifier(&table.name)
            )
        })?;

        tracing::debug!(
            "Inserted {} rows into '{}'",
            rows.len(),
            sanitize_identifier(&table.name)
        );

        Ok(rows.len() as u64)
    }
}
