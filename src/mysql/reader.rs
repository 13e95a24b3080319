// ABOUTME: MySQL database introspection and windowed row reading
// ABOUTME: Implements SourceDatabase with INFORMATION_SCHEMA and LIMIT/OFFSET pages

use crate::config::ConnectionSettings;
use crate::mysql::converter::{column_from_information_schema, mysql_row_to_values};
use crate::schema::TableDescriptor;
use crate::source::{Row, SourceDatabase};
use crate::utils::{quote_mysql_ident, sanitize_identifier};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use mysql_async::{prelude::*, Conn};

/// Read-only view of one MySQL database
pub struct MySqlSource {
    conn: Conn,
    db_name: String,
}

impl MySqlSource {
    pub fn new(conn: Conn, db_name: impl Into<String>) -> Self {
        Self {
            conn,
            db_name: db_name.into(),
        }
    }

    /// Connect (with retry) to the database named in `settings`
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let conn = super::connect_mysql_with_retry(settings).await?;
        Ok(Self::new(conn, settings.database.clone()))
    }

    /// Close the connection gracefully
    pub async fn close(self) -> Result<()> {
        self.conn
            .disconnect()
            .await
            .context("Failed to disconnect from MySQL")
    }

    fn qualified(&self, table: &str) -> String {
        format!(
            "{}.{}",
            quote_mysql_ident(&self.db_name),
            quote_mysql_ident(table)
        )
    }
}

/// Build the SELECT for one window, listing columns explicitly so the
/// result order always matches the descriptor.
pub fn window_query(db_name: &str, table: &TableDescriptor) -> String {
    let columns: Vec<String> = table.column_names().map(quote_mysql_ident).collect();
    let mut query = format!(
        "SELECT {} FROM {}.{}",
        columns.join(", "),
        quote_mysql_ident(db_name),
        quote_mysql_ident(&table.name)
    );

    let key = table.ordering_key();
    if !key.is_empty() {
        let order: Vec<String> = key.into_iter().map(quote_mysql_ident).collect();
        query.push_str(" ORDER BY ");
        query.push_str(&order.join(", "));
    }

    query.push_str(" LIMIT ? OFFSET ?");
    query
}

#[async_trait]
impl SourceDatabase for MySqlSource {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        tracing::info!("Listing tables from MySQL database '{}'", self.db_name);

        let query = r#"
            SELECT TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ?
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let tables: Vec<String> = self
            .conn
            .exec(query, (self.db_name.as_str(),))
            .await
            .with_context(|| format!("Failed to list tables from database '{}'", self.db_name))?;

        tracing::info!(
            "Found {} table(s) in database '{}'",
            tables.len(),
            self.db_name
        );

        Ok(tables)
    }

    async fn describe_table(&mut self, table: &str) -> Result<TableDescriptor> {
        let query = r#"
            SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_KEY
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ?
            AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<(String, String, String, String)> = self
            .conn
            .exec(query, (self.db_name.as_str(), table))
            .await
            .with_context(|| {
                format!(
                    "Failed to describe table '{}.{}'",
                    self.db_name,
                    sanitize_identifier(table)
                )
            })?;

        if rows.is_empty() {
            bail!(
                "Table '{}.{}' has no columns",
                self.db_name,
                sanitize_identifier(table)
            );
        }

        let columns = rows
            .into_iter()
            .map(|(name, column_type, is_nullable, column_key)| {
                column_from_information_schema(name, column_type, &is_nullable, &column_key)
            })
            .collect();

        let descriptor = TableDescriptor::new(table, columns);
        if descriptor.ordering_key().is_empty() {
            tracing::warn!(
                "Table '{}' has no primary key; windows follow scan order and may shift if the table changes",
                sanitize_identifier(table)
            );
        }

        Ok(descriptor)
    }

    async fn count_rows(&mut self, table: &str) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", self.qualified(table));

        let count: Option<u64> = self
            .conn
            .query_first(query.as_str())
            .await
            .with_context(|| {
                format!(
                    "Failed to count rows in table '{}'",
                    sanitize_identifier(table)
                )
            })?;

        let count = count.unwrap_or(0);
        tracing::debug!("Table '{}' has {} rows", sanitize_identifier(table), count);

        Ok(count)
    }

    async fn fetch_window(
        &mut self,
        table: &TableDescriptor,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Row>> {
        let query = window_query(&self.db_name, table);

        let rows: Vec<mysql_async::Row> = self
            .conn
            .exec(query.as_str(), (limit, offset))
            .await
            .with_context(|| {
                format!(
                    "Failed to read rows {}..{} from table '{}'",
                    offset,
                    offset + limit,
                    sanitize_identifier(&table.name)
                )
            })?;

        rows.iter()
            .map(|row| mysql_row_to_values(row, table.columns.len()))
            .collect::<Result<Vec<_>>>()
            .with_context(|| {
                format!(
                    "Failed to decode rows from table '{}'",
                    sanitize_identifier(&table.name)
                )
            })
    }
}
