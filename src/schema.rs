// ABOUTME: Schema translation from MySQL column definitions to PostgreSQL DDL
// ABOUTME: Maps source type tags to coarse destination categories, first match wins

use crate::destination::DestinationDatabase;
use crate::utils::{quote_pg_ident, sanitize_identifier};
use anyhow::{Context, Result};
use std::fmt;

/// One source column as reported by schema introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Raw source-engine type name, e.g. `int(11)` or `varchar(255)`
    pub source_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, source_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            nullable,
            primary_key: false,
        }
    }

    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn category(&self) -> DestinationTypeCategory {
        DestinationTypeCategory::from_source_type(&self.source_type)
    }
}

/// A source table and its columns in ordinal order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Primary-key columns in source order, used to order windowed reads
    ///
    /// Empty when the table has no primary key.
    pub fn ordering_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Coarse destination type chosen for a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationTypeCategory {
    Integer,
    Text,
    Timestamp,
    Float,
    Numeric,
    TextFallback,
}

/// Ordered mapping rules; the first rule with any matching pattern wins.
/// Anything unmatched maps to [`DestinationTypeCategory::TextFallback`].
pub const TYPE_RULES: &[(&[&str], DestinationTypeCategory)] = &[
    (&["int"], DestinationTypeCategory::Integer),
    (&["varchar", "text"], DestinationTypeCategory::Text),
    (&["datetime"], DestinationTypeCategory::Timestamp),
    (&["float", "double"], DestinationTypeCategory::Float),
    (&["decimal"], DestinationTypeCategory::Numeric),
];

impl DestinationTypeCategory {
    /// Classify a raw source type tag, ignoring case
    pub fn from_source_type(source_type: &str) -> Self {
        let lower = source_type.to_lowercase();
        TYPE_RULES
            .iter()
            .find(|(patterns, _)| patterns.iter().any(|p| lower.contains(p)))
            .map(|(_, category)| *category)
            .unwrap_or(DestinationTypeCategory::TextFallback)
    }

    /// PostgreSQL type name used in the generated DDL
    pub fn pg_type(self) -> &'static str {
        match self {
            DestinationTypeCategory::Integer => "INTEGER",
            DestinationTypeCategory::Text => "TEXT",
            DestinationTypeCategory::Timestamp => "TIMESTAMP",
            DestinationTypeCategory::Float => "DOUBLE PRECISION",
            DestinationTypeCategory::Numeric => "NUMERIC",
            DestinationTypeCategory::TextFallback => "TEXT",
        }
    }
}

/// A destination column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub category: DestinationTypeCategory,
    pub not_null: bool,
}

/// Structured `CREATE TABLE IF NOT EXISTS` instruction for the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    pub table: String,
    pub columns: Vec<ColumnDefinition>,
}

impl CreateTableStatement {
    /// Translate a source table, preserving column order exactly
    pub fn from_descriptor(table: &TableDescriptor) -> Self {
        let columns = table
            .columns
            .iter()
            .map(|column| ColumnDefinition {
                name: column.name.clone(),
                category: column.category(),
                not_null: !column.nullable,
            })
            .collect();

        Self {
            table: table.name.clone(),
            columns,
        }
    }

    pub fn to_sql(&self) -> String {
        let definitions: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut definition = format!(
                    "{} {}",
                    quote_pg_ident(&column.name),
                    column.category.pg_type()
                );
                if column.not_null {
                    definition.push_str(" NOT NULL");
                }
                definition
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_pg_ident(&self.table),
            definitions.join(", ")
        )
    }
}

impl fmt::Display for CreateTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Create the destination table for `table` unless it already exists
///
/// The statement is executed and committed before this returns; running it
/// again for the same table is a no-op.
pub async fn ensure_table<D>(destination: &mut D, table: &TableDescriptor) -> Result<()>
where
    D: DestinationDatabase + ?Sized,
{
    let statement = CreateTableStatement::from_descriptor(table);
    tracing::debug!("{}", statement);

    destination
        .create_table(&statement)
        .await
        .with_context(|| {
            format!(
                "Failed to create table '{}' at the destination",
                sanitize_identifier(&table.name)
            )
        })?;

    tracing::info!(
        "Table '{}' created or already exists in PostgreSQL",
        sanitize_identifier(&table.name)
    );

    Ok(())
}
