// ABOUTME: Read-side collaborator seam for the copy engine
// ABOUTME: Defines engine-neutral cell values and the SourceDatabase trait

use crate::schema::TableDescriptor;
use anyhow::Result;
use async_trait::async_trait;

/// A single cell as read from the source engine
///
/// Mirrors the shapes the MySQL binary protocol produces so values pass
/// through to the destination without reinterpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    /// Strings, DECIMALs and binary data all arrive as raw bytes
    Bytes(Vec<u8>),
    Date {
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        micros: u32,
    },
    Time {
        negative: bool,
        days: u32,
        hours: u8,
        minutes: u8,
        seconds: u8,
        micros: u32,
    },
}

impl SqlValue {
    /// Convenience constructor for textual values
    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Bytes(value.into().into_bytes())
    }
}

/// One row, with values in the table's column order
pub type Row = Vec<SqlValue>;

/// Relational read interface the copy engine needs from the source
#[async_trait]
pub trait SourceDatabase: Send {
    /// All base tables, in the order they should be migrated
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Column definitions of one table, in ordinal order
    async fn describe_table(&mut self, table: &str) -> Result<TableDescriptor>;

    async fn count_rows(&mut self, table: &str) -> Result<u64>;

    /// Up to `limit` rows starting at `offset`
    ///
    /// Implementations order by [`TableDescriptor::ordering_key`] when it is
    /// non-empty so that windows are stable across connections.
    async fn fetch_window(
        &mut self,
        table: &TableDescriptor,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Row>>;
}
