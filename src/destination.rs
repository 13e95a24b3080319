// ABOUTME: Write-side collaborator seam for the copy engine
// ABOUTME: Defines the DestinationDatabase trait used by translator and copier

use crate::schema::{CreateTableStatement, TableDescriptor};
use crate::source::Row;
use anyhow::Result;
use async_trait::async_trait;

/// Relational write interface the copy engine needs from the destination
///
/// Every call is its own committed unit of work: when a method returns `Ok`
/// its effect is durable at the destination.
#[async_trait]
pub trait DestinationDatabase: Send {
    /// Execute and commit a create-if-missing statement
    async fn create_table(&mut self, statement: &CreateTableStatement) -> Result<()>;

    /// Insert `rows` positionally into `table` in a single statement and commit
    ///
    /// Returns the number of rows written.
    async fn insert_batch(&mut self, table: &TableDescriptor, rows: &[Row]) -> Result<u64>;
}
