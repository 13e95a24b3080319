// ABOUTME: Checkpointed batch copy of one table from source to destination
// ABOUTME: Pages through rows from the resume offset, committing then checkpointing each window

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::MigrationConfig;
use crate::destination::DestinationDatabase;
use crate::error::MigrationError;
use crate::progress::{ProgressObserver, TableProgress};
use crate::schema::TableDescriptor;
use crate::source::{Row, SourceDatabase};
use crate::utils::{sanitize_identifier, RetryPolicy};
use anyhow::anyhow;

/// Tuning knobs for the copy loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// Maximum rows per window
    pub batch_size: u64,
    /// Retries for window reads; writes are never retried
    pub fetch_retry: RetryPolicy,
}

impl CopyOptions {
    pub fn new(batch_size: u64) -> Self {
        Self {
            batch_size,
            fetch_retry: RetryPolicy::none(),
        }
    }

    pub fn with_fetch_retry(mut self, policy: RetryPolicy) -> Self {
        self.fetch_retry = policy;
        self
    }
}

impl From<&MigrationConfig> for CopyOptions {
    fn from(config: &MigrationConfig) -> Self {
        Self::new(config.batch_size).with_fetch_retry(config.fetch_retry)
    }
}

/// Copies tables window by window, persisting the checkpoint after every commit
///
/// The destination commit always precedes the checkpoint save, so a crash
/// between the two re-delivers at most one window on the next run.
pub struct BatchCopier<'a, S: ?Sized, D: ?Sized> {
    source: &'a mut S,
    destination: &'a mut D,
    store: &'a dyn CheckpointStore,
    checkpoint: &'a mut Checkpoint,
    progress: &'a dyn ProgressObserver,
    options: CopyOptions,
}

impl<'a, S, D> BatchCopier<'a, S, D>
where
    S: SourceDatabase + ?Sized,
    D: DestinationDatabase + ?Sized,
{
    pub fn new(
        source: &'a mut S,
        destination: &'a mut D,
        store: &'a dyn CheckpointStore,
        checkpoint: &'a mut Checkpoint,
        progress: &'a dyn ProgressObserver,
        options: CopyOptions,
    ) -> Self {
        Self {
            source,
            destination,
            store,
            checkpoint,
            progress,
            options,
        }
    }

    /// Copy the rows of `table` from `start_offset` onwards; returns the next offset
    ///
    /// The row count is snapshotted once up front. Rows added at the source
    /// after that are not copied, and an empty window ends the table early.
    pub async fn copy(
        &mut self,
        table: &TableDescriptor,
        start_offset: u64,
    ) -> Result<u64, MigrationError> {
        let name = table.name.as_str();
        let table_label = sanitize_identifier(name);

        let total_rows = self
            .source
            .count_rows(name)
            .await
            .map_err(|e| MigrationError::introspection(Some(name), e))?;

        self.progress.table_started(&table_label, start_offset, total_rows);

        if start_offset > total_rows {
            tracing::warn!(
                "Checkpoint for '{}' ({}) is past the current row count ({}); nothing to copy",
                table_label,
                start_offset,
                total_rows
            );
        }

        let mut offset = start_offset;
        while offset < total_rows {
            let limit = self.options.batch_size.min(total_rows - offset);
            let rows = self.fetch_window(table, offset, limit).await?;

            if rows.is_empty() {
                tracing::warn!(
                    "Source returned no rows for '{}' at offset {} of {}; treating table as complete",
                    table_label,
                    offset,
                    total_rows
                );
                break;
            }

            let fetched = rows.len() as u64;
            if fetched > limit {
                return Err(MigrationError::fetch(
                    name,
                    offset,
                    anyhow!("Source returned {} rows for a window of {}", fetched, limit),
                ));
            }

            self.destination
                .insert_batch(table, &rows)
                .await
                .map_err(|e| MigrationError::write(name, offset, e))?;

            offset += fetched;

            self.checkpoint
                .advance(name, offset)
                .map_err(MigrationError::checkpoint)?;
            self.store
                .save(self.checkpoint)
                .map_err(MigrationError::checkpoint)?;

            self.progress.batch_committed(TableProgress {
                table: &table_label,
                committed: offset,
                total: total_rows,
            });
        }

        self.progress.table_finished(TableProgress {
            table: &table_label,
            committed: offset,
            total: total_rows,
        });

        Ok(offset)
    }

    async fn fetch_window(
        &mut self,
        table: &TableDescriptor,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Row>, MigrationError> {
        let policy = self.options.fetch_retry;
        let mut attempt = 0;

        loop {
            match self.source.fetch_window(table, offset, limit).await {
                Ok(rows) => return Ok(rows),
                Err(e) if attempt < policy.max_retries => {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        "Fetching '{}' at offset {} failed (attempt {}/{}), retrying in {:?}: {:#}",
                        sanitize_identifier(&table.name),
                        offset,
                        attempt + 1,
                        policy.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(MigrationError::fetch(&table.name, offset, e)),
            }
        }
    }
}
