// ABOUTME: Drives a whole migration run: connect, per-table create and copy, notify
// ABOUTME: Any stage failure halts the run; connections are released on every exit path

use crate::checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore};
use crate::config::MigrationConfig;
use crate::copier::{BatchCopier, CopyOptions};
use crate::destination::DestinationDatabase;
use crate::error::{Endpoint, MigrationError};
use crate::mysql::MySqlSource;
use crate::notify::{self, Notifier};
use crate::postgres::PostgresDestination;
use crate::progress::{ConsoleProgress, ProgressObserver};
use crate::schema;
use crate::source::SourceDatabase;
use crate::utils::sanitize_identifier;

pub const COMPLETION_MESSAGE: &str = "Data migration complete!";

/// Outcome of one table within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub name: String,
    /// Rows committed during this run
    pub rows_copied: u64,
    /// Checkpointed offset after this run
    pub offset: u64,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub tables: Vec<TableSummary>,
}

impl MigrationSummary {
    pub fn rows_copied(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_copied).sum()
    }
}

/// Migrates every source table in listing order
///
/// Owns the checkpoint for the duration of [`Migrator::run`]; the copier is
/// the only code that advances it, and only after a destination commit.
pub struct Migrator<'a, S: ?Sized, D: ?Sized> {
    source: &'a mut S,
    destination: &'a mut D,
    store: &'a dyn CheckpointStore,
    notifier: &'a dyn Notifier,
    progress: &'a dyn ProgressObserver,
    options: CopyOptions,
}

impl<'a, S, D> Migrator<'a, S, D>
where
    S: SourceDatabase + ?Sized,
    D: DestinationDatabase + ?Sized,
{
    pub fn new(
        source: &'a mut S,
        destination: &'a mut D,
        store: &'a dyn CheckpointStore,
        notifier: &'a dyn Notifier,
        progress: &'a dyn ProgressObserver,
        options: CopyOptions,
    ) -> Self {
        Self {
            source,
            destination,
            store,
            notifier,
            progress,
            options,
        }
    }

    /// Enumerate, create and copy every table, then send the completion notice
    ///
    /// Tables finished before a failure keep their committed rows and
    /// checkpoints. No notification is sent unless every table completes.
    pub async fn run(self, checkpoint: Checkpoint) -> Result<MigrationSummary, MigrationError> {
        let notifier = self.notifier;
        let summary = self.migrate_all(checkpoint).await?;

        tracing::info!(
            "Migration complete! {} table(s), {} row(s) copied this run",
            summary.tables.len(),
            summary.rows_copied()
        );
        notify::notify_best_effort(notifier, COMPLETION_MESSAGE).await;

        Ok(summary)
    }

    async fn migrate_all(
        self,
        mut checkpoint: Checkpoint,
    ) -> Result<MigrationSummary, MigrationError> {
        let Migrator {
            source,
            destination,
            store,
            progress,
            options,
            ..
        } = self;

        let tables = source
            .list_tables()
            .await
            .map_err(|e| MigrationError::introspection(None, e))?;

        let mut summary = MigrationSummary::default();

        for table_name in tables {
            tracing::info!("Migrating table: {}", sanitize_identifier(&table_name));

            let descriptor = source
                .describe_table(&table_name)
                .await
                .map_err(|e| MigrationError::introspection(Some(&table_name), e))?;

            schema::ensure_table(&mut *destination, &descriptor)
                .await
                .map_err(|e| MigrationError::creation(&table_name, e))?;

            let start_offset = checkpoint.offset(&table_name);
            let offset = BatchCopier::new(
                &mut *source,
                &mut *destination,
                store,
                &mut checkpoint,
                progress,
                options,
            )
            .copy(&descriptor, start_offset)
            .await?;

            summary.tables.push(TableSummary {
                name: table_name,
                rows_copied: offset.saturating_sub(start_offset),
                offset,
            });
        }

        Ok(summary)
    }
}

/// Run a full migration as configured
///
/// Loads the checkpoint, opens both connections, migrates, and closes both
/// connections again whatever the outcome.
pub async fn run(config: &MigrationConfig) -> Result<MigrationSummary, MigrationError> {
    let store = FileCheckpointStore::new(&config.checkpoint_file);
    let checkpoint = store.load().map_err(MigrationError::checkpoint)?;
    for (table, offset) in checkpoint.iter() {
        tracing::debug!("Resume point: '{}' at row {}", sanitize_identifier(table), offset);
    }
    let notifier =
        notify::from_url(config.webhook_url.as_deref()).map_err(MigrationError::config)?;

    let mut source = MySqlSource::connect(&config.source)
        .await
        .map_err(|e| MigrationError::connection(Endpoint::Source, e))?;

    let mut destination = match PostgresDestination::connect(&config.destination).await {
        Ok(destination) => destination,
        Err(e) => {
            release_source(source).await;
            return Err(MigrationError::connection(Endpoint::Destination, e));
        }
    };

    let progress = ConsoleProgress::new();
    let outcome = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &*notifier,
        &progress,
        CopyOptions::from(config),
    )
    .run(checkpoint)
    .await;

    release_source(source).await;
    release_destination(destination).await;

    if let Err(e) = &outcome {
        tracing::error!("Migration halted during {} stage: {}", e.stage(), e.chain());
    }

    outcome
}

async fn release_source(source: MySqlSource) {
    if let Err(e) = source.close().await {
        tracing::warn!("{:#}", e);
    }
}

async fn release_destination(destination: PostgresDestination) {
    if let Err(e) = destination.close().await {
        tracing::warn!("{:#}", e);
    }
}
