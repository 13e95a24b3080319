// ABOUTME: End-to-end tests of the copy engine against in-memory databases
// ABOUTME: Covers resume, checkpoint monotonicity, batching, failures and notifications

use anyhow::{bail, Result};
use async_trait::async_trait;
use mysql_pg_migrator::checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore};
use mysql_pg_migrator::copier::{BatchCopier, CopyOptions};
use mysql_pg_migrator::destination::DestinationDatabase;
use mysql_pg_migrator::notify::Notifier;
use mysql_pg_migrator::orchestrator::{Migrator, COMPLETION_MESSAGE};
use mysql_pg_migrator::progress::{ProgressObserver, SilentProgress, TableProgress};
use mysql_pg_migrator::schema::{
    ColumnDescriptor, CreateTableStatement, DestinationTypeCategory, TableDescriptor,
};
use mysql_pg_migrator::source::{Row, SourceDatabase, SqlValue};
use mysql_pg_migrator::MigrationError;
use std::collections::BTreeMap;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

struct FakeTable {
    descriptor: TableDescriptor,
    rows: u64,
    /// Pretend rows past this offset were deleted after the count was taken
    visible_rows: Option<u64>,
}

/// Generates rows on demand: row `i`, column `c` is `"<c>#<i>"`, except a
/// leading `id` column which holds `i`.
#[derive(Default)]
struct FakeSource {
    tables: Vec<FakeTable>,
    fail_describe: Option<String>,
    fail_count: Option<String>,
    fetches: Vec<(String, u64, u64)>,
    counts: Vec<String>,
}

impl FakeSource {
    fn with_table(mut self, descriptor: TableDescriptor, rows: u64) -> Self {
        self.tables.push(FakeTable {
            descriptor,
            rows,
            visible_rows: None,
        });
        self
    }

    fn table(&self, name: &str) -> Result<&FakeTable> {
        match self.tables.iter().find(|t| t.descriptor.name == name) {
            Some(t) => Ok(t),
            None => bail!("Table '{}' doesn't exist", name),
        }
    }

    fn fetches_for(&self, name: &str) -> Vec<(u64, u64)> {
        self.fetches
            .iter()
            .filter(|(t, _, _)| t == name)
            .map(|(_, o, l)| (*o, *l))
            .collect()
    }
}

fn cell(column: &str, row: u64) -> SqlValue {
    if column == "id" {
        SqlValue::UInt(row)
    } else {
        SqlValue::text(format!("{}#{}", column, row))
    }
}

#[async_trait]
impl SourceDatabase for FakeSource {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        Ok(self
            .tables
            .iter()
            .map(|t| t.descriptor.name.clone())
            .collect())
    }

    async fn describe_table(&mut self, table: &str) -> Result<TableDescriptor> {
        if self.fail_describe.as_deref() == Some(table) {
            bail!("DESCRIBE {} failed", table);
        }
        Ok(self.table(table)?.descriptor.clone())
    }

    async fn count_rows(&mut self, table: &str) -> Result<u64> {
        self.counts.push(table.to_string());
        if self.fail_count.as_deref() == Some(table) {
            bail!("Lock wait timeout exceeded");
        }
        Ok(self.table(table)?.rows)
    }

    async fn fetch_window(
        &mut self,
        table: &TableDescriptor,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Row>> {
        self.fetches.push((table.name.clone(), offset, limit));
        let fake = self.table(&table.name)?;
        let end = (offset + limit).min(fake.visible_rows.unwrap_or(fake.rows));
        Ok((offset..end)
            .map(|i| table.column_names().map(|c| cell(c, i)).collect())
            .collect())
    }
}

#[derive(Default)]
struct FakeDestination {
    created: Vec<CreateTableStatement>,
    tables: BTreeMap<String, Vec<Row>>,
    batch_sizes: Vec<(String, usize)>,
    fail_insert_on: Option<String>,
    fail_create_on: Option<String>,
}

impl FakeDestination {
    fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn batches_for(&self, table: &str) -> Vec<usize> {
        self.batch_sizes
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, n)| *n)
            .collect()
    }
}

#[async_trait]
impl DestinationDatabase for FakeDestination {
    async fn create_table(&mut self, statement: &CreateTableStatement) -> Result<()> {
        if self.fail_create_on.as_deref() == Some(statement.table.as_str()) {
            bail!("permission denied for schema public");
        }
        if !self.created.iter().any(|s| s.table == statement.table) {
            self.created.push(statement.clone());
        }
        self.tables.entry(statement.table.clone()).or_default();
        Ok(())
    }

    async fn insert_batch(&mut self, table: &TableDescriptor, rows: &[Row]) -> Result<u64> {
        if self.fail_insert_on.as_deref() == Some(table.name.as_str()) {
            bail!("value too long for type character varying");
        }
        let Some(stored) = self.tables.get_mut(&table.name) else {
            bail!("relation \"{}\" does not exist", table.name);
        };
        stored.extend(rows.iter().cloned());
        self.batch_sizes.push((table.name.clone(), rows.len()));
        Ok(rows.len() as u64)
    }
}

#[derive(Default)]
struct MemoryStore {
    initial: Checkpoint,
    saves: Mutex<Vec<Checkpoint>>,
}

impl MemoryStore {
    fn with_initial(initial: Checkpoint) -> Self {
        Self {
            initial,
            saves: Mutex::new(Vec::new()),
        }
    }

    fn saves(&self) -> Vec<Checkpoint> {
        self.saves.lock().unwrap().clone()
    }

    fn offsets_for(&self, table: &str) -> Vec<u64> {
        self.saves()
            .iter()
            .filter(|c| c.contains(table))
            .map(|c| c.offset(table))
            .collect()
    }
}

impl CheckpointStore for MemoryStore {
    fn load(&self) -> Result<Checkpoint> {
        Ok(self
            .saves
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| self.initial.clone()))
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.saves.lock().unwrap().push(checkpoint.clone());
        Ok(())
    }
}

/// Accepts nothing: every save fails as a full disk would
#[derive(Default)]
struct FailingSaveStore {
    attempts: Mutex<u32>,
}

impl CheckpointStore for FailingSaveStore {
    fn load(&self) -> Result<Checkpoint> {
        Ok(Checkpoint::new())
    }

    fn save(&self, _checkpoint: &Checkpoint) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;
        bail!("No space left on device")
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            bail!("webhook returned 500 Internal Server Error");
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<(String, u64, u64)>>,
}

impl ProgressObserver for RecordingProgress {
    fn batch_committed(&self, progress: TableProgress<'_>) {
        self.events.lock().unwrap().push((
            progress.table.to_string(),
            progress.committed,
            progress.total,
        ));
    }
}

fn simple_table(name: &str) -> TableDescriptor {
    TableDescriptor::new(
        name,
        vec![
            ColumnDescriptor::new("id", "int(11)", false).with_primary_key(),
            ColumnDescriptor::new("name", "varchar(255)", true),
        ],
    )
}

async fn copy_one(
    source: &mut FakeSource,
    destination: &mut FakeDestination,
    store: &MemoryStore,
    checkpoint: &mut Checkpoint,
    table: &TableDescriptor,
    start: u64,
    batch_size: u64,
) -> Result<u64, MigrationError> {
    destination
        .create_table(&CreateTableStatement::from_descriptor(table))
        .await
        .unwrap();
    BatchCopier::new(
        source,
        destination,
        store,
        checkpoint,
        &SilentProgress,
        CopyOptions::new(batch_size),
    )
    .copy(table, start)
    .await
}

// ---------------------------------------------------------------------------
// Batch copier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_batch_completeness_250k_rows_in_three_windows() {
    let table = simple_table("events");
    let mut source = FakeSource::default().with_table(table.clone(), 250_000);
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let mut checkpoint = Checkpoint::new();

    let next = copy_one(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &table,
        0,
        100_000,
    )
    .await
    .unwrap();

    assert_eq!(next, 250_000);
    assert_eq!(destination.batches_for("events"), vec![100_000, 100_000, 50_000]);
    assert_eq!(store.offsets_for("events"), vec![100_000, 200_000, 250_000]);
    assert_eq!(
        source.fetches_for("events"),
        vec![(0, 100_000), (100_000, 100_000), (200_000, 50_000)]
    );
    assert_eq!(destination.rows("events").len(), 250_000);
}

#[tokio::test]
async fn test_resume_from_completed_checkpoint_writes_nothing() {
    let table = simple_table("users");
    let mut source = FakeSource::default().with_table(table.clone(), 1_234);
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let mut checkpoint = Checkpoint::new();

    let first = copy_one(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &table,
        0,
        500,
    )
    .await
    .unwrap();
    assert_eq!(first, 1_234);
    let inserts_after_first = destination.batch_sizes.len();
    let saves_after_first = store.saves().len();

    // Second run starts from what was persisted
    let mut reloaded = store.load().unwrap();
    let start = reloaded.offset("users");
    let second = copy_one(
        &mut source,
        &mut destination,
        &store,
        &mut reloaded,
        &table,
        start,
        500,
    )
    .await
    .unwrap();

    assert_eq!(second, 1_234);
    assert_eq!(destination.batch_sizes.len(), inserts_after_first);
    assert_eq!(store.saves().len(), saves_after_first);
    assert_eq!(destination.rows("users").len(), 1_234);
}

#[tokio::test]
async fn test_resume_mid_table_continues_from_offset() {
    let table = simple_table("orders");
    let mut source = FakeSource::default().with_table(table.clone(), 250);
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let mut checkpoint = Checkpoint::new();
    checkpoint.advance("orders", 150).unwrap();

    let next = copy_one(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &table,
        150,
        100,
    )
    .await
    .unwrap();

    assert_eq!(next, 250);
    assert_eq!(source.fetches_for("orders"), vec![(150, 100)]);
    let rows = destination.rows("orders");
    assert_eq!(rows.len(), 100);
    assert_eq!(rows[0][0], SqlValue::UInt(150));
    assert_eq!(rows[99][0], SqlValue::UInt(249));
}

#[tokio::test]
async fn test_empty_table_makes_no_calls() {
    let table = simple_table("empty_table");
    let mut source = FakeSource::default().with_table(table.clone(), 0);
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let mut checkpoint = Checkpoint::new();

    let next = copy_one(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &table,
        0,
        100,
    )
    .await
    .unwrap();

    assert_eq!(next, 0);
    assert!(source.fetches.is_empty());
    assert!(destination.batch_sizes.is_empty());
    assert!(store.saves().is_empty());
    assert_eq!(checkpoint.offset("empty_table"), 0);
}

#[tokio::test]
async fn test_checkpoint_is_monotonic_and_bounded() {
    for (rows, batch) in [(1u64, 1u64), (10, 3), (99, 10), (100, 100), (101, 100), (7, 50)] {
        let table = simple_table("t");
        let mut source = FakeSource::default().with_table(table.clone(), rows);
        let mut destination = FakeDestination::default();
        let store = MemoryStore::default();
        let mut checkpoint = Checkpoint::new();

        copy_one(
            &mut source,
            &mut destination,
            &store,
            &mut checkpoint,
            &table,
            0,
            batch,
        )
        .await
        .unwrap();

        let offsets = store.offsets_for("t");
        assert!(
            offsets.windows(2).all(|w| w[0] < w[1]),
            "offsets must increase: {:?}",
            offsets
        );
        assert!(offsets.iter().all(|o| *o <= rows));
        assert_eq!(offsets.last().copied(), Some(rows));
        assert_eq!(destination.rows("t").len() as u64, rows);
    }
}

#[tokio::test]
async fn test_empty_window_ends_table_early() {
    let table = simple_table("shrinking");
    let mut source = FakeSource::default();
    source.tables.push(FakeTable {
        descriptor: table.clone(),
        rows: 300,
        visible_rows: Some(120),
    });
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let mut checkpoint = Checkpoint::new();

    let next = copy_one(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &table,
        0,
        100,
    )
    .await
    .unwrap();

    // 100 + 20 rows, then an empty window at offset 120
    assert_eq!(next, 120);
    assert_eq!(destination.batches_for("shrinking"), vec![100, 20]);
    assert_eq!(store.offsets_for("shrinking"), vec![100, 120]);
    assert_eq!(source.fetches_for("shrinking").len(), 3);
}

#[tokio::test]
async fn test_column_order_fidelity() {
    let table = TableDescriptor::new(
        "wide",
        vec![
            ColumnDescriptor::new("zeta", "text", true),
            ColumnDescriptor::new("id", "int", false),
            ColumnDescriptor::new("alpha", "datetime", true),
            ColumnDescriptor::new("mid", "decimal(10,2)", true),
        ],
    );
    let mut source = FakeSource::default().with_table(table.clone(), 5);
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let mut checkpoint = Checkpoint::new();

    copy_one(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &table,
        0,
        2,
    )
    .await
    .unwrap();

    let created = &destination.created[0];
    let created_names: Vec<_> = created.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(created_names, vec!["zeta", "id", "alpha", "mid"]);

    for (i, row) in destination.rows("wide").iter().enumerate() {
        let i = i as u64;
        assert_eq!(
            row,
            &vec![
                SqlValue::text(format!("zeta#{}", i)),
                SqlValue::UInt(i),
                SqlValue::text(format!("alpha#{}", i)),
                SqlValue::text(format!("mid#{}", i)),
            ]
        );
    }
}

#[tokio::test]
async fn test_progress_reported_after_each_commit() {
    let table = simple_table("p");
    let mut source = FakeSource::default().with_table(table.clone(), 25);
    let mut destination = FakeDestination::default();
    destination
        .create_table(&CreateTableStatement::from_descriptor(&table))
        .await
        .unwrap();
    let store = MemoryStore::default();
    let mut checkpoint = Checkpoint::new();
    let progress = RecordingProgress::default();

    BatchCopier::new(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &progress,
        CopyOptions::new(10),
    )
    .copy(&table, 0)
    .await
    .unwrap();

    let events = progress.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            ("p".to_string(), 10, 25),
            ("p".to_string(), 20, 25),
            ("p".to_string(), 25, 25),
        ]
    );
}

#[tokio::test]
async fn test_checkpoint_save_failure_stops_after_one_committed_window() {
    let table = simple_table("audit");
    let mut source = FakeSource::default().with_table(table.clone(), 35);
    let mut destination = FakeDestination::default();
    destination
        .create_table(&CreateTableStatement::from_descriptor(&table))
        .await
        .unwrap();
    let store = FailingSaveStore::default();
    let mut checkpoint = Checkpoint::new();

    let err = BatchCopier::new(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &SilentProgress,
        CopyOptions::new(10),
    )
    .copy(&table, 0)
    .await
    .unwrap_err();

    assert!(matches!(err, MigrationError::Checkpoint(_)));
    assert_eq!(err.stage(), "checkpoint");
    // The window was committed before the save was attempted
    assert_eq!(destination.batches_for("audit"), vec![10]);
    assert_eq!(source.fetches_for("audit"), vec![(0, 10)]);
    assert_eq!(*store.attempts.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_count_failure_is_introspection_error() {
    let table = simple_table("locked");
    let mut source = FakeSource::default().with_table(table.clone(), 10);
    source.fail_count = Some("locked".into());
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let mut checkpoint = Checkpoint::new();

    let err = copy_one(
        &mut source,
        &mut destination,
        &store,
        &mut checkpoint,
        &table,
        0,
        5,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        &err,
        MigrationError::SchemaIntrospection { table: Some(t), .. } if t == "locked"
    ));
    assert!(source.fetches.is_empty());
    assert!(store.saves().is_empty());
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

fn three_tables() -> FakeSource {
    FakeSource::default()
        .with_table(simple_table("t1"), 30)
        .with_table(simple_table("t2"), 30)
        .with_table(simple_table("t3"), 30)
}

#[tokio::test]
async fn test_full_run_copies_every_table_and_notifies_once() {
    let mut source = three_tables();
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let summary = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(20),
    )
    .run(Checkpoint::new())
    .await
    .unwrap();

    assert_eq!(summary.tables.len(), 3);
    assert_eq!(summary.rows_copied(), 90);
    assert_eq!(notifier.messages(), vec![COMPLETION_MESSAGE.to_string()]);

    let created: Vec<_> = destination.created.iter().map(|c| c.table.as_str()).collect();
    assert_eq!(created, vec!["t1", "t2", "t3"]);

    let last = store.load().unwrap();
    for table in ["t1", "t2", "t3"] {
        assert_eq!(last.offset(table), 30);
        assert_eq!(destination.rows(table).len(), 30);
    }
}

#[tokio::test]
async fn test_write_failure_on_second_table_halts_run() {
    let mut source = three_tables();
    let mut destination = FakeDestination {
        fail_insert_on: Some("t2".into()),
        ..Default::default()
    };
    let mut initial = Checkpoint::new();
    initial.advance("t3", 7).unwrap();
    let store = MemoryStore::with_initial(initial.clone());
    let notifier = RecordingNotifier::default();

    let err = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(20),
    )
    .run(initial)
    .await
    .unwrap_err();

    assert!(matches!(
        &err,
        MigrationError::BatchWrite { table, offset: 0, .. } if table == "t2"
    ));
    assert_eq!(err.table(), Some("t2"));

    let persisted = store.load().unwrap();
    assert_eq!(persisted.offset("t1"), 30);
    assert!(!persisted.contains("t2"));
    assert_eq!(persisted.offset("t3"), 7);

    assert!(notifier.messages().is_empty());
    assert!(destination.rows("t3").is_empty());
    assert!(!source.counts.contains(&"t3".to_string()));
}

#[tokio::test]
async fn test_create_failure_halts_run_and_keeps_prior_tables() {
    let mut source = three_tables();
    let mut destination = FakeDestination {
        fail_create_on: Some("t2".into()),
        ..Default::default()
    };
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let err = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(100),
    )
    .run(Checkpoint::new())
    .await
    .unwrap_err();

    assert!(matches!(&err, MigrationError::SchemaCreation { table, .. } if table == "t2"));
    assert_eq!(store.load().unwrap().offset("t1"), 30);
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_describe_failure_is_introspection_error() {
    let mut source = three_tables();
    source.fail_describe = Some("t1".into());
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let err = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(100),
    )
    .run(Checkpoint::new())
    .await
    .unwrap_err();

    assert!(matches!(
        &err,
        MigrationError::SchemaIntrospection { table: Some(t), .. } if t == "t1"
    ));
    assert!(destination.created.is_empty());
    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn test_checkpoint_save_failure_halts_run_without_notification() {
    let mut source = three_tables();
    let mut destination = FakeDestination::default();
    let store = FailingSaveStore::default();
    let notifier = RecordingNotifier::default();

    let err = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(20),
    )
    .run(Checkpoint::new())
    .await
    .unwrap_err();

    assert!(matches!(err, MigrationError::Checkpoint(_)));
    assert_eq!(destination.batches_for("t1"), vec![20]);
    assert_eq!(source.fetches.len(), 1);
    assert!(destination.rows("t2").is_empty());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_run() {
    let mut source = FakeSource::default().with_table(simple_table("only"), 3);
    let mut destination = FakeDestination::default();
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::failing();

    let summary = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(100),
    )
    .run(Checkpoint::new())
    .await
    .unwrap();

    assert_eq!(summary.rows_copied(), 3);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_rerun_after_failure_resumes_and_completes() {
    let mut source = three_tables();
    let mut destination = FakeDestination {
        fail_insert_on: Some("t2".into()),
        ..Default::default()
    };
    let store = MemoryStore::default();
    let notifier = RecordingNotifier::default();

    let first = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(20),
    )
    .run(Checkpoint::new())
    .await;
    assert!(first.is_err());

    destination.fail_insert_on = None;
    let summary = Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(20),
    )
    .run(store.load().unwrap())
    .await
    .unwrap();

    let copied: Vec<_> = summary
        .tables
        .iter()
        .map(|t| (t.name.as_str(), t.rows_copied))
        .collect();
    assert_eq!(copied, vec![("t1", 0), ("t2", 30), ("t3", 30)]);
    assert_eq!(destination.rows("t1").len(), 30);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_file_checkpoint_store_drives_resume() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCheckpointStore::new(dir.path().join("migration_checkpoint.json"));

    let mut source = FakeSource::default().with_table(simple_table("users"), 45);
    let mut destination = FakeDestination::default();
    let notifier = RecordingNotifier::default();

    Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(20),
    )
    .run(store.load().unwrap())
    .await
    .unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json, serde_json::json!({"users": 45}));

    let fetches_before = source.fetches.len();
    Migrator::new(
        &mut source,
        &mut destination,
        &store,
        &notifier,
        &SilentProgress,
        CopyOptions::new(20),
    )
    .run(store.load().unwrap())
    .await
    .unwrap();
    assert_eq!(source.fetches.len(), fetches_before);
    assert_eq!(destination.rows("users").len(), 45);
}

// ---------------------------------------------------------------------------
// Schema translation
// ---------------------------------------------------------------------------

#[test]
fn test_type_mapping_is_case_insensitive() {
    let tags = ["int(11)", "varchar(255)", "datetime", "double", "decimal(10,2)", "blob"];
    let expected = [
        DestinationTypeCategory::Integer,
        DestinationTypeCategory::Text,
        DestinationTypeCategory::Timestamp,
        DestinationTypeCategory::Float,
        DestinationTypeCategory::Numeric,
        DestinationTypeCategory::TextFallback,
    ];

    for (tag, category) in tags.iter().zip(expected) {
        assert_eq!(DestinationTypeCategory::from_source_type(tag), category);
        assert_eq!(
            DestinationTypeCategory::from_source_type(&tag.to_uppercase()),
            category
        );
    }
}
