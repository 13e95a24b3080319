// ABOUTME: Persistent per-table offset tracking for resumable copies
// ABOUTME: Loads the whole map at start and atomically rewrites it after each batch

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHECKPOINT_FILE: &str = "migration_checkpoint.json";

/// Next row offset per table
///
/// The offset is the number of rows of that table already committed to the
/// destination. Serialized as a flat JSON object `{"table": offset}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint {
    offsets: BTreeMap<String, u64>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume point for `table`, 0 if never copied
    pub fn offset(&self, table: &str) -> u64 {
        self.offsets.get(table).copied().unwrap_or(0)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.offsets.contains_key(table)
    }

    /// Record that `table` has `offset` rows committed
    ///
    /// Offsets never move backwards; an attempt to do so is an error.
    pub fn advance(&mut self, table: &str, offset: u64) -> Result<()> {
        let current = self.offset(table);
        if offset < current {
            bail!(
                "Refusing to move checkpoint for '{}' backwards ({} -> {})",
                table,
                current,
                offset
            );
        }
        self.offsets.insert(table.to_string(), offset);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.offsets.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Durable home of a [`Checkpoint`]
pub trait CheckpointStore: Send + Sync {
    /// Read the prior state, or an empty checkpoint if there is none
    fn load(&self) -> Result<Checkpoint>;

    /// Overwrite the prior state with `checkpoint`
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
}

/// JSON file checkpoint with crash-safe replacement
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Checkpoint> {
        let path = &self.path;
        if !path.exists() {
            tracing::info!("No checkpoint at {}, starting fresh", path.display());
            return Ok(Checkpoint::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read checkpoint at {}", path.display()))?;
        let checkpoint: Checkpoint = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse checkpoint JSON at {}", path.display()))?;

        tracing::info!(
            "Loaded checkpoint for {} table(s) from {}",
            checkpoint.len(),
            path.display()
        );

        Ok(checkpoint)
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let path = &self.path;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create checkpoint directory {}", parent.display())
        })?;

        // Write beside the target and rename over it so readers never see a partial file
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp checkpoint in {}", parent.display()))?;

        serde_json::to_writer(tmp.as_file_mut(), checkpoint)
            .with_context(|| format!("Failed to serialize checkpoint at {}", path.display()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to flush checkpoint at {}", path.display()))?;

        tmp.persist(path)
            .with_context(|| format!("Failed to persist checkpoint at {}", path.display()))?;

        Ok(())
    }
}
