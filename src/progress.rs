// ABOUTME: Progress reporting for per-table copies
// ABOUTME: Emits log lines and drives an indicatif bar after each committed batch

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Rows committed so far for one table, against its row-count snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableProgress<'a> {
    pub table: &'a str,
    pub committed: u64,
    pub total: u64,
}

/// Receives copy progress events
///
/// All methods default to doing nothing.
pub trait ProgressObserver: Send + Sync {
    fn table_started(&self, _table: &str, _start_offset: u64, _total: u64) {}

    fn batch_committed(&self, _progress: TableProgress<'_>) {}

    fn table_finished(&self, _progress: TableProgress<'_>) {}
}

/// Discards all events
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {}

/// Logs each batch and shows a bar on interactive terminals
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        // A poisoned lock only affects the cosmetic bar
        if let Ok(mut guard) = self.bar.lock() {
            f(&mut guard);
        }
    }
}

impl ProgressObserver for ConsoleProgress {
    fn table_started(&self, table: &str, start_offset: u64, total: u64) {
        tracing::info!("Total rows to migrate: {}", total);
        if start_offset > 0 {
            tracing::info!(
                "Resuming '{}' from checkpoint at row {}",
                table,
                start_offset
            );
        }

        self.with_bar(|slot| {
            let bar = ProgressBar::new(total);
            if let Ok(style) =
                ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} rows ({eta})")
            {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.set_message(table.to_string());
            bar.set_position(start_offset.min(total));
            *slot = Some(bar);
        });
    }

    fn batch_committed(&self, progress: TableProgress<'_>) {
        tracing::info!("Migrated {}/{} rows", progress.committed, progress.total);
        self.with_bar(|slot| {
            if let Some(bar) = slot {
                bar.set_position(progress.committed);
            }
        });
    }

    fn table_finished(&self, progress: TableProgress<'_>) {
        self.with_bar(|slot| {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        });
        tracing::info!(
            "Finished table '{}' ({}/{} rows)",
            progress.table,
            progress.committed,
            progress.total
        );
    }
}
