// ABOUTME: Library module for mysql-pg-migrator
// ABOUTME: Exports the resumable copy engine for use in the binary and tests

pub mod checkpoint;
pub mod config;
pub mod copier;
pub mod destination;
pub mod error;
pub mod mysql;
pub mod notify;
pub mod orchestrator;
pub mod postgres;
pub mod progress;
pub mod schema;
pub mod source;
pub mod utils;

pub use checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore};
pub use config::MigrationConfig;
pub use copier::{BatchCopier, CopyOptions};
pub use error::MigrationError;
pub use orchestrator::{MigrationSummary, Migrator};
