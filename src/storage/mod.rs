//! Storage module for persisting discovery state
//!
//! This module handles all persistence for the engine, including:
//! - SQLite database initialization and schema management
//! - Run tracking with final totals
//! - Detected schema persistence
//! - Trained model blobs keyed by name

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Storage key of the serialized link classifier model
pub const CLASSIFIER_MODEL_KEY: &str = "classifier.model";

/// Storage key of the serialized prioritizer model
pub const PRIORITIZER_MODEL_KEY: &str = "prioritizer.model";

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a discovery run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub totals: RunTotals,
}

/// Final counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub pages_crawled: u64,
    pub pages_succeeded: u64,
    pub pages_failed: u64,
    pub schemas_detected: u64,
    pub stop_reason: Option<String>,
}

/// Status of a discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
