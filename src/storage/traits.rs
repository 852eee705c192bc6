//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::schema::DetectedSchema;
use crate::storage::{RunRecord, RunStatus, RunTotals};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Persists run records, detected schemas and trained model blobs. Callers
/// treat every error as non-fatal: the in-memory state stays authoritative.
pub trait Storage: Send {
    // ===== Run Management =====

    /// Creates a new run and returns its ID
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run finished with its final status and totals
    fn finish_run(&mut self, run_id: i64, status: RunStatus, totals: &RunTotals)
        -> StorageResult<()>;

    // ===== Schemas =====

    /// Inserts or replaces a schema by `schema_id`
    fn save_schema(&mut self, schema: &DetectedSchema) -> StorageResult<()>;

    /// Loads a schema by ID
    fn load_schema(&self, schema_id: &str) -> StorageResult<Option<DetectedSchema>>;

    /// Lists every stored schema, highest confidence first
    fn list_schemas(&self) -> StorageResult<Vec<DetectedSchema>>;

    // ===== Models =====

    /// Stores a serialized model under `key`
    fn save_model(&mut self, key: &str, blob: &str) -> StorageResult<()>;

    /// Loads the serialized model stored under `key`
    fn load_model(&self, key: &str) -> StorageResult<Option<String>>;
}
