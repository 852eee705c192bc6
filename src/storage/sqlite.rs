//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::schema::DetectedSchema;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, RunTotals};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, \
     pages_crawled, pages_succeeded, pages_failed, schemas_detected, stop_reason";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        totals: RunTotals {
            pages_crawled: row.get::<_, i64>(5)? as u64,
            pages_succeeded: row.get::<_, i64>(6)? as u64,
            pages_failed: row.get::<_, i64>(7)? as u64,
            schemas_detected: row.get::<_, i64>(8)? as u64,
            stop_reason: row.get(9)?,
        },
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        Ok(self.conn.query_row(&sql, [], run_from_row).optional()?)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        totals: &RunTotals,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2, pages_crawled = ?3,
                 pages_succeeded = ?4, pages_failed = ?5, schemas_detected = ?6, stop_reason = ?7
             WHERE id = ?8",
            params![
                now,
                status.to_db_string(),
                totals.pages_crawled as i64,
                totals.pages_succeeded as i64,
                totals.pages_failed as i64,
                totals.schemas_detected as i64,
                totals.stop_reason,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Schemas =====

    fn save_schema(&mut self, schema: &DetectedSchema) -> StorageResult<()> {
        let body = serde_json::to_string(schema)?;
        self.conn.execute(
            "INSERT INTO schemas (schema_id, name, domain, confidence, body, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(schema_id) DO UPDATE SET
                name = excluded.name,
                domain = excluded.domain,
                confidence = excluded.confidence,
                body = excluded.body,
                updated_at = excluded.updated_at",
            params![
                schema.schema_id,
                schema.name,
                schema.domain,
                schema.confidence,
                body,
                schema.last_updated.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn load_schema(&self, schema_id: &str) -> StorageResult<Option<DetectedSchema>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM schemas WHERE schema_id = ?1",
                params![schema_id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn list_schemas(&self) -> StorageResult<Vec<DetectedSchema>> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM schemas ORDER BY confidence DESC, schema_id")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut schemas = Vec::with_capacity(bodies.len());
        for body in bodies {
            schemas.push(serde_json::from_str(&body)?);
        }
        Ok(schemas)
    }

    // ===== Models =====

    fn save_model(&mut self, key: &str, blob: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO models (key, blob, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET blob = excluded.blob, updated_at = excluded.updated_at",
            params![key, blob, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load_model(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT blob FROM models WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?)
    }
}
