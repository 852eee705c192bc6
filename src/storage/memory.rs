//! In-memory storage backend
//!
//! Used for dry runs and tests; nothing survives the process.

use crate::schema::DetectedSchema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, RunTotals};
use chrono::Utc;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    runs: Vec<RunRecord>,
    schemas: HashMap<String, DetectedSchema>,
    models: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let id = self.runs.len() as i64 + 1;
        self.runs.push(RunRecord {
            id,
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
            config_hash: config_hash.to_string(),
            status: RunStatus::Running,
            totals: RunTotals::default(),
        });
        Ok(id)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.runs
            .iter()
            .find(|r| r.id == run_id)
            .cloned()
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        Ok(self.runs.last().cloned())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        totals: &RunTotals,
    ) -> StorageResult<()> {
        let run = self
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or(StorageError::RunNotFound(run_id))?;
        run.finished_at = Some(Utc::now().to_rfc3339());
        run.status = status;
        run.totals = totals.clone();
        Ok(())
    }

    fn save_schema(&mut self, schema: &DetectedSchema) -> StorageResult<()> {
        self.schemas
            .insert(schema.schema_id.clone(), schema.clone());
        Ok(())
    }

    fn load_schema(&self, schema_id: &str) -> StorageResult<Option<DetectedSchema>> {
        Ok(self.schemas.get(schema_id).cloned())
    }

    fn list_schemas(&self) -> StorageResult<Vec<DetectedSchema>> {
        let mut schemas: Vec<DetectedSchema> = self.schemas.values().cloned().collect();
        schemas.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.schema_id.cmp(&b.schema_id))
        });
        Ok(schemas)
    }

    fn save_model(&mut self, key: &str, blob: &str) -> StorageResult<()> {
        self.models.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn load_model(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.models.get(key).cloned())
    }
}
