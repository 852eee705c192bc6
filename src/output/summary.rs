//! End-of-run summary

use crate::classifier::ClassifierStats;
use crate::crawler::SchedulerStats;
use crate::graph::AnalysisOutcome;
use crate::state::StopReason;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Key used in the schema usage histogram for pages extracted without a schema
pub const GENERIC_EXTRACTION: &str = "generic";

/// Everything a finished run reports
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Storage run ID, if the run record could be written
    pub run_id: Option<i64>,
    pub config_hash: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub stop_reason: StopReason,

    /// Pages fetched and extracted
    pub pages_crawled: u64,
    pub pages_succeeded: u64,

    /// Requests that failed permanently
    pub pages_failed: u64,
    pub links_admitted: u64,
    pub links_rejected: u64,
    pub optimization_passes: u64,

    /// Pages extracted per schema name ([`GENERIC_EXTRACTION`] for none)
    pub schema_usage: BTreeMap<String, u64>,
    pub schemas_detected: usize,

    pub avg_confidence: f64,
    pub avg_response_time: f64,
    pub avg_fields_extracted: f64,

    pub scheduler: SchedulerStats,
    pub classifier: ClassifierStats,

    /// Final graph analysis pass
    pub graph: AnalysisOutcome,
}

impl RunSummary {
    /// Successful pages over crawled pages, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_crawled == 0 {
            return 0.0;
        }
        self.pages_succeeded as f64 / self.pages_crawled as f64 * 100.0
    }

    /// Terminal failures over all pages that reached a terminal outcome, as a percentage
    pub fn failure_rate(&self) -> f64 {
        let terminal = self.pages_crawled + self.pages_failed;
        if terminal == 0 {
            return 0.0;
        }
        self.pages_failed as f64 / terminal as f64 * 100.0
    }
}
