use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregated crawl outcomes for one URL or one domain
///
/// All averages are maintained incrementally, so recording an outcome is
/// O(1) and never needs the history of previous attempts.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStats {
    /// Attempts recorded (completions and failures)
    pub total: u64,

    /// Attempts that completed successfully
    pub completed: u64,

    /// Attempts that failed (fetch errors or unsuccessful extraction)
    pub failed: u64,

    /// Running mean response time in seconds over timed attempts
    pub avg_response_time: f64,

    /// completed / total
    pub success_rate: f64,

    /// Running mean data quality over timed attempts
    pub avg_quality: f64,

    pub last_updated: DateTime<Utc>,

    /// Attempts that carried a response time and quality score
    timed: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            total: 0,
            completed: 0,
            failed: 0,
            avg_response_time: 0.0,
            success_rate: 0.0,
            avg_quality: 0.0,
            last_updated: Utc::now(),
            timed: 0,
        }
    }

    /// Records a fetched page
    ///
    /// # Arguments
    ///
    /// * `success` - Whether extraction met the success bar
    /// * `response_time` - Fetch time in seconds
    /// * `quality` - Data quality score in [0, 1]
    pub fn record_completion(&mut self, success: bool, response_time: f64, quality: f64) {
        self.timed += 1;
        let n = self.timed as f64;
        self.avg_response_time += (response_time - self.avg_response_time) / n;
        self.avg_quality += (quality.clamp(0.0, 1.0) - self.avg_quality) / n;
        self.record_attempt(success);
    }

    /// Records a fetch failure that produced no page
    pub fn record_failure(&mut self) {
        self.record_attempt(false);
    }

    fn record_attempt(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
        self.success_rate = self.completed as f64 / self.total as f64;
        self.last_updated = Utc::now();
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}
