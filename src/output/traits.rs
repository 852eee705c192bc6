//! Output traits and error types
//!
//! This module defines the metrics sink the coordinator reports through and
//! the error type shared by the report writers.

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Requests dispatched to the fetcher
pub const METRIC_REQUESTS: &str = "requests";

/// Pages whose extraction met the success bar
pub const METRIC_SUCCESSES: &str = "successes";

/// Fetch failures and unsuccessful extractions
pub const METRIC_FAILURES: &str = "failures";

/// Discovered links admitted to the scheduler
pub const METRIC_LINKS_ADMITTED: &str = "links_admitted";

/// Discovered links the scheduler refused
pub const METRIC_LINKS_REJECTED: &str = "links_rejected";

/// Fetch wall-clock time in seconds
pub const METRIC_FETCH_TIME: &str = "fetch_time";

/// Confidence of the latest extraction
pub const METRIC_EXTRACTION_CONFIDENCE: &str = "extraction_confidence";

/// Receiver of run counters, timings and gauges
///
/// Implementations must be cheap to call from every worker.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, name: &str, by: u64);

    fn timing(&self, name: &str, seconds: f64);

    fn gauge(&self, name: &str, value: f64);
}
