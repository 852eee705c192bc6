//! Output module for run summaries, reports and metrics
//!
//! This module handles:
//! - The end-of-run summary
//! - Generating markdown reports
//! - Printing statistics to the console
//! - Metrics sinks the coordinator reports through

mod markdown;
mod metrics;
pub mod stats;
mod summary;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use metrics::{InMemoryMetrics, TracingMetrics};
pub use stats::{load_statistics, print_schemas, print_statistics, print_summary, StoredStatistics};
pub use summary::{RunSummary, GENERIC_EXTRACTION};
pub use traits::{
    MetricsSink, OutputError, OutputResult, METRIC_EXTRACTION_CONFIDENCE, METRIC_FAILURES,
    METRIC_FETCH_TIME, METRIC_LINKS_ADMITTED, METRIC_LINKS_REJECTED, METRIC_REQUESTS,
    METRIC_SUCCESSES,
};
