//! Console statistics
//!
//! Prints run summaries and what the storage backend has accumulated
//! across runs (latest run record, persisted schemas, models).

use crate::output::summary::RunSummary;
use crate::schema::DetectedSchema;
use crate::storage::{
    RunRecord, Storage, StorageResult, CLASSIFIER_MODEL_KEY, PRIORITIZER_MODEL_KEY,
};

/// What the storage backend holds
#[derive(Debug, Clone)]
pub struct StoredStatistics {
    pub latest_run: Option<RunRecord>,

    /// Persisted schemas, highest confidence first
    pub schemas: Vec<DetectedSchema>,
    pub classifier_model: bool,
    pub prioritizer_model: bool,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<StoredStatistics> {
    Ok(StoredStatistics {
        latest_run: storage.get_latest_run()?,
        schemas: storage.list_schemas()?,
        classifier_model: storage.load_model(CLASSIFIER_MODEL_KEY)?.is_some(),
        prioritizer_model: storage.load_model(PRIORITIZER_MODEL_KEY)?.is_some(),
    })
}

/// Prints stored statistics to stdout
pub fn print_statistics(stats: &StoredStatistics) {
    println!("=== Stored State ===\n");

    match &stats.latest_run {
        Some(run) => {
            println!("Latest run #{} ({})", run.id, run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!(
                "  Pages: {} crawled, {} succeeded, {} failed",
                run.totals.pages_crawled, run.totals.pages_succeeded, run.totals.pages_failed
            );
            if let Some(reason) = &run.totals.stop_reason {
                println!("  Stop reason: {}", reason);
            }
        }
        None => println!("No runs recorded"),
    }
    println!();

    println!(
        "Models: classifier {}, prioritizer {}",
        if stats.classifier_model { "stored" } else { "none" },
        if stats.prioritizer_model { "stored" } else { "none" }
    );
    println!();

    print_schemas(&stats.schemas);
}

/// Prints a schema listing to stdout
pub fn print_schemas(schemas: &[DetectedSchema]) {
    println!("Schemas ({}):", schemas.len());
    for schema in schemas {
        println!(
            "  {} {} (confidence {:.2}, {} fields, used {}x, success {:.0}%)",
            schema.schema_id,
            schema.name,
            schema.confidence,
            schema.fields.len(),
            schema.usage_count,
            schema.success_rate * 100.0
        );
        for field in &schema.fields {
            println!(
                "    - {} [{}] {:?} via `{}`",
                field.name, field.data_type, field.importance, field.selector
            );
        }
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    println!("Overview:");
    println!("  Stopped: {}", summary.stop_reason);
    println!("  Duration: {:.1}s", summary.duration_seconds);
    println!("  Pages crawled: {}", summary.pages_crawled);
    println!(
        "  Pages succeeded: {} ({:.1}%)",
        summary.pages_succeeded,
        summary.success_rate()
    );
    println!("  Pages failed: {}", summary.pages_failed);
    println!(
        "  Links admitted/rejected: {}/{}",
        summary.links_admitted, summary.links_rejected
    );
    println!("  Average confidence: {:.3}", summary.avg_confidence);
    println!();

    if !summary.schema_usage.is_empty() {
        println!("Schema usage:");
        let mut usage: Vec<_> = summary.schema_usage.iter().collect();
        usage.sort_by(|a, b| b.1.cmp(a.1));
        for (name, count) in usage {
            println!("  {}: {}", name, count);
        }
        println!();
    }

    if let Some(report) = summary.graph.report() {
        for recommendation in &report.recommendations {
            println!("Recommendation: {}", recommendation);
        }
    }
}
