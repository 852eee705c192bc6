//! Markdown report generation
//!
//! This module generates a human-readable markdown report of a run,
//! including totals, schema usage, scheduler and classifier activity, and the
//! final graph analysis.

use crate::graph::AnalysisOutcome;
use crate::output::summary::RunSummary;
use crate::output::traits::OutputResult;
use crate::state::CrawlPriority;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for a run
///
/// # Arguments
///
/// * `summary` - The run summary
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Scout Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    if let Some(run_id) = summary.run_id {
        md.push_str(&format!("- **Run ID**: {}\n", run_id));
    }
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds ({:.2} minutes)\n",
        summary.duration_seconds,
        summary.duration_seconds / 60.0
    ));
    md.push_str(&format!("- **Stopped**: {}\n", summary.stop_reason));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Totals
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Crawled**: {}\n", summary.pages_crawled));
    md.push_str(&format!("- **Pages Succeeded**: {}\n", summary.pages_succeeded));
    md.push_str(&format!("- **Pages Failed**: {}\n", summary.pages_failed));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n", summary.success_rate()));
    md.push_str(&format!("- **Links Admitted**: {}\n", summary.links_admitted));
    md.push_str(&format!("- **Links Rejected**: {}\n", summary.links_rejected));
    md.push_str(&format!(
        "- **Average Confidence**: {:.3}\n",
        summary.avg_confidence
    ));
    md.push_str(&format!(
        "- **Average Response Time**: {:.3}s\n",
        summary.avg_response_time
    ));
    md.push_str(&format!(
        "- **Average Fields Extracted**: {:.2}\n",
        summary.avg_fields_extracted
    ));
    md.push_str(&format!(
        "- **Optimization Passes**: {}\n\n",
        summary.optimization_passes
    ));

    // Schema usage
    if !summary.schema_usage.is_empty() {
        md.push_str("## Schema Usage\n\n");
        md.push_str(&format!(
            "Schemas detected: {}\n\n",
            summary.schemas_detected
        ));
        md.push_str("| Schema | Pages |\n");
        md.push_str("|--------|-------|\n");

        let mut usage: Vec<_> = summary.schema_usage.iter().collect();
        usage.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (name, count) in usage {
            md.push_str(&format!("| {} | {} |\n", name, count));
        }
        md.push('\n');
    }

    // Scheduler
    let scheduler = &summary.scheduler;
    md.push_str("## Scheduler\n\n");
    md.push_str("| Tier | Still Queued |\n");
    md.push_str("|------|--------------|\n");
    for (tier, count) in CrawlPriority::TIERS.iter().zip(scheduler.queued_by_tier) {
        md.push_str(&format!("| {} | {} |\n", tier, count));
    }
    md.push('\n');
    md.push_str(&format!("- **Admitted**: {}\n", scheduler.admitted));
    md.push_str(&format!("- **Rejected**: {}\n", scheduler.rejected));
    md.push_str(&format!("- **Retried**: {}\n", scheduler.retried));
    md.push_str(&format!(
        "- **Permanently Failed**: {}\n",
        scheduler.permanently_failed
    ));
    md.push_str(&format!("- **Promoted**: {}\n", scheduler.promoted));
    md.push_str(&format!(
        "- **Prioritizer**: {} ({} retrains)\n\n",
        scheduler.prioritizer, scheduler.retrains
    ));

    // Classifier
    let classifier = &summary.classifier;
    md.push_str("## Link Classifier\n\n");
    md.push_str(&format!(
        "- **Model**: {}{}\n",
        classifier.model_name,
        if classifier.trained { " (trained)" } else { "" }
    ));
    md.push_str(&format!(
        "- **Links Classified**: {}\n",
        classifier.total_classified
    ));
    md.push_str(&format!(
        "- **Promotions / Demotions**: {} / {}\n\n",
        classifier.promotions, classifier.demotions
    ));
    if !classifier.by_category.is_empty() {
        md.push_str("| Category | Links |\n");
        md.push_str("|----------|-------|\n");
        let mut categories: Vec<_> = classifier.by_category.iter().collect();
        categories.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        for (category, count) in categories {
            md.push_str(&format!("| {} | {} |\n", category, count));
        }
        md.push('\n');
    }

    // Graph analysis
    md.push_str("## Crawl Graph\n\n");
    match &summary.graph {
        AnalysisOutcome::Insufficient { nodes, required } => {
            md.push_str(&format!(
                "Not enough data for analysis ({} nodes, {} required).\n",
                nodes, required
            ));
        }
        AnalysisOutcome::Report(report) => {
            let stats = &report.statistics;
            md.push_str(&format!("- **Nodes**: {}\n", stats.node_count));
            md.push_str(&format!("- **Edges**: {}\n", stats.edge_count));
            md.push_str(&format!("- **Density**: {:.4}\n", stats.density));
            md.push_str(&format!(
                "- **Weak Components**: {}\n",
                stats.weak_components
            ));
            md.push_str(&format!("- **Communities**: {}\n\n", report.communities.len()));

            if !report.centrality.is_empty() {
                md.push_str("### Most Central Pages\n\n");
                md.push_str("| URL | Score |\n");
                md.push_str("|-----|-------|\n");
                for node in &report.centrality {
                    md.push_str(&format!("| {} | {:.3} |\n", node.url, node.score));
                }
                md.push('\n');
            }

            if !report.efficiency.failure_hotspots.is_empty() {
                md.push_str("### Failure Hotspots\n\n");
                md.push_str("| Domain | Failed | Crawled |\n");
                md.push_str("|--------|--------|---------|\n");
                for hotspot in &report.efficiency.failure_hotspots {
                    md.push_str(&format!(
                        "| {} | {} | {} |\n",
                        hotspot.domain, hotspot.failed, hotspot.crawled
                    ));
                }
                md.push('\n');
            }

            if !report.recommendations.is_empty() {
                md.push_str("### Recommendations\n\n");
                for recommendation in &report.recommendations {
                    md.push_str(&format!("- {}\n", recommendation));
                }
                md.push('\n');
            }
        }
    }

    md
}
