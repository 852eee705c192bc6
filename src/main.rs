//! Sumi-Scout main entry point
//!
//! This is the command-line interface for the Sumi-Scout discovery engine.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_scout::config::{load_config_with_hash, Config};
use sumi_scout::crawler::Coordinator;
use sumi_scout::output::{
    generate_markdown_summary, load_statistics, print_schemas, print_statistics, print_summary,
};
use sumi_scout::storage::{open_storage, SqliteStorage, Storage};
use tracing_subscriber::EnvFilter;

/// Sumi-Scout: an adaptive web discovery engine
///
/// Sumi-Scout classifies links, schedules the most promising ones first,
/// learns page schemas as it goes, and reports what it found.
#[derive(Parser, Debug)]
#[command(name = "sumi-scout")]
#[command(version)]
#[command(about = "An adaptive web discovery engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show how the seeds classify without crawling
    #[arg(long, conflicts_with_all = ["stats", "schemas"])]
    dry_run: bool,

    /// Show what the database holds and exit
    #[arg(long, conflicts_with_all = ["dry_run", "schemas"])]
    stats: bool,

    /// List persisted schemas and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    schemas: bool,

    /// Print the run summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(config, config_hash)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.schemas {
        handle_schemas(&config)
    } else {
        handle_run(config, config_hash, cli.json).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scout=info,warn"),
            1 => EnvFilter::new("sumi_scout=debug,info"),
            2 => EnvFilter::new("sumi_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and classifies the seeds
fn handle_dry_run(config: Config, config_hash: String) -> anyhow::Result<()> {
    println!("=== Sumi-Scout Dry Run ===\n");

    println!("Run Budget:");
    println!("  Max pages: {}", config.run.max_pages);
    println!("  Time limit: {}s", config.run.time_limit);
    println!("  Max depth: {}", config.run.max_depth);
    println!("  Workers: {}", config.scheduler.max_concurrent_crawls);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nExcluded Domains ({}):", config.exclude.len());
    for entry in &config.exclude {
        println!("  - {}", entry.domain);
    }

    let seed_count = config.seeds.len();
    let coordinator = Coordinator::new(config, config_hash)?;

    println!("\nSeeds ({}):", seed_count);
    for info in coordinator.classify_seeds() {
        println!(
            "  - {} -> {} ({:.2}, {})",
            info.url, info.category, info.confidence, info.priority
        );
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))
}

/// Handles the --stats mode: shows what the database holds
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --schemas mode: lists persisted schemas
fn handle_schemas(config: &Config) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let schemas = storage.list_schemas()?;
    print_schemas(&schemas);

    Ok(())
}

/// Handles the discovery run
async fn handle_run(config: Config, config_hash: String, json: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, Exclusions: {}, Page budget: {}",
        config.seeds.len(),
        config.exclude.len(),
        config.run.max_pages
    );

    let summary_path = PathBuf::from(&config.output.summary_path);
    let mut coordinator =
        Coordinator::new(config, config_hash).context("Failed to start the run")?;

    let summary = coordinator.run().await.context("Run failed")?;

    if let Err(e) = generate_markdown_summary(&summary, &summary_path) {
        tracing::warn!(
            "Failed to write summary to {}: {}",
            summary_path.display(),
            e
        );
    } else {
        tracing::info!("Summary written to {}", summary_path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}
