use serde::Deserialize;

/// Main configuration structure for Sumi-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "seed")]
    pub seeds: Vec<SeedEntry>,
    #[serde(default)]
    pub exclude: Vec<DomainEntry>,
}

/// Priority scheduler configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of requests in flight (also the worker count)
    #[serde(rename = "max-concurrent-crawls")]
    pub max_concurrent_crawls: u32,

    /// Maximum number of queued requests across all tiers
    #[serde(rename = "max-queue-size")]
    pub max_queue_size: usize,

    /// Whether the learned prioritizer may overwrite caller priorities
    #[serde(rename = "enable-learned-scoring")]
    pub enable_learned_scoring: bool,

    /// Completions between prioritizer retrains
    #[serde(rename = "model-update-interval")]
    pub model_update_interval: u32,

    /// Retry budget given to new requests
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Most recent completions kept for prioritizer retraining
    #[serde(rename = "max-training-samples")]
    pub max_training_samples: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_crawls: 8,
            max_queue_size: 10_000,
            enable_learned_scoring: true,
            model_update_interval: 100,
            max_retries: 3,
            max_training_samples: 5_000,
        }
    }
}

/// Link classifier configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum confidence for a link to be admitted above NORMAL priority
    #[serde(rename = "confidence-threshold")]
    pub confidence_threshold: f64,

    /// Whether labeled samples and feedback are collected for retraining
    #[serde(rename = "enable-learning")]
    pub enable_learning: bool,

    /// Labeled samples accumulated before a retrain is triggered
    #[serde(rename = "retrain-threshold")]
    pub retrain_threshold: usize,

    /// Feedback items accumulated before a promotion/demotion pass
    #[serde(rename = "feedback-threshold")]
    pub feedback_threshold: usize,

    /// Most recent labeled samples kept for retraining
    #[serde(rename = "max-training-samples")]
    pub max_training_samples: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.55,
            enable_learning: true,
            retrain_threshold: 50,
            feedback_threshold: 20,
            max_training_samples: 5_000,
        }
    }
}

/// Crawl graph analyzer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Minimum node count before pattern analysis runs
    #[serde(rename = "min-nodes-for-analysis")]
    pub min_nodes_for_analysis: usize,

    /// Successful pages between optimization passes
    #[serde(rename = "optimization-interval")]
    pub optimization_interval: usize,

    /// How many graph-ranked URLs an optimization pass re-admits
    #[serde(rename = "top-targets")]
    pub top_targets: usize,

    pub weights: GraphWeights,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_nodes_for_analysis: 10,
            optimization_interval: 20,
            top_targets: 10,
            weights: GraphWeights::default(),
        }
    }
}

/// Blend weights used by the graph analyzer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphWeights {
    #[serde(rename = "centrality-rank")]
    pub centrality_rank: f64,
    #[serde(rename = "centrality-value")]
    pub centrality_value: f64,
    #[serde(rename = "centrality-success")]
    pub centrality_success: f64,
    #[serde(rename = "propagation-predecessor")]
    pub propagation_predecessor: f64,
    #[serde(rename = "propagation-successor")]
    pub propagation_successor: f64,
    #[serde(rename = "target-value")]
    pub target_value: f64,
    #[serde(rename = "target-degree")]
    pub target_degree: f64,
    #[serde(rename = "target-neighbors")]
    pub target_neighbors: f64,
}

impl Default for GraphWeights {
    fn default() -> Self {
        Self {
            centrality_rank: 0.4,
            centrality_value: 0.3,
            centrality_success: 0.3,
            propagation_predecessor: 0.3,
            propagation_successor: 0.1,
            target_value: 0.4,
            target_degree: 0.3,
            target_neighbors: 0.3,
        }
    }
}

/// Schema detector configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Minimum confidence for a detected schema to be accepted
    #[serde(rename = "min-schema-confidence")]
    pub min_schema_confidence: f64,

    /// Maximum example values kept per field
    #[serde(rename = "max-examples")]
    pub max_examples: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            min_schema_confidence: 0.6,
            max_examples: 5,
        }
    }
}

/// Run budget configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum number of requests dispatched in one run
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Wall-clock limit for a run (seconds)
    #[serde(rename = "time-limit")]
    pub time_limit: u64,

    /// Maximum link depth admitted from a seed
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// How long an idle worker sleeps before polling the scheduler again (milliseconds)
    #[serde(rename = "idle-wait-ms")]
    pub idle_wait_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            time_limit: 3600,
            max_depth: 4,
            idle_wait_ms: 100,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the full user agent string: `Name/Version (+ContactURL; ContactEmail)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file (schemas, models, runs)
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown run report
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// A seed URL the run starts from
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub url: String,

    /// Anchor text used when classifying the seed
    #[serde(default)]
    pub anchor: String,

    /// Owning task name recorded on every request derived from this seed
    #[serde(default = "default_task")]
    pub task: String,
}

fn default_task() -> String {
    "default".to_string()
}

/// Simple domain entry for the exclusion list
#[derive(Debug, Clone, Deserialize)]
pub struct DomainEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,
}
