//! Coordinator - the discovery run control loop
//!
//! This module ties every component into one feedback cycle:
//! - Admitting classified seeds into the scheduler
//! - A pool of workers pulling requests and calling the fetcher
//! - Schema detection and extraction per page
//! - Feeding outcomes back to the scheduler, graph and classifier
//! - Periodic graph optimization passes
//! - Persisting models and schemas, and producing the run summary

use crate::classifier::{LinkClassifier, LinkContext, LinkInfo};
use crate::config::{validate, Config};
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher, HttpFetcher};
use crate::crawler::request::CrawlRequest;
use crate::crawler::scheduler::Scheduler;
use crate::graph::{AnalysisOutcome, CrawlGraph, ImportanceScores, SharedGraph};
use crate::output::{
    MetricsSink, RunSummary, TracingMetrics, GENERIC_EXTRACTION, METRIC_EXTRACTION_CONFIDENCE,
    METRIC_FAILURES, METRIC_FETCH_TIME, METRIC_LINKS_ADMITTED, METRIC_LINKS_REJECTED,
    METRIC_REQUESTS, METRIC_SUCCESSES,
};
use crate::schema::{extract_generic, extract_with_schema, ExtractionResult, SchemaDetector};
use crate::state::{CrawlPriority, LinkCategory, RunState, StopReason};
use crate::storage::{
    open_storage, MemoryStorage, RunStatus, RunTotals, Storage, CLASSIFIER_MODEL_KEY,
    PRIORITIZER_MODEL_KEY,
};
use crate::url::{domain_of, normalize_url, ExclusionList};
use crate::{Result, ScoutError};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

const CATEGORY_KEY: &str = "category";

#[derive(Debug, Default)]
struct RunCounters {
    pages_crawled: u64,
    pages_succeeded: u64,
    pages_failed: u64,
    links_admitted: u64,
    links_rejected: u64,
    optimization_passes: u64,
    schema_usage: BTreeMap<String, u64>,
    confidence_sum: f64,
    response_time_sum: f64,
    fields_sum: u64,
}

/// State shared by every worker
struct Engine {
    config: Arc<Config>,
    scheduler: Scheduler,
    classifier: LinkClassifier,
    graph: SharedGraph,
    detector: SchemaDetector,
    fetcher: Arc<dyn Fetcher>,
    metrics: Arc<dyn MetricsSink>,
    exclusions: ExclusionList,

    /// Every URL ever admitted this run
    seen: Mutex<HashSet<String>>,

    /// Classification of admitted URLs awaiting outcome feedback
    pending_links: Mutex<HashMap<String, LinkInfo>>,
    counters: Mutex<RunCounters>,

    /// Requests handed to workers; bounded by `max_pages`
    dispatched: AtomicUsize,
    last_crawled: Mutex<Option<String>>,
    stop_reason: Mutex<Option<StopReason>>,
}

/// Main coordinator structure
pub struct Coordinator {
    engine: Arc<Engine>,
    storage: Mutex<Box<dyn Storage>>,
    config_hash: String,
    state: RunState,
}

impl Coordinator {
    /// Creates a coordinator with the HTTP fetcher and SQLite storage
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the configuration file, recorded with the run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScoutError)` - Invalid configuration or HTTP client failure
    ///
    /// A database that cannot be opened is not fatal; the run falls back to
    /// in-memory storage.
    pub fn new(config: Config, config_hash: String) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent)?;

        let storage: Box<dyn Storage> =
            match open_storage(Path::new(&config.output.database_path)) {
                Ok(storage) => Box::new(storage),
                Err(e) => {
                    tracing::warn!(
                        "Cannot open database {}: {}; continuing in memory",
                        config.output.database_path,
                        e
                    );
                    Box::new(MemoryStorage::new())
                }
            };

        Self::with_parts(
            config,
            config_hash,
            Arc::new(fetcher),
            storage,
            Arc::new(TracingMetrics),
        )
    }

    /// Creates a coordinator from explicit collaborators
    pub fn with_parts(
        config: Config,
        config_hash: String,
        fetcher: Arc<dyn Fetcher>,
        storage: Box<dyn Storage>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        validate(&config)?;

        let graph = CrawlGraph::shared(config.graph.clone());
        let scheduler = Scheduler::new(config.scheduler.clone()).with_graph(Arc::clone(&graph));
        let classifier = LinkClassifier::new(config.classifier.clone());
        let detector = SchemaDetector::new(config.schema.clone());
        let exclusions = ExclusionList::new(&config.exclude);

        let engine = Engine {
            config: Arc::new(config),
            scheduler,
            classifier,
            graph,
            detector,
            fetcher,
            metrics,
            exclusions,
            seen: Mutex::new(HashSet::new()),
            pending_links: Mutex::new(HashMap::new()),
            counters: Mutex::new(RunCounters::default()),
            dispatched: AtomicUsize::new(0),
            last_crawled: Mutex::new(None),
            stop_reason: Mutex::new(None),
        };

        Ok(Self {
            engine: Arc::new(engine),
            storage: Mutex::new(storage),
            config_hash,
            state: RunState::Init,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.engine.scheduler
    }

    pub fn classifier(&self) -> &LinkClassifier {
        &self.engine.classifier
    }

    pub fn detector(&self) -> &SchemaDetector {
        &self.engine.detector
    }

    pub fn graph(&self) -> SharedGraph {
        Arc::clone(&self.engine.graph)
    }

    /// Classifies every configured seed without admitting it
    pub fn classify_seeds(&self) -> Vec<LinkInfo> {
        self.engine
            .config
            .seeds
            .iter()
            .map(|seed| {
                let url = normalize_url(&seed.url)
                    .map(String::from)
                    .unwrap_or_else(|_| seed.url.clone());
                self.engine
                    .classifier
                    .classify_link(&url, &seed.anchor, None, &LinkContext::default())
            })
            .collect()
    }

    /// Runs the discovery loop to completion
    ///
    /// 1. Loads persisted models and schemas
    /// 2. Admits the seeds (INIT → RUNNING)
    /// 3. Runs `max_concurrent_crawls` workers until the page budget, the
    ///    time limit or an exhausted queue stops the run (RUNNING → STOPPED)
    /// 4. Persists models and schemas and returns the summary
    ///
    /// A coordinator runs once; a second call fails with an invalid transition.
    pub async fn run(&mut self) -> Result<RunSummary> {
        if self.state != RunState::Init {
            return Err(ScoutError::InvalidTransition {
                from: self.state,
                to: RunState::Running,
            });
        }

        let started_at = Utc::now();
        let started = Instant::now();
        let run_id = self.start_run_record();
        self.load_persisted();

        let admitted = self.admit_seeds();
        if admitted == 0 {
            tracing::warn!("No seed could be admitted");
            self.engine.set_stop_reason(StopReason::QueueExhausted);
            self.state = self.state.transition(RunState::Stopped)?;
        } else {
            self.state = self.state.transition(RunState::Running)?;
            tracing::info!(
                "Run started with {} seeds and {} workers",
                admitted,
                self.engine.config.scheduler.max_concurrent_crawls
            );

            let token = CancellationToken::new();
            let mut workers = JoinSet::new();
            for worker_id in 0..self.engine.config.scheduler.max_concurrent_crawls {
                let engine = Arc::clone(&self.engine);
                let token = token.clone();
                workers.spawn(async move { engine.worker(worker_id, token, started).await });
            }

            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Worker task failed: {}", e);
                }
            }
            self.state = self.state.transition(RunState::Stopped)?;
        }

        let stop_reason = self
            .engine
            .stop_reason
            .lock()
            .unwrap_or(StopReason::QueueExhausted);
        tracing::info!("Run stopped: {}", stop_reason);

        let graph = self.engine.graph.write().analyze_crawl_patterns();
        self.save_persisted();

        let summary = self.summarize(run_id, started_at, started, stop_reason, graph);
        self.finish_run_record(run_id, &summary);

        tracing::info!(
            "Run finished: {} pages crawled, {:.1}% successful, in {:.1}s",
            summary.pages_crawled,
            summary.success_rate(),
            summary.duration_seconds
        );
        Ok(summary)
    }

    fn start_run_record(&self) -> Option<i64> {
        match self.storage.lock().create_run(&self.config_hash) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to record run start: {}", e);
                None
            }
        }
    }

    fn finish_run_record(&self, run_id: Option<i64>, summary: &RunSummary) {
        let Some(run_id) = run_id else {
            return;
        };
        let totals = RunTotals {
            pages_crawled: summary.pages_crawled,
            pages_succeeded: summary.pages_succeeded,
            pages_failed: summary.pages_failed,
            schemas_detected: summary.schemas_detected as u64,
            stop_reason: Some(summary.stop_reason.to_db_string().to_string()),
        };
        if let Err(e) = self
            .storage
            .lock()
            .finish_run(run_id, RunStatus::Completed, &totals)
        {
            tracing::warn!("Failed to record run end: {}", e);
        }
    }

    /// Restores models and schemas; failures leave the defaults in place
    fn load_persisted(&self) {
        let storage = self.storage.lock();

        match storage.load_model(CLASSIFIER_MODEL_KEY) {
            Ok(Some(blob)) => match self.engine.classifier.import_model(&blob) {
                Ok(()) => tracing::info!("Loaded stored classifier model"),
                Err(e) => tracing::warn!("Ignoring stored classifier model: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load classifier model: {}", e),
        }

        match storage.load_model(PRIORITIZER_MODEL_KEY) {
            Ok(Some(blob)) => match self.engine.scheduler.import_prioritizer(&blob) {
                Ok(()) => tracing::info!("Loaded stored prioritizer model"),
                Err(e) => tracing::warn!("Ignoring stored prioritizer model: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load prioritizer model: {}", e),
        }

        let schemas = self.engine.detector.load_all(&**storage);
        if schemas > 0 {
            tracing::info!("Loaded {} stored schemas", schemas);
        }
    }

    /// Persists trained models and every registered schema
    fn save_persisted(&self) {
        let mut storage = self.storage.lock();

        if let Some(blob) = self.engine.classifier.export_model() {
            if let Err(e) = storage.save_model(CLASSIFIER_MODEL_KEY, &blob) {
                tracing::warn!("Failed to save classifier model: {}", e);
            }
        }
        if let Some(blob) = self.engine.scheduler.export_prioritizer() {
            if let Err(e) = storage.save_model(PRIORITIZER_MODEL_KEY, &blob) {
                tracing::warn!("Failed to save prioritizer model: {}", e);
            }
        }

        let saved = self.engine.detector.save_all(&mut **storage);
        tracing::debug!("Saved {} schemas", saved);
    }

    /// Admits every seed at its classified priority, never below NORMAL
    fn admit_seeds(&self) -> usize {
        let engine = &self.engine;
        let mut admitted = 0;

        for seed in &engine.config.seeds {
            let url = match normalize_url(&seed.url) {
                Ok(url) => String::from(url),
                Err(e) => {
                    tracing::warn!("Skipping seed {}: {}", seed.url, e);
                    continue;
                }
            };

            let mut info =
                engine
                    .classifier
                    .classify_link(&url, &seed.anchor, None, &LinkContext::default());
            info.url = url.clone();
            let priority = info.priority.max_urgency(CrawlPriority::Normal);

            let request = CrawlRequest::new(url.clone(), seed.task.clone())
                .with_priority(priority)
                .with_estimated_value(info.confidence)
                .with_max_retries(engine.config.scheduler.max_retries)
                .with_metadata(CATEGORY_KEY, info.category.to_db_string());

            tracing::info!(
                "Seed {} classified {} ({:.2}), admitting at {}",
                url,
                info.category,
                info.confidence,
                priority
            );

            if engine.admit(request, info) {
                admitted += 1;
            }
        }
        admitted
    }

    fn summarize(
        &self,
        run_id: Option<i64>,
        started_at: chrono::DateTime<Utc>,
        started: Instant,
        stop_reason: StopReason,
        graph: AnalysisOutcome,
    ) -> RunSummary {
        let counters = self.engine.counters.lock();
        let crawled = counters.pages_crawled.max(1) as f64;

        RunSummary {
            run_id,
            config_hash: self.config_hash.clone(),
            started_at,
            finished_at: Utc::now(),
            duration_seconds: started.elapsed().as_secs_f64(),
            stop_reason,
            pages_crawled: counters.pages_crawled,
            pages_succeeded: counters.pages_succeeded,
            pages_failed: counters.pages_failed,
            links_admitted: counters.links_admitted,
            links_rejected: counters.links_rejected,
            optimization_passes: counters.optimization_passes,
            schema_usage: counters.schema_usage.clone(),
            schemas_detected: self.engine.detector.len(),
            avg_confidence: counters.confidence_sum / crawled,
            avg_response_time: counters.response_time_sum / crawled,
            avg_fields_extracted: counters.fields_sum as f64 / crawled,
            scheduler: self.engine.scheduler.stats(),
            classifier: self.engine.classifier.stats(),
            graph,
        }
    }
}

impl Engine {
    /// Records the first stop reason; later ones are ignored
    fn set_stop_reason(&self, reason: StopReason) {
        let mut stop = self.stop_reason.lock();
        if stop.is_none() {
            *stop = Some(reason);
        }
    }

    fn stop(&self, token: &CancellationToken, reason: StopReason) {
        self.set_stop_reason(reason);
        token.cancel();
    }

    /// Claims one unit of the page budget
    ///
    /// Only called with a request in hand, so a claim is never given back and
    /// a failed claim means the budget is spent.
    fn reserve_dispatch(&self) -> bool {
        let max_pages = self.config.run.max_pages;
        self.dispatched
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max_pages).then_some(n + 1)
            })
            .is_ok()
    }

    fn budget_spent(&self) -> bool {
        self.dispatched.load(Ordering::Acquire) >= self.config.run.max_pages
    }

    async fn worker(self: Arc<Self>, worker_id: u32, token: CancellationToken, started: Instant) {
        let time_limit = Duration::from_secs(self.config.run.time_limit);
        let idle_wait = Duration::from_millis(self.config.run.idle_wait_ms);

        loop {
            if token.is_cancelled() {
                break;
            }
            if started.elapsed() >= time_limit {
                self.stop(&token, StopReason::TimeLimit);
                break;
            }
            if self.budget_spent() {
                self.stop(&token, StopReason::MaxPages);
                break;
            }

            match self.scheduler.get_next_crawl_request() {
                Some(request) => {
                    if !self.reserve_dispatch() {
                        self.scheduler.return_crawl_request(request);
                        self.stop(&token, StopReason::MaxPages);
                        break;
                    }
                    tracing::debug!(
                        "Worker {} dispatching {} ({}, depth {})",
                        worker_id,
                        request.url,
                        request.priority,
                        request.depth
                    );
                    self.process(request).await;
                }
                None => {
                    if self.scheduler.is_idle() {
                        self.stop(&token, StopReason::QueueExhausted);
                        break;
                    }
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(idle_wait) => {}
                    }
                }
            }
        }
        tracing::trace!("Worker {} exiting", worker_id);
    }

    /// Fetches, extracts and feeds back one request
    ///
    /// The request stays active in the scheduler until its links are
    /// admitted, so an idle check never sees a momentarily empty queue.
    async fn process(&self, request: CrawlRequest) {
        self.metrics.increment(METRIC_REQUESTS, 1);

        match self.fetcher.fetch(&request.url).await {
            Ok(page) => self.handle_page(&request, page).await,
            Err(e) => self.handle_fetch_error(&request, e),
        }
    }

    fn handle_fetch_error(&self, request: &CrawlRequest, error: FetchError) {
        self.metrics.increment(METRIC_FAILURES, 1);
        let message = error.to_string();

        let requeued = if error.is_retryable() {
            self.scheduler.fail_crawl_request(&request.url, &message)
        } else {
            self.scheduler.abandon_crawl_request(&request.url, &message);
            false
        };
        if requeued {
            return;
        }

        tracing::debug!("Permanently failed {}: {}", request.url, message);
        self.counters.lock().pages_failed += 1;

        let mut metadata = HashMap::new();
        metadata.insert("error".to_string(), message);
        self.graph.write().add_crawl_result(
            &request.url,
            request.parent_url.as_deref(),
            &[],
            false,
            0.0,
            0.0,
            metadata,
        );

        let info = self.pending_links.lock().remove(&request.url);
        if let Some(info) = info {
            self.classifier.add_feedback(&info, false, 0.0);
        }
    }

    async fn handle_page(&self, request: &CrawlRequest, page: FetchedPage) {
        self.metrics.timing(METRIC_FETCH_TIME, page.response_time);

        let links = normalized_links(&page);
        let schema = self.detector.detect_schema(&page.html, &request.url, None);
        let result: ExtractionResult = match &schema {
            Some(schema) => extract_with_schema(&page.html, &request.url, schema, links.clone()),
            None => extract_generic(&page.html, &request.url, links.clone()),
        };
        if let Some(schema) = &schema {
            self.detector.record_extraction(&schema.schema_id, result.success);
        }

        self.metrics
            .gauge(METRIC_EXTRACTION_CONFIDENCE, result.confidence);
        if result.success {
            self.metrics.increment(METRIC_SUCCESSES, 1);
        } else {
            self.metrics.increment(METRIC_FAILURES, 1);
        }
        tracing::debug!(
            "Extracted {} fields from {} (confidence {:.2}, {})",
            result.data.len(),
            request.url,
            result.confidence,
            schema.as_ref().map_or(GENERIC_EXTRACTION, |s| s.name.as_str())
        );

        let successes = {
            let mut counters = self.counters.lock();
            counters.pages_crawled += 1;
            if result.success {
                counters.pages_succeeded += 1;
            }
            let key = schema
                .as_ref()
                .map_or_else(|| GENERIC_EXTRACTION.to_string(), |s| s.name.clone());
            *counters.schema_usage.entry(key).or_insert(0) += 1;
            counters.confidence_sum += result.confidence;
            counters.response_time_sum += page.response_time;
            counters.fields_sum += result.data.len() as u64;
            counters.pages_succeeded
        };

        let mut metadata = HashMap::new();
        metadata.insert("task".to_string(), request.task.clone());
        if let Some(title) = &page.title {
            metadata.insert("title".to_string(), title.clone());
        }
        if let Some(schema) = &schema {
            metadata.insert("schema_id".to_string(), schema.schema_id.clone());
        }

        let previous = self.last_crawled.lock().replace(request.url.clone());
        {
            let mut graph = self.graph.write();
            graph.add_crawl_result(
                &request.url,
                request.parent_url.as_deref(),
                &links,
                result.success,
                result.confidence,
                page.response_time,
                metadata,
            );
            if let Some(previous) = previous {
                graph.add_crawl_order(&previous, &request.url);
            }
        }

        let info = self.pending_links.lock().remove(&request.url);
        if let Some(info) = info {
            self.classifier
                .add_feedback(&info, result.success, result.confidence);
        }

        self.admit_links(request, &page);

        let interval = self.config.graph.optimization_interval as u64;
        if result.success && interval > 0 && successes % interval == 0 {
            self.optimize().await;
        }

        self.scheduler.complete_crawl_request(
            &request.url,
            result.success,
            page.response_time,
            result.confidence,
            &links,
        );
    }

    /// Classifies a page's links and admits CRITICAL..NORMAL ones at depth + 1
    fn admit_links(&self, request: &CrawlRequest, page: &FetchedPage) {
        if request.depth >= self.config.run.max_depth || page.links.is_empty() {
            return;
        }

        let context = LinkContext {
            depth: request.depth,
            parent_category: request
                .metadata
                .get(CATEGORY_KEY)
                .and_then(|c| LinkCategory::from_db_string(c)),
        };
        let threshold = self.config.classifier.confidence_threshold;

        let infos =
            self.classifier
                .classify_links_batch(&page.links, Some(&request.url), &context);
        for mut info in infos {
            let mut priority = info.priority;
            if priority > CrawlPriority::Normal {
                // Sorted by priority; nothing further qualifies
                break;
            }
            if info.confidence < threshold {
                priority = priority.max(CrawlPriority::Normal);
            }

            let Ok(url) = normalize_url(&info.url).map(String::from) else {
                continue;
            };
            if self.is_excluded(&url) {
                tracing::trace!("Excluded {}", url);
                continue;
            }
            info.url = url.clone();

            let child = CrawlRequest::new(url, request.task.clone())
                .with_priority(priority)
                .with_depth(request.depth + 1)
                .with_parent(request.url.clone())
                .with_estimated_value(info.confidence)
                .with_max_retries(self.config.scheduler.max_retries)
                .with_metadata(CATEGORY_KEY, info.category.to_db_string());
            self.admit(child, info);
        }
    }

    fn is_excluded(&self, url: &str) -> bool {
        domain_of(url).is_some_and(|domain| self.exclusions.is_excluded(&domain))
    }

    /// Offers a request to the scheduler once per run
    ///
    /// # Returns
    ///
    /// `true` if the scheduler queued it
    fn admit(&self, request: CrawlRequest, info: LinkInfo) -> bool {
        let url = request.url.clone();
        if !self.seen.lock().insert(url.clone()) {
            return false;
        }

        // Registered first: a worker may finish the request before
        // add_crawl_request returns
        self.pending_links.lock().insert(url.clone(), info);
        if self.scheduler.add_crawl_request(request) {
            self.counters.lock().links_admitted += 1;
            self.metrics.increment(METRIC_LINKS_ADMITTED, 1);
            true
        } else {
            // Rejected URLs may be offered again if rediscovered
            self.pending_links.lock().remove(&url);
            self.seen.lock().remove(&url);
            self.counters.lock().links_rejected += 1;
            self.metrics.increment(METRIC_LINKS_REJECTED, 1);
            false
        }
    }

    /// Graph optimization pass
    ///
    /// Analyzes a snapshot of the graph on the blocking pool and pushes the
    /// best uncrawled targets to CRITICAL: queued ones are promoted, unseen
    /// ones are admitted at the depth limit so the target itself is crawled
    /// without expanding further. The graph write lock is only taken to store
    /// the refreshed importance scores.
    async fn optimize(&self) {
        let top = self.config.graph.top_targets;
        let snapshot = self.graph.read().clone();
        let pass = match tokio::task::spawn_blocking(move || analyze_targets(&snapshot, top)).await
        {
            Ok(pass) => pass,
            Err(e) => {
                tracing::error!("Graph analysis task failed: {}", e);
                return;
            }
        };
        let Some((scores, targets)) = pass else {
            return;
        };
        self.graph.write().apply_importance(scores);

        self.counters.lock().optimization_passes += 1;

        let mut boosted = 0;
        for (url, score) in targets {
            if self.scheduler.promote(&url, CrawlPriority::Critical) {
                boosted += 1;
                continue;
            }
            if self.seen.lock().contains(&url) || self.is_excluded(&url) {
                continue;
            }

            let info = self.classifier.classify_link(&url, "", None, &LinkContext::default());
            let request = CrawlRequest::new(url.clone(), "optimization")
                .with_priority(CrawlPriority::Critical)
                .with_depth(self.config.run.max_depth)
                .with_estimated_value(score)
                .with_max_retries(self.config.scheduler.max_retries)
                .with_metadata(CATEGORY_KEY, info.category.to_db_string());
            if self.admit(request, info) {
                // The learned prioritizer may have re-bucketed it
                self.scheduler.promote(&url, CrawlPriority::Critical);
                boosted += 1;
            }
        }
        tracing::info!("Optimization pass boosted {} targets", boosted);
    }
}

/// Runs the analysis and picks the best uncrawled targets
///
/// `None` when the graph is too small to analyze.
fn analyze_targets(
    graph: &CrawlGraph,
    top: usize,
) -> Option<(ImportanceScores, Vec<(String, f64)>)> {
    let (outcome, scores) = graph.analyze();
    match outcome {
        AnalysisOutcome::Insufficient { nodes, required } => {
            tracing::debug!(
                "Skipping optimization: {} nodes, {} required",
                nodes,
                required
            );
            return None;
        }
        AnalysisOutcome::Report(report) => {
            for recommendation in &report.recommendations {
                tracing::info!("Graph: {}", recommendation);
            }
        }
    }

    let targets = graph
        .get_high_value_targets(graph.node_count())
        .into_iter()
        .filter(|(url, _)| graph.node(url).is_some_and(|node| !node.crawled))
        .take(top)
        .collect();
    Some((scores?, targets))
}

/// Normalized, deduplicated link URLs of a page
fn normalized_links(page: &FetchedPage) -> Vec<String> {
    let mut seen = HashSet::new();
    page.links
        .iter()
        .filter_map(|link| normalize_url(&link.url).ok())
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
