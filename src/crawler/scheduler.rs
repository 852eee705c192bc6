//! Priority crawl scheduler
//!
//! This module handles:
//! - Five FIFO tiers dequeued in strict CRITICAL → BACKGROUND order
//! - Queue admission control (max queue size)
//! - The in-flight limit (max concurrent crawls)
//! - Retries with demotion to LOW, and permanent failures
//! - Per-URL and per-domain crawl statistics
//! - The learned prioritizer and its periodic retraining

use crate::config::SchedulerConfig;
use crate::crawler::prioritizer::{training_target, PriorityFeatures};
use crate::crawler::CrawlRequest;
use crate::graph::SharedGraph;
use crate::learning::{
    train_validation_split, ConstantModel, LinearModel, PriorityModel, SampleWindow,
    TrainingReport,
};
use crate::state::{CrawlPriority, CrawlStats, ModelSlot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A request that will never be queued again
#[derive(Debug, Clone, Serialize)]
pub struct FailedRequest {
    pub request: CrawlRequest,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Point-in-time scheduler counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStats {
    /// Queued requests per tier, CRITICAL first
    pub queued_by_tier: [usize; 5],
    pub total_queued: usize,
    pub active: usize,
    pub admitted: u64,
    pub rejected: u64,
    pub completed: u64,
    pub succeeded: u64,
    pub retried: u64,
    pub permanently_failed: u64,
    pub promoted: u64,
    pub retrains: u64,
    pub prioritizer: String,
    pub prioritizer_trained: bool,
    pub training_samples: usize,
    pub last_training: Option<TrainingReport>,
}

#[derive(Debug, Default)]
struct Queues {
    tiers: [VecDeque<CrawlRequest>; 5],
    active: HashMap<String, CrawlRequest>,
    url_stats: HashMap<String, CrawlStats>,
    domain_stats: HashMap<String, CrawlStats>,
    failed: HashMap<String, FailedRequest>,
    stats: SchedulerStats,
}

impl Queues {
    fn queued(&self) -> usize {
        self.tiers.iter().map(VecDeque::len).sum()
    }

    fn push(&mut self, request: CrawlRequest) {
        // Ignore never reaches here; fall back to BACKGROUND rather than panic
        let tier = request.priority.tier_index().unwrap_or(4);
        self.tiers[tier].push_back(request);
    }
}

#[derive(Debug)]
struct PrioritizerTraining {
    samples: SampleWindow<(Vec<f64>, f64)>,
    since_retrain: u32,
}

/// Scheduler shared by all workers
///
/// Every method takes `&self`. Lock order is graph (read) before the queue
/// lock; the scheduler never holds the queue lock while acquiring the graph.
pub struct Scheduler {
    config: SchedulerConfig,
    queues: Mutex<Queues>,
    graph: Option<SharedGraph>,
    prioritizer: Arc<ModelSlot<dyn PriorityModel>>,
    training: Mutex<PrioritizerTraining>,
    last_training: Arc<Mutex<Option<TrainingReport>>>,
    retrains: Arc<Mutex<u64>>,
    retraining: Arc<AtomicBool>,
}

impl Scheduler {
    /// Creates a scheduler with the constant fallback prioritizer
    pub fn new(config: SchedulerConfig) -> Self {
        let model: Arc<dyn PriorityModel> = Arc::new(ConstantModel);
        let training = PrioritizerTraining {
            samples: SampleWindow::new(config.max_training_samples),
            since_retrain: 0,
        };
        Self {
            config,
            queues: Mutex::new(Queues::default()),
            graph: None,
            prioritizer: Arc::new(ModelSlot::new(model)),
            training: Mutex::new(training),
            last_training: Arc::new(Mutex::new(None)),
            retrains: Arc::new(Mutex::new(0)),
            retraining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Attaches the crawl graph used for degree and importance features
    pub fn with_graph(mut self, graph: SharedGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Replaces the prioritizer model
    pub fn set_prioritizer(&self, model: Arc<dyn PriorityModel>) {
        self.prioritizer.store(model);
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn features(&self, request: &CrawlRequest, domain: Option<&CrawlStats>) -> Vec<f64> {
        match &self.graph {
            Some(graph) => {
                let graph = graph.read();
                PriorityFeatures::collect(request, domain, Some(&graph)).to_vector()
            }
            None => PriorityFeatures::collect(request, domain, None).to_vector(),
        }
    }

    /// Admits a request into its tier
    ///
    /// # Returns
    ///
    /// * `true` - The request was queued
    /// * `false` - The queue is full or the request has IGNORE priority
    pub fn add_crawl_request(&self, mut request: CrawlRequest) -> bool {
        if !request.priority.is_queueable() {
            tracing::debug!("Rejected {}: priority {}", request.url, request.priority);
            self.queues.lock().stats.rejected += 1;
            return false;
        }

        let model = self.prioritizer.load();
        let learned = self.config.enable_learned_scoring && model.is_trained();

        // Graph features are gathered before the queue lock is taken
        let graph_guard = if learned {
            self.graph.as_ref().map(|g| g.read())
        } else {
            None
        };

        let mut queues = self.queues.lock();
        if queues.queued() >= self.config.max_queue_size {
            tracing::debug!(
                "Rejected {}: queue full ({})",
                request.url,
                self.config.max_queue_size
            );
            queues.stats.rejected += 1;
            return false;
        }

        if learned {
            let domain = queues.domain_stats.get(&request.domain());
            let features =
                PriorityFeatures::collect(&request, domain, graph_guard.as_deref()).to_vector();
            let predicted = model.predict(&features);
            let priority = CrawlPriority::from_score(predicted);
            tracing::trace!(
                "Prioritizer scored {} at {:.2} ({} -> {})",
                request.url,
                predicted,
                request.priority,
                priority
            );
            request.priority = priority;
        }
        drop(graph_guard);

        tracing::trace!("Queued {} at {}", request.url, request.priority);
        queues.push(request);
        queues.stats.admitted += 1;
        true
    }

    /// Pops the next request to dispatch
    ///
    /// # Returns
    ///
    /// * `Some(CrawlRequest)` - Head of the most urgent non-empty tier, now active
    /// * `None` - At the concurrency limit, or nothing queued
    pub fn get_next_crawl_request(&self) -> Option<CrawlRequest> {
        let mut queues = self.queues.lock();
        if queues.active.len() >= self.config.max_concurrent_crawls as usize {
            return None;
        }

        let request = queues.tiers.iter_mut().find_map(VecDeque::pop_front)?;
        queues.active.insert(request.url.clone(), request.clone());
        Some(request)
    }

    /// Records a finished request
    ///
    /// Unknown URLs (not active) still update statistics.
    ///
    /// # Arguments
    ///
    /// * `url` - The dispatched URL
    /// * `success` - Whether extraction succeeded
    /// * `response_time` - Fetch time in seconds
    /// * `data_quality` - Extraction confidence in [0, 1]
    /// * `extracted_links` - Links found on the page
    pub fn complete_crawl_request(
        &self,
        url: &str,
        success: bool,
        response_time: f64,
        data_quality: f64,
        extracted_links: &[String],
    ) {
        let (request, domain_before) = {
            let mut queues = self.queues.lock();
            let request = queues.active.remove(url);
            let domain_before = request
                .as_ref()
                .and_then(|r| queues.domain_stats.get(&r.domain()).cloned());
            (request, domain_before)
        };

        // Features see the domain as it was at dispatch time
        let features = request
            .as_ref()
            .map(|r| self.features(r, domain_before.as_ref()));

        {
            let mut queues = self.queues.lock();
            let domain = request
                .as_ref()
                .map(CrawlRequest::domain)
                .unwrap_or_else(|| crate::url::domain_of(url).unwrap_or_default());
            queues
                .url_stats
                .entry(url.to_string())
                .or_default()
                .record_completion(success, response_time, data_quality);
            queues
                .domain_stats
                .entry(domain)
                .or_default()
                .record_completion(success, response_time, data_quality);

            queues.stats.completed += 1;
            if success {
                queues.stats.succeeded += 1;
            }
        }

        if let Some(features) = features {
            let target = training_target(success, data_quality, extracted_links.len());
            self.record_sample((features, target));
        }
    }

    /// Records a failed attempt
    ///
    /// The request is re-queued at LOW while `retry_count <= max_retries`
    /// after incrementing, otherwise it is permanently failed.
    ///
    /// # Returns
    ///
    /// `true` if the request was re-queued
    pub fn fail_crawl_request(&self, url: &str, error: &str) -> bool {
        let mut queues = self.queues.lock();
        let Some(mut request) = queues.active.remove(url) else {
            tracing::debug!("Failure reported for inactive {}: {}", url, error);
            return false;
        };

        record_failure(&mut queues, &request);
        request.retry_count += 1;

        if request.retry_count <= request.max_retries {
            tracing::debug!(
                "Retrying {} ({}/{}) at LOW: {}",
                url,
                request.retry_count,
                request.max_retries,
                error
            );
            request.priority = CrawlPriority::Low;
            queues.push(request);
            queues.stats.retried += 1;
            true
        } else {
            tracing::warn!("Giving up on {} after {} attempts: {}", url, request.retry_count, error);
            mark_failed(&mut queues, request, error);
            false
        }
    }

    /// Permanently fails an active request without retrying
    pub fn abandon_crawl_request(&self, url: &str, error: &str) {
        let mut queues = self.queues.lock();
        if let Some(request) = queues.active.remove(url) {
            record_failure(&mut queues, &request);
            tracing::debug!("Abandoned {}: {}", url, error);
            mark_failed(&mut queues, request, error);
        }
    }

    /// Puts a dispatched request back at the head of its tier
    ///
    /// Unlike [`Scheduler::fail_crawl_request`] this does not count an
    /// attempt; the request was never fetched.
    pub fn return_crawl_request(&self, request: CrawlRequest) {
        let mut queues = self.queues.lock();
        if queues.active.remove(&request.url).is_none() {
            return;
        }
        let tier = request.priority.tier_index().unwrap_or(4);
        queues.tiers[tier].push_front(request);
    }

    /// Moves a queued request into a more urgent tier
    ///
    /// # Returns
    ///
    /// `true` if the request was queued and is now at `priority`
    pub fn promote(&self, url: &str, priority: CrawlPriority) -> bool {
        let Some(target) = priority.tier_index() else {
            return false;
        };
        let mut queues = self.queues.lock();
        for tier in (target + 1)..queues.tiers.len() {
            if let Some(pos) = queues.tiers[tier].iter().position(|r| r.url == url) {
                if let Some(mut request) = queues.tiers[tier].remove(pos) {
                    request.priority = priority;
                    queues.tiers[target].push_back(request);
                    queues.stats.promoted += 1;
                    return true;
                }
            }
        }
        queues.tiers[target].iter().any(|r| r.url == url)
    }

    /// Whether `url` is waiting in any tier
    pub fn is_queued(&self, url: &str) -> bool {
        self.queues
            .lock()
            .tiers
            .iter()
            .any(|tier| tier.iter().any(|r| r.url == url))
    }

    pub fn queued_len(&self) -> usize {
        self.queues.lock().queued()
    }

    pub fn active_len(&self) -> usize {
        self.queues.lock().active.len()
    }

    /// Nothing queued and nothing in flight
    pub fn is_idle(&self) -> bool {
        let queues = self.queues.lock();
        queues.active.is_empty() && queues.queued() == 0
    }

    pub fn url_stats(&self, url: &str) -> Option<CrawlStats> {
        self.queues.lock().url_stats.get(url).cloned()
    }

    pub fn domain_stats(&self, domain: &str) -> Option<CrawlStats> {
        self.queues.lock().domain_stats.get(domain).cloned()
    }

    pub fn failed_requests(&self) -> Vec<FailedRequest> {
        let mut failed: Vec<_> = self.queues.lock().failed.values().cloned().collect();
        failed.sort_by(|a, b| a.failed_at.cmp(&b.failed_at));
        failed
    }

    pub fn stats(&self) -> SchedulerStats {
        let model = self.prioritizer.load();
        let samples = self.training.lock().samples.len();
        let queues = self.queues.lock();
        let mut stats = queues.stats.clone();
        for (i, tier) in queues.tiers.iter().enumerate() {
            stats.queued_by_tier[i] = tier.len();
        }
        stats.total_queued = queues.queued();
        stats.active = queues.active.len();
        stats.retrains = *self.retrains.lock();
        stats.prioritizer = model.name().to_string();
        stats.prioritizer_trained = model.is_trained();
        stats.training_samples = samples;
        stats.last_training = self.last_training.lock().clone();
        stats
    }

    fn record_sample(&self, sample: (Vec<f64>, f64)) {
        let snapshot = {
            let mut training = self.training.lock();
            training.samples.push(sample);
            training.since_retrain += 1;

            if !self.config.enable_learned_scoring
                || training.since_retrain < self.config.model_update_interval
            {
                return;
            }
            if self.retraining.swap(true, Ordering::AcqRel) {
                return;
            }
            training.since_retrain = 0;
            training.samples.snapshot()
        };

        let slot = Arc::clone(&self.prioritizer);
        let last_training = Arc::clone(&self.last_training);
        let retrains = Arc::clone(&self.retrains);
        let retraining = Arc::clone(&self.retraining);
        let job = move || {
            if let Some(report) = retrain(&snapshot, &slot) {
                *retrains.lock() += 1;
                *last_training.lock() = Some(report);
            }
            retraining.store(false, Ordering::Release);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => job(),
        }
    }

    /// Retrains the prioritizer synchronously on the retained sample window
    pub fn retrain_prioritizer_now(&self) -> Option<TrainingReport> {
        let snapshot = {
            let mut training = self.training.lock();
            training.since_retrain = 0;
            training.samples.snapshot()
        };
        let report = retrain(&snapshot, &self.prioritizer)?;
        *self.retrains.lock() += 1;
        *self.last_training.lock() = Some(report.clone());
        Some(report)
    }

    /// Serializes the prioritizer if a trained model is active
    pub fn export_prioritizer(&self) -> Option<String> {
        let model = self.prioritizer.load().export()?;
        serde_json::to_string(&PersistedPrioritizer {
            model,
            report: self.last_training.lock().clone(),
        })
        .ok()
    }

    /// Restores a prioritizer produced by [`Scheduler::export_prioritizer`]
    pub fn import_prioritizer(&self, json: &str) -> Result<(), serde_json::Error> {
        let persisted: PersistedPrioritizer = serde_json::from_str(json)?;
        let model: LinearModel = serde_json::from_value(persisted.model)?;
        self.prioritizer.store(Arc::new(model));
        *self.last_training.lock() = persisted.report;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedPrioritizer {
    model: serde_json::Value,
    report: Option<TrainingReport>,
}

fn record_failure(queues: &mut Queues, request: &CrawlRequest) {
    queues
        .url_stats
        .entry(request.url.clone())
        .or_default()
        .record_failure();
    queues
        .domain_stats
        .entry(request.domain())
        .or_default()
        .record_failure();
}

fn mark_failed(queues: &mut Queues, request: CrawlRequest, error: &str) {
    queues.stats.permanently_failed += 1;
    queues.failed.insert(
        request.url.clone(),
        FailedRequest {
            request,
            error: error.to_string(),
            failed_at: Utc::now(),
        },
    );
}

fn retrain(
    samples: &[(Vec<f64>, f64)],
    slot: &ModelSlot<dyn PriorityModel>,
) -> Option<TrainingReport> {
    let (train, validation) = train_validation_split(samples);
    let Some(model) = LinearModel::fit(&train) else {
        tracing::debug!("Skipping prioritizer retrain: {} samples", samples.len());
        return None;
    };

    let evaluated = if validation.is_empty() { &train } else { &validation };
    let report = TrainingReport {
        train_size: train.len(),
        validation_size: validation.len(),
        accuracy: 1.0 - model.mean_squared_error(evaluated),
        trained_at: Utc::now(),
    };

    tracing::info!(
        "Prioritizer retrained on {} samples (score {:.3})",
        report.train_size,
        report.accuracy
    );
    slot.store(Arc::new(model));
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::graph::CrawlGraph;

    fn create_test_config() -> SchedulerConfig {
        SchedulerConfig {
            max_concurrent_crawls: 10,
            max_queue_size: 100,
            enable_learned_scoring: true,
            model_update_interval: 1000,
            max_retries: 3,
            max_training_samples: 1000,
        }
    }

    fn request(url: &str, priority: CrawlPriority) -> CrawlRequest {
        CrawlRequest::new(url, "test").with_priority(priority)
    }

    /// Prioritizer that scores every URL the same
    #[derive(Debug)]
    struct FixedModel(f64);

    impl PriorityModel for FixedModel {
        fn predict(&self, _features: &[f64]) -> f64 {
            self.0
        }

        fn is_trained(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_tier_ordering_and_fifo() {
        let scheduler = Scheduler::new(create_test_config());
        assert!(scheduler.add_crawl_request(request("https://a.com/low", CrawlPriority::Low)));
        assert!(scheduler.add_crawl_request(request("https://a.com/high1", CrawlPriority::High)));
        assert!(scheduler.add_crawl_request(request("https://a.com/crit", CrawlPriority::Critical)));
        assert!(scheduler.add_crawl_request(request("https://a.com/high2", CrawlPriority::High)));
        assert!(scheduler.add_crawl_request(request("https://a.com/bg", CrawlPriority::Background)));

        let order: Vec<String> = std::iter::from_fn(|| scheduler.get_next_crawl_request())
            .map(|r| r.url)
            .collect();
        assert_eq!(
            order,
            vec![
                "https://a.com/crit",
                "https://a.com/high1",
                "https://a.com/high2",
                "https://a.com/low",
                "https://a.com/bg",
            ]
        );
        assert_eq!(scheduler.active_len(), 5);
    }

    #[test]
    fn test_returned_request_keeps_its_place() {
        let scheduler = Scheduler::new(create_test_config());
        scheduler.add_crawl_request(request("https://a.com/1", CrawlPriority::High));
        scheduler.add_crawl_request(request("https://a.com/2", CrawlPriority::High));

        let first = scheduler.get_next_crawl_request().unwrap();
        assert_eq!(scheduler.active_len(), 1);
        scheduler.return_crawl_request(first);

        assert_eq!(scheduler.active_len(), 0);
        assert_eq!(scheduler.queued_len(), 2);
        let again = scheduler.get_next_crawl_request().unwrap();
        assert_eq!(again.url, "https://a.com/1");
        assert_eq!(again.retry_count, 0);
        assert_eq!(scheduler.stats().retried, 0);
    }

    #[test]
    fn test_queue_full_rejects() {
        let config = SchedulerConfig {
            max_queue_size: 2,
            ..create_test_config()
        };
        let scheduler = Scheduler::new(config);
        assert!(scheduler.add_crawl_request(request("https://a.com/1", CrawlPriority::Normal)));
        assert!(scheduler.add_crawl_request(request("https://a.com/2", CrawlPriority::Normal)));
        assert!(!scheduler.add_crawl_request(request("https://a.com/3", CrawlPriority::Critical)));

        assert_eq!(scheduler.queued_len(), 2);
        assert_eq!(scheduler.stats().rejected, 1);
    }

    #[test]
    fn test_ignore_priority_rejected() {
        let scheduler = Scheduler::new(create_test_config());
        assert!(!scheduler.add_crawl_request(request("https://a.com/", CrawlPriority::Ignore)));
        assert_eq!(scheduler.queued_len(), 0);
    }

    #[test]
    fn test_concurrency_limit() {
        let config = SchedulerConfig {
            max_concurrent_crawls: 1,
            ..create_test_config()
        };
        let scheduler = Scheduler::new(config);
        scheduler.add_crawl_request(request("https://a.com/1", CrawlPriority::Normal));
        scheduler.add_crawl_request(request("https://a.com/2", CrawlPriority::Normal));

        let first = scheduler.get_next_crawl_request().unwrap();
        assert!(scheduler.get_next_crawl_request().is_none());

        scheduler.complete_crawl_request(&first.url, true, 0.5, 0.8, &[]);
        assert_eq!(scheduler.get_next_crawl_request().unwrap().url, "https://a.com/2");
    }

    #[test]
    fn test_retry_cap() {
        let scheduler = Scheduler::new(create_test_config());
        scheduler.add_crawl_request(request("https://a.com/flaky", CrawlPriority::Critical).with_max_retries(3));

        let mut requeues = 0;
        for attempt in 1..=4 {
            let req = scheduler.get_next_crawl_request().unwrap();
            if attempt > 1 {
                assert_eq!(req.priority, CrawlPriority::Low);
            }
            if scheduler.fail_crawl_request(&req.url, "timeout") {
                requeues += 1;
            }
        }

        assert_eq!(requeues, 3);
        assert!(scheduler.get_next_crawl_request().is_none());
        assert!(scheduler.is_idle());

        let failed = scheduler.failed_requests();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].request.retry_count, 4);
        assert_eq!(failed[0].error, "timeout");

        let stats = scheduler.stats();
        assert_eq!(stats.retried, 3);
        assert_eq!(stats.permanently_failed, 1);

        let domain = scheduler.domain_stats("a.com").unwrap();
        assert_eq!(domain.failed, 4);
        assert_eq!(domain.success_rate, 0.0);
    }

    #[test]
    fn test_abandon_skips_retry() {
        let scheduler = Scheduler::new(create_test_config());
        scheduler.add_crawl_request(request("https://a.com/private", CrawlPriority::High));
        let req = scheduler.get_next_crawl_request().unwrap();

        scheduler.abandon_crawl_request(&req.url, "disallowed by robots.txt");

        assert!(scheduler.is_idle());
        assert_eq!(scheduler.failed_requests()[0].request.retry_count, 0);
    }

    #[test]
    fn test_completion_updates_stats() {
        let scheduler = Scheduler::new(create_test_config());
        scheduler.add_crawl_request(request("https://www.a.com/1", CrawlPriority::Normal));
        scheduler.add_crawl_request(request("https://a.com/2", CrawlPriority::Normal));

        let r1 = scheduler.get_next_crawl_request().unwrap();
        let r2 = scheduler.get_next_crawl_request().unwrap();
        scheduler.complete_crawl_request(&r1.url, true, 1.0, 0.9, &[]);
        scheduler.complete_crawl_request(&r2.url, false, 3.0, 0.1, &[]);

        let domain = scheduler.domain_stats("a.com").unwrap();
        assert_eq!(domain.total, 2);
        assert!((domain.avg_response_time - 2.0).abs() < 1e-9);
        assert!((domain.success_rate - 0.5).abs() < 1e-9);
        assert!((domain.avg_quality - 0.5).abs() < 1e-9);

        assert_eq!(scheduler.url_stats("https://a.com/2").unwrap().failed, 1);
        let stats = scheduler.stats();
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.training_samples, 2);
    }

    #[test]
    fn test_promote() {
        let scheduler = Scheduler::new(create_test_config());
        scheduler.add_crawl_request(request("https://a.com/1", CrawlPriority::High));
        scheduler.add_crawl_request(request("https://a.com/2", CrawlPriority::Low));

        assert!(scheduler.promote("https://a.com/2", CrawlPriority::Critical));
        assert!(!scheduler.promote("https://a.com/missing", CrawlPriority::Critical));

        let next = scheduler.get_next_crawl_request().unwrap();
        assert_eq!(next.url, "https://a.com/2");
        assert_eq!(next.priority, CrawlPriority::Critical);
    }

    #[test]
    fn test_untrained_prioritizer_keeps_priority() {
        let scheduler = Scheduler::new(create_test_config());
        scheduler.add_crawl_request(request("https://a.com/", CrawlPriority::Background));
        assert_eq!(
            scheduler.get_next_crawl_request().unwrap().priority,
            CrawlPriority::Background
        );
    }

    #[test]
    fn test_trained_prioritizer_overwrites_priority() {
        let scheduler = Scheduler::new(create_test_config());
        scheduler.set_prioritizer(Arc::new(FixedModel(0.85)));
        scheduler.add_crawl_request(request("https://a.com/", CrawlPriority::Background));

        assert_eq!(
            scheduler.get_next_crawl_request().unwrap().priority,
            CrawlPriority::Critical
        );
    }

    #[test]
    fn test_learned_scoring_disabled() {
        let config = SchedulerConfig {
            enable_learned_scoring: false,
            ..create_test_config()
        };
        let scheduler = Scheduler::new(config);
        scheduler.set_prioritizer(Arc::new(FixedModel(0.0)));
        scheduler.add_crawl_request(request("https://a.com/", CrawlPriority::High));

        assert_eq!(
            scheduler.get_next_crawl_request().unwrap().priority,
            CrawlPriority::High
        );
    }

    #[test]
    fn test_prioritizer_reads_graph() {
        let graph = CrawlGraph::shared(GraphConfig::default());
        graph.write().add_crawl_result(
            "https://a.com/",
            None,
            &["https://a.com/next".to_string()],
            true,
            1.0,
            1.0,
            std::collections::HashMap::new(),
        );
        let scheduler = Scheduler::new(create_test_config()).with_graph(graph);
        scheduler.set_prioritizer(Arc::new(FixedModel(0.45)));

        assert!(scheduler.add_crawl_request(request("https://a.com/next", CrawlPriority::Low)));
        assert_eq!(
            scheduler.get_next_crawl_request().unwrap().priority,
            CrawlPriority::Normal
        );
    }

    #[test]
    fn test_training_window_is_bounded() {
        let config = SchedulerConfig {
            max_training_samples: 5,
            ..create_test_config()
        };
        let scheduler = Scheduler::new(config);

        for i in 0..8 {
            let url = format!("https://a.com/page/{}", i);
            scheduler.add_crawl_request(request(&url, CrawlPriority::Normal));
            let req = scheduler.get_next_crawl_request().unwrap();
            scheduler.complete_crawl_request(&req.url, true, 1.0, 0.8, &[]);
        }

        assert_eq!(scheduler.stats().training_samples, 5);
    }

    #[test]
    fn test_periodic_retrain_publishes_linear_model() {
        let config = SchedulerConfig {
            model_update_interval: 12,
            ..create_test_config()
        };
        let scheduler = Scheduler::new(config);

        for i in 0..12 {
            let url = format!("https://a.com/page/{}", i);
            scheduler.add_crawl_request(request(&url, CrawlPriority::Normal).with_depth(i % 3));
            let req = scheduler.get_next_crawl_request().unwrap();
            let success = i % 2 == 0;
            scheduler.complete_crawl_request(&req.url, success, 1.0, 0.8, &[]);
        }

        // No runtime here, so the retrain ran inline
        let stats = scheduler.stats();
        assert_eq!(stats.retrains, 1);
        assert!(stats.prioritizer_trained);
        assert_eq!(stats.prioritizer, "linear");
        assert_eq!(stats.last_training.unwrap().train_size, 10);
    }

    #[test]
    fn test_retrain_needs_samples() {
        let scheduler = Scheduler::new(create_test_config());
        assert!(scheduler.retrain_prioritizer_now().is_none());
        assert!(scheduler.export_prioritizer().is_none());
    }

    #[test]
    fn test_export_import_prioritizer() {
        let scheduler = Scheduler::new(create_test_config());
        for i in 0..15 {
            let url = format!("https://a.com/{}", i);
            scheduler.add_crawl_request(request(&url, CrawlPriority::Normal).with_depth(i % 4));
            let req = scheduler.get_next_crawl_request().unwrap();
            scheduler.complete_crawl_request(&req.url, i % 3 != 0, 1.0, 0.7, &[]);
        }
        assert!(scheduler.retrain_prioritizer_now().is_some());

        let json = scheduler.export_prioritizer().unwrap();
        let restored = Scheduler::new(create_test_config());
        restored.import_prioritizer(&json).unwrap();

        let stats = restored.stats();
        assert!(stats.prioritizer_trained);
        assert!(stats.last_training.is_some());
        assert!(restored.import_prioritizer("not json").is_err());
    }
}
