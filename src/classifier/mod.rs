//! Adaptive link classifier
//!
//! Scores newly discovered links against the pattern library (or a trained
//! model once one exists), assigns a [`LinkCategory`] and maps it to a
//! [`CrawlPriority`] through a fixed table. Outcome feedback from the
//! coordinator is turned into labeled samples, and the classifier retrains
//! itself off the dispatch path once enough samples have accumulated.

mod features;
mod model;

pub use features::{is_government_host, LinkFeatures};
pub use model::{CategoryModel, CentroidModel, LinkContext, RuleBasedModel, MIN_CATEGORY_SCORE};

use crate::config::ClassifierConfig;
use crate::crawler::DiscoveredLink;
use crate::learning::{
    accuracy, train_validation_split, NearestCentroid, SampleWindow, TrainingReport,
};
use crate::state::{CrawlPriority, LinkCategory, ModelSlot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A classified link
#[derive(Debug, Clone, Serialize)]
pub struct LinkInfo {
    pub url: String,
    pub anchor_text: String,
    pub category: LinkCategory,
    pub priority: CrawlPriority,
    pub confidence: f64,
    pub features: HashMap<String, f64>,
    pub parent_url: Option<String>,
    pub depth: u32,
    pub discovered_at: DateTime<Utc>,
}

/// Maps a category and confidence to a crawl priority
///
/// | Category | ≥0.8 | ≥0.6 | otherwise |
/// |---|---|---|---|
/// | FINANCIAL_DATA, REGULATORY_FILING, BUSINESS_PROFILE | CRITICAL | HIGH | NORMAL |
/// | COMPANY_NEWS, PARTNERSHIP, CONTACT_INFO | HIGH | NORMAL | LOW |
/// | IRRELEVANT | IGNORE | IGNORE | IGNORE |
/// | anything else | LOW | LOW | LOW |
pub fn priority_for(category: LinkCategory, confidence: f64) -> CrawlPriority {
    if category == LinkCategory::Irrelevant {
        return CrawlPriority::Ignore;
    }
    if category.is_primary() {
        return if confidence >= 0.8 {
            CrawlPriority::Critical
        } else if confidence >= 0.6 {
            CrawlPriority::High
        } else {
            CrawlPriority::Normal
        };
    }
    if category.is_secondary() {
        return if confidence >= 0.8 {
            CrawlPriority::High
        } else if confidence >= 0.6 {
            CrawlPriority::Normal
        } else {
            CrawlPriority::Low
        };
    }
    CrawlPriority::Low
}

/// Snapshot of classifier activity
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassifierStats {
    pub total_classified: u64,
    pub by_category: HashMap<LinkCategory, u64>,
    pub model_name: String,
    pub trained: bool,
    pub training_samples: usize,
    pub pending_feedback: usize,
    pub promotions: u64,
    pub demotions: u64,
    pub retrains: u64,
    pub last_training: Option<TrainingReport>,
}

#[derive(Debug, Clone)]
struct Feedback {
    url: String,
    anchor_text: String,
    category: LinkCategory,
    was_successful: bool,
    extracted_value: f64,
}

#[derive(Debug)]
struct TrainingSet {
    samples: SampleWindow<(Vec<f64>, LinkCategory)>,
    added_since_retrain: usize,
}

/// The adaptive link classifier
///
/// All methods take `&self`; the classifier is shared between workers.
#[derive(Debug)]
pub struct LinkClassifier {
    config: ClassifierConfig,
    model: Arc<ModelSlot<dyn CategoryModel>>,
    training: Mutex<TrainingSet>,
    feedback: Mutex<Vec<Feedback>>,
    stats: Arc<Mutex<ClassifierStats>>,
    retraining: Arc<AtomicBool>,
}

impl LinkClassifier {
    /// Creates an untrained classifier using rule-based scoring
    pub fn new(config: ClassifierConfig) -> Self {
        let model: Arc<dyn CategoryModel> = Arc::new(RuleBasedModel);
        let stats = ClassifierStats {
            model_name: model.name().to_string(),
            ..Default::default()
        };
        let training = TrainingSet {
            samples: SampleWindow::new(config.max_training_samples),
            added_since_retrain: 0,
        };
        Self {
            config,
            model: Arc::new(ModelSlot::new(model)),
            training: Mutex::new(training),
            feedback: Mutex::new(Vec::new()),
            stats: Arc::new(Mutex::new(stats)),
            retraining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Classifies a single link
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the link
    /// * `anchor` - Anchor text (may be empty)
    /// * `parent` - URL of the page the link was found on
    /// * `context` - Depth and category of the parent page
    ///
    /// # Returns
    ///
    /// A `LinkInfo` at `context.depth + 1` (or depth 0 for a root link).
    /// With an untrained model the result depends only on the arguments.
    pub fn classify_link(
        &self,
        url: &str,
        anchor: &str,
        parent: Option<&str>,
        context: &LinkContext,
    ) -> LinkInfo {
        let features = LinkFeatures::extract(url, anchor);
        let (category, confidence) = self.model.load().predict(&features, context);
        let confidence = confidence.clamp(0.0, 1.0);

        {
            let mut stats = self.stats.lock();
            stats.total_classified += 1;
            *stats.by_category.entry(category).or_insert(0) += 1;
        }

        tracing::trace!(
            "Classified {} as {} ({:.2})",
            url,
            category,
            confidence
        );

        LinkInfo {
            url: url.to_string(),
            anchor_text: anchor.to_string(),
            category,
            priority: priority_for(category, confidence),
            confidence,
            features: features.to_map(),
            parent_url: parent.map(str::to_string),
            depth: if parent.is_some() { context.depth + 1 } else { context.depth },
            discovered_at: Utc::now(),
        }
    }

    /// Classifies a batch of links found on one page
    ///
    /// Returns the links sorted by priority, CRITICAL first. Links of equal
    /// priority keep their page order.
    pub fn classify_links_batch(
        &self,
        links: &[DiscoveredLink],
        parent: Option<&str>,
        context: &LinkContext,
    ) -> Vec<LinkInfo> {
        let mut infos: Vec<LinkInfo> = links
            .iter()
            .map(|link| self.classify_link(&link.url, &link.anchor_text, parent, context))
            .collect();
        infos.sort_by_key(|info| info.priority);
        infos
    }

    /// Adds a labeled sample
    ///
    /// # Returns
    ///
    /// `true` if this sample triggered a retrain
    pub fn add_training_data(&self, link: &LinkInfo, true_category: LinkCategory) -> bool {
        if !self.config.enable_learning {
            return false;
        }
        let features = LinkFeatures::extract(&link.url, &link.anchor_text);
        self.push_samples(vec![(features.to_vector(), true_category)])
    }

    /// Records the outcome of crawling a classified link
    ///
    /// Once `feedback_threshold` items have accumulated they are converted
    /// into training samples: good outcomes on UNKNOWN/IRRELEVANT links are
    /// promoted to the best-matching relevant category, poor outcomes are
    /// demoted to IRRELEVANT, and everything else reinforces its category.
    pub fn add_feedback(&self, link: &LinkInfo, was_successful: bool, extracted_value: f64) {
        if !self.config.enable_learning {
            return;
        }

        let batch = {
            let mut feedback = self.feedback.lock();
            feedback.push(Feedback {
                url: link.url.clone(),
                anchor_text: link.anchor_text.clone(),
                category: link.category,
                was_successful,
                extracted_value,
            });
            if feedback.len() < self.config.feedback_threshold {
                self.stats.lock().pending_feedback = feedback.len();
                return;
            }
            std::mem::take(&mut *feedback)
        };

        let mut promotions = 0u64;
        let mut demotions = 0u64;
        let mut samples = Vec::with_capacity(batch.len());

        for item in batch {
            let features = LinkFeatures::extract(&item.url, &item.anchor_text);
            let label = if item.was_successful && item.extracted_value >= 0.5 {
                if matches!(
                    item.category,
                    LinkCategory::Unknown | LinkCategory::Irrelevant
                ) {
                    promotions += 1;
                    features
                        .pattern_scores
                        .best_relevant()
                        .map(|(category, _)| category)
                        .unwrap_or(LinkCategory::BusinessProfile)
                } else {
                    item.category
                }
            } else if !item.was_successful || item.extracted_value < 0.2 {
                if item.category != LinkCategory::Irrelevant {
                    demotions += 1;
                }
                LinkCategory::Irrelevant
            } else if item.category == LinkCategory::Unknown {
                continue;
            } else {
                item.category
            };
            samples.push((features.to_vector(), label));
        }

        {
            let mut stats = self.stats.lock();
            stats.promotions += promotions;
            stats.demotions += demotions;
            stats.pending_feedback = 0;
        }

        tracing::debug!(
            "Processed classifier feedback: {} samples, {} promoted, {} demoted",
            samples.len(),
            promotions,
            demotions
        );

        self.push_samples(samples);
    }

    fn push_samples(&self, new_samples: Vec<(Vec<f64>, LinkCategory)>) -> bool {
        let snapshot = {
            let mut training = self.training.lock();
            training.added_since_retrain += new_samples.len();
            training.samples.extend(new_samples);
            self.stats.lock().training_samples = training.samples.len();

            if training.added_since_retrain < self.config.retrain_threshold {
                return false;
            }
            if self.retraining.swap(true, Ordering::AcqRel) {
                return false;
            }
            training.added_since_retrain = 0;
            training.samples.snapshot()
        };

        let model = Arc::clone(&self.model);
        let stats = Arc::clone(&self.stats);
        let retraining = Arc::clone(&self.retraining);
        let job = move || {
            let report = retrain(&snapshot, &model, &stats);
            retraining.store(false, Ordering::Release);
            report
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                job();
            }
        }
        true
    }

    /// Retrains synchronously on the retained sample window
    ///
    /// # Returns
    ///
    /// * `Some(TrainingReport)` - A new model was published
    /// * `None` - Not enough data (fewer than two categories or no samples)
    pub fn retrain_now(&self) -> Option<TrainingReport> {
        let snapshot = {
            let mut training = self.training.lock();
            training.added_since_retrain = 0;
            training.samples.snapshot()
        };
        retrain(&snapshot, &self.model, &self.stats)
    }

    /// Serializes the trained model, if one is active
    pub fn export_model(&self) -> Option<String> {
        let model = self.model.load().export()?;
        let report = self.stats.lock().last_training.clone();
        serde_json::to_string(&PersistedModel { model, report }).ok()
    }

    /// Restores a model previously produced by [`LinkClassifier::export_model`]
    pub fn import_model(&self, json: &str) -> Result<(), serde_json::Error> {
        let persisted: PersistedModel = serde_json::from_str(json)?;
        let model: CentroidModel = serde_json::from_value(persisted.model)?;

        self.model.store(Arc::new(model));

        let mut stats = self.stats.lock();
        stats.trained = true;
        stats.model_name = "nearest_centroid".to_string();
        stats.last_training = persisted.report;
        Ok(())
    }

    /// Returns true if a trained model is active
    pub fn is_trained(&self) -> bool {
        self.model.load().is_trained()
    }

    pub fn stats(&self) -> ClassifierStats {
        self.stats.lock().clone()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedModel {
    model: serde_json::Value,
    report: Option<TrainingReport>,
}

fn retrain(
    samples: &[(Vec<f64>, LinkCategory)],
    slot: &ModelSlot<dyn CategoryModel>,
    stats: &Mutex<ClassifierStats>,
) -> Option<TrainingReport> {
    let distinct: std::collections::HashSet<LinkCategory> =
        samples.iter().map(|(_, c)| *c).collect();
    if distinct.len() < 2 {
        tracing::debug!(
            "Skipping classifier retrain: {} samples across {} categories",
            samples.len(),
            distinct.len()
        );
        return None;
    }

    let (train, validation) = train_validation_split(samples);
    let centroids = NearestCentroid::fit(&train)?;

    let evaluated = if validation.is_empty() { &train } else { &validation };
    let acc = accuracy(evaluated.iter().filter_map(|(x, actual)| {
        centroids.predict(x).map(|(predicted, _)| (predicted, *actual))
    }));

    let report = TrainingReport {
        train_size: train.len(),
        validation_size: validation.len(),
        accuracy: acc,
        trained_at: Utc::now(),
    };

    let model = CentroidModel::new(centroids, train.len());
    slot.store(Arc::new(model));

    let mut stats = stats.lock();
    stats.trained = true;
    stats.model_name = "nearest_centroid".to_string();
    stats.retrains += 1;
    stats.last_training = Some(report.clone());

    tracing::info!(
        "Classifier retrained on {} samples (validation accuracy {:.2})",
        report.train_size,
        report.accuracy
    );

    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> ClassifierConfig {
        ClassifierConfig {
            confidence_threshold: 0.55,
            enable_learning: true,
            retrain_threshold: 8,
            feedback_threshold: 3,
            max_training_samples: 100,
        }
    }

    fn link(url: &str, anchor: &str) -> DiscoveredLink {
        DiscoveredLink {
            url: url.to_string(),
            anchor_text: anchor.to_string(),
        }
    }

    #[test]
    fn test_priority_mapping_table() {
        use CrawlPriority::*;
        use LinkCategory::*;

        assert_eq!(priority_for(FinancialData, 0.85), Critical);
        assert_eq!(priority_for(RegulatoryFiling, 0.6), High);
        assert_eq!(priority_for(BusinessProfile, 0.3), Normal);
        assert_eq!(priority_for(CompanyNews, 0.9), High);
        assert_eq!(priority_for(ContactInfo, 0.7), Normal);
        assert_eq!(priority_for(Partnership, 0.1), Low);
        assert_eq!(priority_for(Irrelevant, 1.0), Ignore);
        assert_eq!(priority_for(SocialMedia, 0.95), Low);
        assert_eq!(priority_for(Unknown, 0.0), Low);
    }

    #[test]
    fn test_gov_registry_seed() {
        let classifier = LinkClassifier::new(create_test_config());
        let info = classifier.classify_link(
            "https://example.gov/registry",
            "Business Registry",
            None,
            &LinkContext::default(),
        );

        assert!(matches!(
            info.category,
            LinkCategory::BusinessProfile | LinkCategory::RegulatoryFiling
        ));
        assert!(matches!(
            info.priority,
            CrawlPriority::High | CrawlPriority::Critical
        ));
        assert!(info.confidence >= 0.5);
        assert_eq!(info.depth, 0);
        assert_eq!(info.features["domain_gov"], 1.0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = LinkClassifier::new(create_test_config());
        let context = LinkContext {
            depth: 2,
            parent_category: Some(LinkCategory::BusinessProfile),
        };

        let a = classifier.classify_link(
            "https://acme.com/investors/annual-report",
            "Annual Report",
            Some("https://acme.com/"),
            &context,
        );
        let b = classifier.classify_link(
            "https://acme.com/investors/annual-report",
            "Annual Report",
            Some("https://acme.com/"),
            &context,
        );

        assert_eq!(a.category, b.category);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.priority, b.priority);
        assert_eq!(a.depth, 3);
    }

    #[test]
    fn test_priority_is_function_of_category_and_confidence() {
        let classifier = LinkClassifier::new(create_test_config());
        for (url, anchor) in [
            ("https://acme.com/contact", "Contact us"),
            ("https://acme.com/login", "Sign in"),
            ("https://acme.com/news/2024/01/launch", "Press release"),
            ("https://acme.com/zzz", ""),
        ] {
            let info = classifier.classify_link(url, anchor, None, &LinkContext::default());
            assert_eq!(info.priority, priority_for(info.category, info.confidence));
        }
    }

    #[test]
    fn test_batch_sorted_by_priority() {
        let classifier = LinkClassifier::new(create_test_config());
        let links = vec![
            link("https://acme.com/login", "Sign in"),
            link("https://acme.com/zzz", ""),
            link("https://example.gov/sec/filings", "SEC filings"),
            link("https://acme.com/contact", "Contact us"),
        ];

        let infos = classifier.classify_links_batch(&links, Some("https://acme.com/"), &LinkContext::default());

        assert_eq!(infos.len(), 4);
        assert!(infos.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert_eq!(infos[0].url, "https://example.gov/sec/filings");
        assert_eq!(infos.last().unwrap().priority, CrawlPriority::Ignore);
    }

    #[test]
    fn test_stats_count_categories() {
        let classifier = LinkClassifier::new(create_test_config());
        classifier.classify_link("https://acme.com/zzz", "", None, &LinkContext::default());
        classifier.classify_link("https://acme.com/yyy", "", None, &LinkContext::default());

        let stats = classifier.stats();
        assert_eq!(stats.total_classified, 2);
        assert_eq!(stats.by_category[&LinkCategory::Unknown], 2);
        assert_eq!(stats.model_name, "rule_based");
        assert!(!stats.trained);
    }

    fn labeled(classifier: &LinkClassifier) -> Vec<(LinkInfo, LinkCategory)> {
        let ctx = LinkContext::default();
        vec![
            (classifier.classify_link("https://acme.com/investors", "Investors", None, &ctx), LinkCategory::FinancialData),
            (classifier.classify_link("https://acme.com/financials/2023.pdf", "Annual report", None, &ctx), LinkCategory::FinancialData),
            (classifier.classify_link("https://acme.com/earnings", "Quarterly earnings", None, &ctx), LinkCategory::FinancialData),
            (classifier.classify_link("https://acme.com/shareholders", "Stock info", None, &ctx), LinkCategory::FinancialData),
            (classifier.classify_link("https://acme.com/contact", "Contact us", None, &ctx), LinkCategory::ContactInfo),
            (classifier.classify_link("mailto:info@acme.com", "Email", None, &ctx), LinkCategory::ContactInfo),
            (classifier.classify_link("https://acme.com/locations", "Our offices", None, &ctx), LinkCategory::ContactInfo),
            (classifier.classify_link("tel:+15551234567", "Call us", None, &ctx), LinkCategory::ContactInfo),
        ]
    }

    #[test]
    fn test_training_threshold_triggers_retrain() {
        let classifier = LinkClassifier::new(create_test_config());
        let samples = labeled(&classifier);

        let mut triggered = Vec::new();
        for (info, category) in &samples {
            triggered.push(classifier.add_training_data(info, *category));
        }

        // retrain_threshold = 8: only the eighth sample triggers
        assert_eq!(triggered.iter().filter(|t| **t).count(), 1);
        assert!(triggered[7]);

        // No runtime in a plain #[test], so retraining ran inline
        let stats = classifier.stats();
        assert!(stats.trained);
        assert_eq!(stats.retrains, 1);
        let report = stats.last_training.unwrap();
        assert_eq!(report.train_size, 7);
        assert_eq!(report.validation_size, 1);
        assert!(classifier.is_trained());
    }

    #[test]
    fn test_single_category_does_not_train() {
        let classifier = LinkClassifier::new(create_test_config());
        for (info, _) in labeled(&classifier) {
            classifier.add_training_data(&info, LinkCategory::FinancialData);
        }
        assert!(!classifier.is_trained());
        assert!(classifier.retrain_now().is_none());
    }

    #[test]
    fn test_trained_model_predicts_learned_categories() {
        let classifier = LinkClassifier::new(create_test_config());
        for (info, category) in labeled(&classifier) {
            classifier.add_training_data(&info, category);
        }

        let info = classifier.classify_link(
            "https://acme.com/investor-relations/earnings",
            "Investors",
            None,
            &LinkContext::default(),
        );
        assert_eq!(info.category, LinkCategory::FinancialData);
        assert_eq!(info.priority, priority_for(info.category, info.confidence));
    }

    #[test]
    fn test_learning_disabled_ignores_samples() {
        let mut config = create_test_config();
        config.enable_learning = false;
        let classifier = LinkClassifier::new(config);

        for (info, category) in labeled(&classifier) {
            assert!(!classifier.add_training_data(&info, category));
        }
        assert_eq!(classifier.stats().training_samples, 0);
    }

    #[test]
    fn test_training_window_is_bounded() {
        let config = ClassifierConfig {
            retrain_threshold: 1_000,
            max_training_samples: 4,
            ..create_test_config()
        };
        let classifier = LinkClassifier::new(config);
        let info = classifier.classify_link("https://acme.com/contact", "Contact us", None, &LinkContext::default());

        for _ in 0..10 {
            classifier.add_training_data(&info, LinkCategory::ContactInfo);
        }
        assert_eq!(classifier.stats().training_samples, 4);
    }

    #[test]
    fn test_feedback_promotes_and_demotes() {
        let classifier = LinkClassifier::new(create_test_config());
        let ctx = LinkContext::default();

        let unknown = classifier.classify_link("https://acme.com/zzz", "Company overview", None, &ctx);
        let unknown = LinkInfo {
            category: LinkCategory::Unknown,
            ..unknown
        };
        let news = classifier.classify_link("https://acme.com/news", "News", None, &ctx);
        let dud = classifier.classify_link("https://acme.com/partners", "Partners", None, &ctx);

        classifier.add_feedback(&unknown, true, 0.9);
        classifier.add_feedback(&news, true, 0.35);
        assert_eq!(classifier.stats().pending_feedback, 2);

        classifier.add_feedback(&dud, false, 0.0);

        let stats = classifier.stats();
        assert_eq!(stats.pending_feedback, 0);
        assert_eq!(stats.promotions, 1);
        assert_eq!(stats.demotions, 1);
        assert_eq!(stats.training_samples, 3);
    }

    #[test]
    fn test_model_export_import() {
        let classifier = LinkClassifier::new(create_test_config());
        assert!(classifier.export_model().is_none());

        for (info, category) in labeled(&classifier) {
            classifier.add_training_data(&info, category);
        }
        let json = classifier.export_model().unwrap();

        let restored = LinkClassifier::new(create_test_config());
        restored.import_model(&json).unwrap();
        assert!(restored.is_trained());

        let ctx = LinkContext::default();
        let a = classifier.classify_link("https://acme.com/contact", "Contact", None, &ctx);
        let b = restored.classify_link("https://acme.com/contact", "Contact", None, &ctx);
        assert_eq!(a.category, b.category);
        assert!((a.confidence - b.confidence).abs() < 1e-9);

        assert!(restored.import_model("{not json").is_err());
    }
}
