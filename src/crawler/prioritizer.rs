//! Feature vectors for the learned prioritizer

use crate::crawler::CrawlRequest;
use crate::graph::CrawlGraph;
use crate::state::CrawlStats;
use url::Url;

/// Number of entries in [`PriorityFeatures::to_vector`]
pub const FEATURE_COUNT: usize = 12;

/// What the scheduler knows about a request when it is admitted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorityFeatures {
    pub depth: u32,
    pub url_length: usize,
    pub path_segments: usize,
    pub looks_like_document: bool,
    pub looks_like_page: bool,
    pub domain_success_rate: f64,
    pub domain_avg_response_time: f64,
    pub domain_avg_quality: f64,
    pub in_degree: usize,
    pub out_degree: usize,
    pub importance: f64,
    pub estimated_value: f64,
}

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "xls", "xlsx", "csv", "doc", "docx"];
const PAGE_EXTENSIONS: &[&str] = &["", "html", "htm", "php", "asp", "aspx", "jsp"];

impl PriorityFeatures {
    /// Gathers features for `request`
    ///
    /// `domain` stats and `graph` are optional; missing sources contribute zeros.
    pub fn collect(
        request: &CrawlRequest,
        domain: Option<&CrawlStats>,
        graph: Option<&CrawlGraph>,
    ) -> Self {
        let parsed = Url::parse(&request.url).ok();
        let path = parsed.as_ref().map(|u| u.path()).unwrap_or("");
        let extension = path
            .rsplit('/')
            .next()
            .map(|last| {
                last.rsplit_once('.')
                    .map(|(_, ext)| ext.to_lowercase())
                    .unwrap_or_default()
            })
            .unwrap_or_default();

        let mut features = Self {
            depth: request.depth,
            url_length: request.url.len(),
            path_segments: path.split('/').filter(|s| !s.is_empty()).count(),
            looks_like_document: DOCUMENT_EXTENSIONS.contains(&extension.as_str()),
            looks_like_page: PAGE_EXTENSIONS.contains(&extension.as_str()),
            estimated_value: request.estimated_value,
            ..Default::default()
        };

        if let Some(stats) = domain {
            features.domain_success_rate = stats.success_rate;
            features.domain_avg_response_time = stats.avg_response_time;
            features.domain_avg_quality = stats.avg_quality;
        }

        if let Some(graph) = graph {
            features.in_degree = graph.in_degree(&request.url);
            features.out_degree = graph.out_degree(&request.url);
            features.importance = graph.importance(&request.url);
        }

        features
    }

    /// Dense vector with each entry scaled to roughly [0, 1]
    pub fn to_vector(&self) -> Vec<f64> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        vec![
            (self.depth as f64 / 10.0).min(1.0),
            (self.url_length as f64 / 200.0).min(1.0),
            (self.path_segments as f64 / 10.0).min(1.0),
            flag(self.looks_like_document),
            flag(self.looks_like_page),
            self.domain_success_rate,
            (self.domain_avg_response_time / 10.0).min(1.0),
            self.domain_avg_quality,
            (self.in_degree as f64 / 20.0).min(1.0),
            (self.out_degree as f64 / 50.0).min(1.0),
            self.importance.clamp(0.0, 1.0),
            self.estimated_value,
        ]
    }
}

/// Training target for a finished request
///
/// `0` for failures, otherwise `0.7 * quality + 0.3 * min(links / 20, 1)`.
pub fn training_target(success: bool, data_quality: f64, links_found: usize) -> f64 {
    if !success {
        return 0.0;
    }
    0.7 * data_quality.clamp(0.0, 1.0) + 0.3 * (links_found as f64 / 20.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use std::collections::HashMap;

    #[test]
    fn test_collect_without_context() {
        let req = CrawlRequest::new("https://example.com/reports/annual.pdf", "t").with_depth(2);
        let features = PriorityFeatures::collect(&req, None, None);

        assert_eq!(features.depth, 2);
        assert_eq!(features.path_segments, 2);
        assert!(features.looks_like_document);
        assert!(!features.looks_like_page);
        assert_eq!(features.in_degree, 0);
        assert_eq!(features.importance, 0.0);
        assert_eq!(features.to_vector().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_collect_with_domain_and_graph() {
        let mut stats = CrawlStats::new();
        stats.record_completion(true, 2.0, 0.6);

        let mut graph = CrawlGraph::new(GraphConfig::default());
        graph.add_crawl_result(
            "https://example.com/",
            None,
            &["https://example.com/about".to_string()],
            true,
            0.5,
            1.0,
            HashMap::new(),
        );

        let req = CrawlRequest::new("https://example.com/about", "t");
        let features = PriorityFeatures::collect(&req, Some(&stats), Some(&graph));

        assert!(features.looks_like_page);
        assert_eq!(features.in_degree, 1);
        assert_eq!(features.out_degree, 0);
        assert!((features.domain_success_rate - 1.0).abs() < 1e-9);
        assert!((features.domain_avg_quality - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_vector_is_bounded() {
        let features = PriorityFeatures {
            depth: 40,
            url_length: 5000,
            in_degree: 1000,
            domain_avg_response_time: 60.0,
            ..Default::default()
        };
        assert!(features.to_vector().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_training_target() {
        assert_eq!(training_target(false, 1.0, 50), 0.0);
        assert!((training_target(true, 1.0, 40) - 1.0).abs() < 1e-9);
        assert!((training_target(true, 0.5, 10) - 0.5).abs() < 1e-9);
    }
}
