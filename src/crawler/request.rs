//! Crawl requests as they move through the scheduler

use crate::state::CrawlPriority;
use crate::url::domain_of;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// A URL admitted for crawling
#[derive(Debug, Clone, Serialize)]
pub struct CrawlRequest {
    pub url: String,

    /// Task the request belongs to (carried over from its seed)
    pub task: String,

    pub priority: CrawlPriority,
    pub depth: u32,
    pub parent_url: Option<String>,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,

    /// Estimated value in [0, 1] (the classifier's confidence for links)
    pub estimated_value: f64,

    pub retry_count: u32,
    pub max_retries: u32,
}

impl CrawlRequest {
    /// Creates a request with NORMAL priority at depth 0
    pub fn new(url: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            task: task.into(),
            priority: CrawlPriority::Normal,
            depth: 0,
            parent_url: None,
            metadata: HashMap::new(),
            created_at: Utc::now(),
            estimated_value: 0.0,
            retry_count: 0,
            max_retries: 3,
        }
    }

    pub fn with_priority(mut self, priority: CrawlPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_url = Some(parent.into());
        self
    }

    pub fn with_estimated_value(mut self, value: f64) -> Self {
        self.estimated_value = value.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Domain of the request URL (empty if it cannot be parsed)
    pub fn domain(&self) -> String {
        domain_of(&self.url).unwrap_or_default()
    }

    /// Whether another failure may still be retried
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}
