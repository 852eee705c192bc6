//! Per-origin robots.txt cache with 24 hour expiry

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Cached robots.txt data for an origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub content: ParsedRobots,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }
}

/// Shared robots.txt cache keyed by origin (`scheme://host[:port]`)
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns fresh rules for `origin`, if cached
    pub fn get(&self, origin: &str) -> Option<ParsedRobots> {
        self.entries
            .lock()
            .get(origin)
            .filter(|cached| !cached.is_stale())
            .map(|cached| cached.content.clone())
    }

    pub fn insert(&self, origin: &str, robots: ParsedRobots) {
        self.entries
            .lock()
            .insert(origin.to_string(), CachedRobots::new(robots));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
