//! Robots.txt rule evaluation backed by the robotstxt crate

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data for one origin
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content; empty means allow all
    content: String,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Permissive rules used when robots.txt is missing or unreachable
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Returns true if no rules are in effect
    pub fn is_allow_all(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Checks if an absolute URL is allowed for the given agent token
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to check
    /// * `agent` - Product token (e.g. "SumiScout"), not the full user agent string
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }
}
