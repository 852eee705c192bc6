use crate::config::DomainEntry;

/// Checks if a domain matches a wildcard pattern
///
/// `"example.com"` matches only itself; `"*.example.com"` matches the bare
/// domain and any subdomain.
///
/// # Examples
///
/// ```
/// use sumi_scout::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Domains the run must never admit
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    patterns: Vec<String>,
}

impl ExclusionList {
    pub fn new(entries: &[DomainEntry]) -> Self {
        Self {
            patterns: entries.iter().map(|e| e.domain.to_lowercase()).collect(),
        }
    }

    /// Returns true if `domain` matches any exclusion pattern
    pub fn is_excluded(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.patterns.iter().any(|p| matches_wildcard(p, &domain))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
