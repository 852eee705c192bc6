/// Crawl priority tiers
///
/// Lower numeric values are dispatched first. `Ignore` never enters a queue.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch tier of a crawl request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPriority {
    Critical = 1,
    High = 2,
    Normal = 3,
    Low = 4,
    Background = 5,

    /// Assigned to irrelevant links; rejected at admission
    Ignore = 6,
}

impl CrawlPriority {
    /// The five queueable tiers in dispatch order
    pub const TIERS: [CrawlPriority; 5] = [
        Self::Critical,
        Self::High,
        Self::Normal,
        Self::Low,
        Self::Background,
    ];

    /// Numeric rank (1 = most urgent)
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Index into a five-slot tier array, or None for `Ignore`
    pub fn tier_index(&self) -> Option<usize> {
        match self {
            Self::Ignore => None,
            other => Some(other.rank() as usize - 1),
        }
    }

    /// Returns true if requests with this priority may be queued
    pub fn is_queueable(&self) -> bool {
        !matches!(self, Self::Ignore)
    }

    /// Buckets a predicted value in [0, 1] into a tier
    ///
    /// ≥0.8 → Critical, ≥0.6 → High, ≥0.4 → Normal, ≥0.2 → Low, else Background.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Normal
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::Background
        }
    }

    /// Returns the more urgent of two priorities
    pub fn max_urgency(self, other: Self) -> Self {
        self.min(other)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Background => "background",
            Self::Ignore => "ignore",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            "background" => Some(Self::Background),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string().to_uppercase())
    }
}
