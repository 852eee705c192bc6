//! Typed data matchers (email, phone, date, currency, ...) and business
//! context hints used by schema detection and extraction

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Data type of an extractable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Text,
    Number,
    Date,
    Url,
    Email,
    Phone,
    Address,
    Currency,
    Percentage,
    Boolean,
    List,
    Nested,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Url => "url",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Currency => "currency",
            Self::Percentage => "percentage",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Nested => "nested",
        }
    }

    /// Canonical field name used when a value of this type is found by pattern
    pub fn default_field_name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "website",
            Self::Date => "date",
            Self::Currency => "amount",
            Self::Percentage => "percentage",
            Self::Number => "number",
            Self::Address => "address",
            other => other.as_str(),
        }
    }

    /// The typed matcher for this data type, if one exists
    pub fn matcher(&self) -> Option<&'static TypedMatcher> {
        typed_matchers().iter().find(|m| m.data_type == *self)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A regex that recognizes one data type, with the confidence a match carries
#[derive(Debug)]
pub struct TypedMatcher {
    pub data_type: DataType,
    pub regex: Regex,
    pub base_confidence: f64,
}

/// A value found in text by a typed matcher
#[derive(Debug, Clone, PartialEq)]
pub struct TypedMatch {
    pub data_type: DataType,
    pub value: String,
    pub confidence: f64,
}

static TYPED_MATCHERS: LazyLock<Vec<TypedMatcher>> = LazyLock::new(|| {
    let m = |data_type, pattern: &str, base_confidence| TypedMatcher {
        data_type,
        regex: Regex::new(pattern).unwrap(),
        base_confidence,
    };

    // More specific types come first so that, e.g., "$1,200" is claimed as
    // currency before the number matcher sees it.
    vec![
        m(
            DataType::Email,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            0.9,
        ),
        m(
            DataType::Url,
            r#"\bhttps?://[^\s<>"']+"#,
            0.7,
        ),
        m(
            DataType::Phone,
            r"(?:\+?\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]\d{3}[\s.-]\d{4}\b",
            0.8,
        ),
        m(
            DataType::Date,
            r"(?i)\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.? \d{1,2},? \d{4})\b",
            0.7,
        ),
        m(
            DataType::Currency,
            r"(?:[$€£¥]\s?\d[\d,]*(?:\.\d{1,2})?(?:\s?(?:million|billion|[mbk]))?|\b\d[\d,]*(?:\.\d{1,2})?\s?(?:USD|EUR|GBP)\b)",
            0.75,
        ),
        m(DataType::Percentage, r"\b\d+(?:\.\d+)?\s?%", 0.7),
        m(DataType::Number, r"\b\d{1,3}(?:,\d{3})+(?:\.\d+)?\b|\b\d+\.\d+\b", 0.5),
    ]
});

/// All typed matchers, most specific first
pub fn typed_matchers() -> &'static [TypedMatcher] {
    &TYPED_MATCHERS
}

/// Finds every typed value in `text`
///
/// Each character span is claimed by at most one matcher; earlier (more
/// specific) matchers win overlaps.
pub fn find_typed_values(text: &str) -> Vec<TypedMatch> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut found = Vec::new();

    for matcher in typed_matchers() {
        for m in matcher.regex.find_iter(text) {
            let overlaps = claimed
                .iter()
                .any(|&(start, end)| m.start() < end && start < m.end());
            if overlaps {
                continue;
            }
            claimed.push((m.start(), m.end()));
            found.push(TypedMatch {
                data_type: matcher.data_type,
                value: m.as_str().trim().to_string(),
                confidence: matcher.base_confidence,
            });
        }
    }

    found
}

/// A business field recognized by keywords in an element's context
#[derive(Debug)]
pub struct BusinessHint {
    pub field_name: &'static str,
    pub data_type: DataType,
    keywords: Regex,
    pub confidence: f64,
}

impl BusinessHint {
    pub fn matches(&self, context: &str) -> bool {
        self.keywords.is_match(context)
    }
}

static BUSINESS_HINTS: LazyLock<Vec<BusinessHint>> = LazyLock::new(|| {
    let h = |field_name, data_type, keywords: &str, confidence| BusinessHint {
        field_name,
        data_type,
        keywords: Regex::new(&format!("(?i){}", keywords)).unwrap(),
        confidence,
    };

    vec![
        h(
            "company_name",
            DataType::Text,
            r"\b(company|organi[sz]ation|business)(-|_|\s)?name\b|\b(inc|llc|ltd|corp|gmbh)\b\.?",
            0.6,
        ),
        h(
            "address",
            DataType::Address,
            r"\b(address|street|avenue|suite|blvd|boulevard|headquarters)\b|\b\d{5}(-\d{4})?\b",
            0.6,
        ),
        h(
            "industry",
            DataType::Text,
            r"\b(industry|sector|naics|sic(-|_|\s)code)\b",
            0.55,
        ),
        h(
            "description",
            DataType::Text,
            r"\b(about|description|overview|mission|who we are)\b",
            0.5,
        ),
        h(
            "founded",
            DataType::Date,
            r"\b(founded|established|incorporated|since)\b",
            0.55,
        ),
        h(
            "employees",
            DataType::Number,
            r"\b(employees|staff|headcount|team size)\b",
            0.5,
        ),
    ]
});

/// Keyword hints for common business fields
pub fn business_hints() -> &'static [BusinessHint] {
    &BUSINESS_HINTS
}
