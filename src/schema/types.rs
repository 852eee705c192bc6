//! Schema, field and extraction result types

use crate::patterns::DataType;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Compiled validation patterns; `None` marks a pattern that does not compile
static COMPILED_PATTERNS: LazyLock<RwLock<HashMap<String, Option<Regex>>>> =
    LazyLock::new(Default::default);

/// How much a field matters to a schema, most important first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldImportance {
    Critical,
    High,
    Medium,
    Low,
    Optional,
}

impl FieldImportance {
    /// Importance of a canonical field name
    pub fn for_field(name: &str) -> Self {
        match name {
            "company_name" | "email" | "phone" => Self::Critical,
            "address" | "website" | "industry" => Self::High,
            "description" | "founded" | "employees" => Self::Medium,
            "amount" | "date" | "percentage" => Self::Low,
            _ => Self::Optional,
        }
    }
}

/// Which detection pass produced a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Typed regex over block text
    #[default]
    Pattern,
    /// Keyword context around an element
    Heuristic,
    /// Meta tags, microdata or JSON-LD
    Structured,
}

/// A check applied to every extracted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum ValidationRule {
    Pattern(String),
    MinLength(usize),
    MaxLength(usize),
}

impl ValidationRule {
    /// Default rules for a data type
    pub fn defaults_for(data_type: DataType) -> Vec<Self> {
        let mut rules = match data_type.matcher() {
            Some(matcher) => vec![Self::Pattern(matcher.regex.as_str().to_string())],
            None => Vec::new(),
        };
        match data_type {
            DataType::Text | DataType::Address => {
                rules.push(Self::MinLength(2));
                rules.push(Self::MaxLength(500));
            }
            _ => rules.push(Self::MaxLength(200)),
        }
        rules
    }

    /// Whether `value` passes this rule; an invalid pattern passes everything
    pub fn check(&self, value: &str) -> bool {
        match self {
            Self::Pattern(pattern) => pattern_matches(pattern, value),
            Self::MinLength(min) => value.chars().count() >= *min,
            Self::MaxLength(max) => value.chars().count() <= *max,
        }
    }
}

fn pattern_matches(pattern: &str, value: &str) -> bool {
    if let Some(compiled) = COMPILED_PATTERNS.read().get(pattern) {
        return compiled.as_ref().map_or(true, |re| re.is_match(value));
    }

    let compiled = Regex::new(pattern).ok();
    let matches = compiled.as_ref().map_or(true, |re| re.is_match(value));
    COMPILED_PATTERNS.write().insert(pattern.to_string(), compiled);
    matches
}

/// One extractable field of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub data_type: DataType,

    /// CSS selector locating the value on pages of this template
    pub selector: String,
    pub importance: FieldImportance,
    pub confidence: f64,
    pub examples: Vec<String>,
    pub optional: bool,
    pub multiple: bool,
    #[serde(default)]
    pub validation: Vec<ValidationRule>,
    #[serde(default)]
    pub source: FieldSource,
}

impl SchemaField {
    /// A field with importance and validation derived from its name and type
    pub fn new(
        name: &str,
        data_type: DataType,
        selector: String,
        confidence: f64,
        source: FieldSource,
    ) -> Self {
        let importance = FieldImportance::for_field(name);
        Self {
            name: name.to_string(),
            data_type,
            selector,
            importance,
            confidence: confidence.clamp(0.0, 1.0),
            examples: Vec::new(),
            optional: !matches!(importance, FieldImportance::Critical | FieldImportance::High),
            multiple: false,
            validation: ValidationRule::defaults_for(data_type),
            source,
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Whether `value` passes every validation rule
    pub fn validate(&self, value: &str) -> bool {
        self.validation.iter().all(|rule| rule.check(value))
    }
}

/// A confidence-scored extraction template for one kind of page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSchema {
    pub schema_id: String,
    pub name: String,
    pub confidence: f64,
    pub fields: Vec<SchemaField>,
    pub sample_urls: Vec<String>,
    pub success_rate: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,

    /// Owning domain
    #[serde(default)]
    pub domain: String,

    /// Digest of the page structure the schema was derived from
    #[serde(default)]
    pub signature: String,

    /// Extractions recorded against this schema
    #[serde(default)]
    pub usage_count: u64,
}

impl DetectedSchema {
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Folds one extraction outcome into the running success rate
    pub fn record_outcome(&mut self, success: bool) {
        self.usage_count += 1;
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate += (outcome - self.success_rate) / self.usage_count as f64;
        self.last_updated = Utc::now();
    }
}

/// Output of extracting one page
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub url: String,

    /// Schema used, or None for generic extraction
    pub schema_id: Option<String>,
    pub data: BTreeMap<String, serde_json::Value>,
    pub success: bool,
    pub confidence: f64,
    pub error: Option<String>,

    /// Extraction time in seconds
    pub extraction_time: f64,
    pub links: Vec<String>,
}

impl ExtractionResult {
    /// A failed extraction carrying only the error
    pub fn failed(url: &str, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            schema_id: None,
            data: BTreeMap::new(),
            success: false,
            confidence: 0.0,
            error: Some(error.into()),
            extraction_time: 0.0,
            links: Vec::new(),
        }
    }
}
