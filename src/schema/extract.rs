//! Field extraction with a detected schema, or generically without one

use crate::crawler::extract_title;
use crate::patterns::{find_typed_values, DataType};
use crate::schema::fields::detect_fields;
use crate::schema::types::{DetectedSchema, ExtractionResult, FieldImportance, SchemaField};
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Extraction confidence above which a page counts as a success
pub const SUCCESS_THRESHOLD: f64 = 0.3;

const GENERIC_SIGNALS: f64 = 4.0;

/// Extracts every schema field from a page
///
/// Each field is located by its selector first; if that yields nothing
/// valid, the value found for the same `(name, type)` by a fresh detection
/// pass over the page is used. Values must pass the field's validation rules.
///
/// Confidence is `0.5 * coverage + 0.2 * critical_rate + 0.3 * schema.confidence`
/// where `critical_rate` falls back to coverage when the schema has no
/// critical fields.
pub fn extract_with_schema(
    html: &str,
    url: &str,
    schema: &DetectedSchema,
    links: Vec<String>,
) -> ExtractionResult {
    let started = Instant::now();
    let document = Html::parse_document(html);

    let detected: HashMap<(String, DataType), Vec<String>> = detect_fields(&document, usize::MAX)
        .into_iter()
        .map(|f| ((f.name, f.data_type), f.examples))
        .collect();

    let mut data = BTreeMap::new();
    let mut critical_total = 0usize;
    let mut critical_found = 0usize;

    for field in &schema.fields {
        let is_critical = field.importance == FieldImportance::Critical;
        if is_critical {
            critical_total += 1;
        }

        let mut values = values_by_selector(&document, field);
        if values.is_empty() {
            values = detected
                .get(&(field.name.clone(), field.data_type))
                .map(|found| found.iter().filter(|v| field.validate(v)).cloned().collect())
                .unwrap_or_default();
        }
        if values.is_empty() {
            continue;
        }

        if is_critical {
            critical_found += 1;
        }
        let value = if field.multiple {
            Value::Array(values.into_iter().map(Value::String).collect())
        } else {
            Value::String(values.swap_remove(0))
        };
        data.insert(field.name.clone(), value);
    }

    let coverage = if schema.fields.is_empty() {
        0.0
    } else {
        data.len() as f64 / schema.fields.len() as f64
    };
    let critical_rate = if critical_total == 0 {
        coverage
    } else {
        critical_found as f64 / critical_total as f64
    };
    let confidence =
        (0.5 * coverage + 0.2 * critical_rate + 0.3 * schema.confidence).clamp(0.0, 1.0);

    ExtractionResult {
        url: url.to_string(),
        schema_id: Some(schema.schema_id.clone()),
        data,
        success: confidence > SUCCESS_THRESHOLD,
        confidence,
        error: None,
        extraction_time: started.elapsed().as_secs_f64(),
        links,
    }
}

/// Valid values under the field's selector
///
/// Typed fields keep only the matching substring of each element's text.
fn values_by_selector(document: &Html, field: &SchemaField) -> Vec<String> {
    let Ok(selector) = Selector::parse(&field.selector) else {
        return Vec::new();
    };

    let mut values = Vec::new();
    for element in document.select(&selector) {
        let raw = element
            .value()
            .attr("content")
            .map(str::to_string)
            .unwrap_or_else(|| {
                element
                    .text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            });

        let candidates: Vec<String> = if field.data_type.matcher().is_some() {
            find_typed_values(&raw)
                .into_iter()
                .filter(|m| m.data_type == field.data_type)
                .map(|m| m.value)
                .collect()
        } else {
            vec![raw]
        };

        for candidate in candidates {
            if !candidate.is_empty() && field.validate(&candidate) && !values.contains(&candidate) {
                values.push(candidate);
            }
        }
    }
    values
}

/// Extraction without a schema: title, emails, phones and URLs
///
/// Confidence is `0.5 * found / 4` over those four signals.
pub fn extract_generic(html: &str, url: &str, links: Vec<String>) -> ExtractionResult {
    let started = Instant::now();
    let document = Html::parse_document(html);

    let text = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|body| body.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    let typed = find_typed_values(&text);
    let of_type = |data_type: DataType| -> Vec<Value> {
        let mut values: Vec<String> = Vec::new();
        for m in typed.iter().filter(|m| m.data_type == data_type) {
            if !values.contains(&m.value) {
                values.push(m.value.clone());
            }
        }
        values.into_iter().map(Value::String).collect()
    };

    let mut data = BTreeMap::new();
    if let Some(title) = extract_title(&document) {
        data.insert("title".to_string(), Value::String(title));
    }
    for (key, data_type) in [
        ("emails", DataType::Email),
        ("phones", DataType::Phone),
        ("urls", DataType::Url),
    ] {
        let values = of_type(data_type);
        if !values.is_empty() {
            data.insert(key.to_string(), Value::Array(values));
        }
    }

    let confidence = 0.5 * data.len() as f64 / GENERIC_SIGNALS;

    ExtractionResult {
        url: url.to_string(),
        schema_id: None,
        data,
        success: confidence > SUCCESS_THRESHOLD,
        confidence,
        error: None,
        extraction_time: started.elapsed().as_secs_f64(),
        links,
    }
}
