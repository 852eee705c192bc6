//! Field detection passes, field merging and schema confidence

use crate::patterns::{business_hints, find_typed_values, DataType};
use crate::schema::types::{FieldImportance, FieldSource, SchemaField};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;

/// Elements whose own text is scanned by the typed pass
const BLOCK_SELECTOR: &str = "p, li, td, th, dd, dt, address, span, h1, h2, h3, h4, h5, h6, footer, blockquote";

/// Elements inspected by the business-heuristic pass
const CONTEXT_SELECTOR: &str = "h1, h2, p, li, dd, td, address, span, div[class], div[id]";

const MAX_TEXT_LEN: usize = 300;
const STRUCTURED_CONFIDENCE: f64 = 0.9;

/// Canonical names for metadata, microdata and JSON-LD keys
const STRUCTURED_KEYS: &[(&str, &str, DataType)] = &[
    ("name", "company_name", DataType::Text),
    ("legalName", "company_name", DataType::Text),
    ("og:site_name", "company_name", DataType::Text),
    ("telephone", "phone", DataType::Phone),
    ("email", "email", DataType::Email),
    ("address", "address", DataType::Address),
    ("streetAddress", "address", DataType::Address),
    ("url", "website", DataType::Url),
    ("og:url", "website", DataType::Url),
    ("description", "description", DataType::Text),
    ("og:description", "description", DataType::Text),
    ("foundingDate", "founded", DataType::Date),
    ("numberOfEmployees", "employees", DataType::Number),
    ("industry", "industry", DataType::Text),
];

fn canonical(key: &str) -> Option<(&'static str, DataType)> {
    STRUCTURED_KEYS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, name, data_type)| (*name, *data_type))
}

/// Runs all three detection passes and merges the result
pub fn detect_fields(document: &Html, max_examples: usize) -> Vec<SchemaField> {
    let mut fields = typed_fields(document);
    fields.extend(heuristic_fields(document));
    fields.extend(structured_fields(document));
    merge_fields(fields, max_examples)
}

/// Text belonging directly to `element`, not to its child elements
fn own_text(element: &ElementRef) -> String {
    let text: Vec<&str> = element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| &**t))
        .collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn full_text(element: &ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn selector_step(element: &ElementRef) -> String {
    let value = element.value();
    if let Some(id) = value.id() {
        return format!("{}#{}", value.name(), id);
    }
    match value.classes().next() {
        Some(class) => format!("{}.{}", value.name(), class),
        None => value.name().to_string(),
    }
}

/// CSS selector for `element`: its own step under its parent's step
pub fn selector_for(element: &ElementRef) -> String {
    let step = selector_step(element);
    if element.value().id().is_some() {
        return step;
    }
    match element.parent().and_then(ElementRef::wrap) {
        Some(parent) if !matches!(parent.value().name(), "html" | "body") => {
            format!("{} > {}", selector_step(&parent), step)
        }
        _ => step,
    }
}

/// Pass 1: typed regexes over block-level text
pub fn typed_fields(document: &Html) -> Vec<SchemaField> {
    let Ok(selector) = Selector::parse(BLOCK_SELECTOR) else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for element in document.select(&selector) {
        let text = own_text(&element);
        if text.is_empty() {
            continue;
        }
        for found in find_typed_values(&text) {
            fields.push(
                SchemaField::new(
                    found.data_type.default_field_name(),
                    found.data_type,
                    selector_for(&element),
                    found.confidence,
                    FieldSource::Pattern,
                )
                .with_example(found.value),
            );
        }
    }
    fields
}

/// Label text in front of an element: a preceding `dt`, `th`, `label` or `strong`
fn label_for(element: &ElementRef) -> String {
    element
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|el| matches!(el.value().name(), "dt" | "th" | "label" | "strong" | "b"))
        .map(|el| full_text(&el))
        .unwrap_or_default()
}

/// Pass 2: business keywords in an element's attributes, label and text
pub fn heuristic_fields(document: &Html) -> Vec<SchemaField> {
    let Ok(selector) = Selector::parse(CONTEXT_SELECTOR) else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for element in document.select(&selector) {
        let value = element.value();
        let text = full_text(&element);
        if text.is_empty() || text.len() > MAX_TEXT_LEN {
            continue;
        }

        let attributes = ["class", "id", "name", "itemprop", "aria-label"]
            .iter()
            .filter_map(|attr| value.attr(attr))
            .collect::<Vec<_>>()
            .join(" ")
            .replace(&['-', '_'][..], " ");
        let context = format!("{} {} {} {}", value.name(), attributes, label_for(&element), text);

        for hint in business_hints() {
            if hint.matches(&context) {
                fields.push(
                    SchemaField::new(
                        hint.field_name,
                        hint.data_type,
                        selector_for(&element),
                        hint.confidence,
                        FieldSource::Heuristic,
                    )
                    .with_example(text.clone()),
                );
            }
        }
    }
    fields
}

/// Pass 3: meta tags, microdata and JSON-LD
pub fn structured_fields(document: &Html) -> Vec<SchemaField> {
    let mut fields = Vec::new();
    let mut push = |key: &str, value: &str, selector: String| {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        if let Some((name, data_type)) = canonical(key) {
            fields.push(
                SchemaField::new(name, data_type, selector, STRUCTURED_CONFIDENCE, FieldSource::Structured)
                    .with_example(value),
            );
        }
    };

    if let Ok(selector) = Selector::parse("meta[content]") {
        for element in document.select(&selector) {
            let value = element.value();
            let Some(key) = value.attr("property").or_else(|| value.attr("name")) else {
                continue;
            };
            if let Some(content) = value.attr("content") {
                let selector = format!("meta[{}='{}']", if value.attr("property").is_some() { "property" } else { "name" }, key);
                push(key, content, selector);
            }
        }
    }

    if let Ok(selector) = Selector::parse("[itemprop]") {
        for element in document.select(&selector) {
            let value = element.value();
            let Some(key) = value.attr("itemprop") else {
                continue;
            };
            // Nested items are handled through their own properties
            if value.attr("itemscope").is_some() {
                continue;
            }
            let content = value
                .attr("content")
                .or_else(|| value.attr("href"))
                .map(str::to_string)
                .unwrap_or_else(|| full_text(&element));
            push(key, &content, format!("[itemprop='{}']", key));
        }
    }

    if let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for element in document.select(&selector) {
            let raw = element.text().collect::<String>();
            match serde_json::from_str::<Value>(&raw) {
                Ok(json) => {
                    let mut pairs = Vec::new();
                    collect_json_ld(&json, &mut pairs);
                    for (key, value) in pairs {
                        push(&key, &value, "script[type='application/ld+json']".to_string());
                    }
                }
                Err(e) => tracing::trace!("Skipping malformed JSON-LD: {}", e),
            }
        }
    }

    fields
}

/// Flattens JSON-LD objects into `(key, value)` pairs
///
/// `@graph` arrays and nested objects are walked; a nested address object is
/// joined into one string.
fn collect_json_ld(value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_json_ld(item, out)),
        Value::Object(map) => {
            for (key, v) in map {
                match (key.as_str(), v) {
                    ("@graph", _) => collect_json_ld(v, out),
                    ("address", Value::Object(parts)) => {
                        let joined = ["streetAddress", "addressLocality", "addressRegion", "postalCode", "addressCountry"]
                            .iter()
                            .filter_map(|k| parts.get(*k).and_then(Value::as_str))
                            .collect::<Vec<_>>()
                            .join(", ");
                        out.push(("address".to_string(), joined));
                    }
                    (_, Value::String(s)) => out.push((key.clone(), s.clone())),
                    (_, Value::Number(n)) => out.push((key.clone(), n.to_string())),
                    (_, Value::Object(_)) | (_, Value::Array(_)) => collect_json_ld(v, out),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Merges fields by `(name, data_type)`
///
/// The highest-confidence duplicate wins (earliest on ties) and examples of
/// all duplicates are unioned up to `max_examples`. Order of first
/// appearance is kept. A field seen more than once is marked `multiple` when
/// its examples differ.
pub fn merge_fields(fields: Vec<SchemaField>, max_examples: usize) -> Vec<SchemaField> {
    let mut merged: Vec<SchemaField> = Vec::new();
    let mut index: HashMap<(String, DataType), usize> = HashMap::new();

    for field in fields {
        let key = (field.name.clone(), field.data_type);
        match index.get(&key) {
            None => {
                index.insert(key, merged.len());
                let mut field = field;
                dedup_examples(&mut field.examples, max_examples);
                merged.push(field);
            }
            Some(&i) => {
                let existing = &mut merged[i];
                let mut examples = std::mem::take(&mut existing.examples);
                examples.extend(field.examples.iter().cloned());
                dedup_examples(&mut examples, max_examples);

                if field.confidence > existing.confidence {
                    *existing = field;
                }
                existing.multiple |= examples.len() > 1;
                existing.examples = examples;
            }
        }
    }
    merged
}

fn dedup_examples(examples: &mut Vec<String>, max: usize) {
    let mut seen = std::collections::HashSet::new();
    examples.retain(|e| seen.insert(e.clone()));
    examples.truncate(max);
}

/// Confidence of a field set
///
/// `mean(confidence) + min(0.1 * critical, 0.3) + min(0.05 * structured, 0.2)
/// - (0.2 if fewer than 3 fields)`, clamped to [0, 1]. No fields scores 0.
pub fn schema_confidence(fields: &[SchemaField]) -> f64 {
    if fields.is_empty() {
        return 0.0;
    }
    let mean = fields.iter().map(|f| f.confidence).sum::<f64>() / fields.len() as f64;
    let critical = fields
        .iter()
        .filter(|f| f.importance == FieldImportance::Critical)
        .count();
    let structured = fields
        .iter()
        .filter(|f| f.source == FieldSource::Structured)
        .count();
    let penalty = if fields.len() < 3 { 0.2 } else { 0.0 };

    (mean + (0.1 * critical as f64).min(0.3) + (0.05 * structured as f64).min(0.2) - penalty)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <title>Contact Acme</title>
        <meta property="og:site_name" content="Acme Corporation">
        <script type="application/ld+json">
        {"@context": "https://schema.org", "@type": "Organization",
         "name": "Acme Corporation", "telephone": "+1 555-123-4567",
         "address": {"streetAddress": "1 Main St", "addressLocality": "Springfield"}}
        </script>
        </head><body>
        <h1 class="company-name">Acme Corporation</h1>
        <footer class="contact"><p>Email info@acme.com or call (555) 123-4567</p></footer>
        <dl><dt>Industry</dt><dd>Manufacturing</dd></dl>
        </body></html>"#;

    fn field(name: &str, data_type: DataType, confidence: f64, importance: FieldImportance) -> SchemaField {
        let mut f = SchemaField::new(name, data_type, "p".into(), confidence, FieldSource::Pattern);
        f.importance = importance;
        f
    }

    #[test]
    fn test_typed_pass_finds_contact_values() {
        let doc = Html::parse_document(PAGE);
        let fields = typed_fields(&doc);

        let email = fields.iter().find(|f| f.name == "email").unwrap();
        assert_eq!(email.examples, vec!["info@acme.com"]);
        assert_eq!(email.selector, "footer.contact > p");
        assert!(fields.iter().any(|f| f.name == "phone"));
    }

    #[test]
    fn test_heuristic_pass_uses_context() {
        let doc = Html::parse_document(PAGE);
        let fields = heuristic_fields(&doc);

        let company = fields.iter().find(|f| f.name == "company_name").unwrap();
        assert_eq!(company.examples[0], "Acme Corporation");
        assert_eq!(company.source, FieldSource::Heuristic);

        let industry = fields.iter().find(|f| f.name == "industry").unwrap();
        assert_eq!(industry.examples[0], "Manufacturing");
    }

    #[test]
    fn test_structured_pass_maps_names() {
        let doc = Html::parse_document(PAGE);
        let fields = structured_fields(&doc);

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"company_name"));
        assert!(names.contains(&"phone"));
        assert!(names.contains(&"address"));

        let address = fields.iter().find(|f| f.name == "address").unwrap();
        assert_eq!(address.examples[0], "1 Main St, Springfield");
        assert!(fields.iter().all(|f| f.confidence == STRUCTURED_CONFIDENCE));
    }

    #[test]
    fn test_detect_fields_merges_passes() {
        let doc = Html::parse_document(PAGE);
        let fields = detect_fields(&doc, 5);

        let company: Vec<_> = fields.iter().filter(|f| f.name == "company_name").collect();
        assert_eq!(company.len(), 1);
        assert_eq!(company[0].source, FieldSource::Structured);
        assert_eq!(company[0].examples, vec!["Acme Corporation"]);
    }

    #[test]
    fn test_merge_keeps_highest_confidence_and_unions_examples() {
        let a = field("email", DataType::Email, 0.6, FieldImportance::Critical).with_example("a@x.com");
        let b = field("email", DataType::Email, 0.9, FieldImportance::Critical).with_example("b@x.com");
        let c = field("email", DataType::Text, 0.5, FieldImportance::Critical).with_example("c");

        let merged = merge_fields(vec![a, b, c], 5);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].confidence, 0.9);
        assert_eq!(merged[0].examples, vec!["a@x.com", "b@x.com"]);
        assert!(merged[0].multiple);
        assert_eq!(merged[1].data_type, DataType::Text);
    }

    #[test]
    fn test_merge_caps_examples() {
        let fields: Vec<SchemaField> = (0..8)
            .map(|i| field("phone", DataType::Phone, 0.8, FieldImportance::Critical).with_example(format!("555-000-000{}", i)))
            .collect();
        let merged = merge_fields(fields, 5);
        assert_eq!(merged[0].examples.len(), 5);
    }

    #[test]
    fn test_merge_without_duplicates_is_identity() {
        let fields = vec![
            field("email", DataType::Email, 0.9, FieldImportance::Critical).with_example("a@x.com"),
            field("address", DataType::Address, 0.6, FieldImportance::High).with_example("1 Main St"),
        ];
        assert_eq!(merge_fields(fields.clone(), 5), fields);
    }

    #[test]
    fn test_schema_confidence_example() {
        let fields = vec![
            field("a", DataType::Text, 0.9, FieldImportance::Critical),
            field("b", DataType::Text, 0.7, FieldImportance::High),
        ];
        assert!((schema_confidence(&fields) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_schema_confidence_bounds() {
        assert_eq!(schema_confidence(&[]), 0.0);

        let mut rich: Vec<SchemaField> = (0..6)
            .map(|i| field(&format!("f{}", i), DataType::Text, 1.0, FieldImportance::Critical))
            .collect();
        for f in rich.iter_mut() {
            f.source = FieldSource::Structured;
        }
        assert_eq!(schema_confidence(&rich), 1.0);

        let weak = vec![field("a", DataType::Text, 0.1, FieldImportance::Optional)];
        assert_eq!(schema_confidence(&weak), 0.0);
    }
}
