//! Schema detection and the per-run schema registry

use crate::config::SchemaConfig;
use crate::schema::fields::{detect_fields, schema_confidence};
use crate::schema::structure::PageStructure;
use crate::schema::types::DetectedSchema;
use crate::storage::Storage;
use crate::url::domain_of;
use chrono::Utc;
use parking_lot::RwLock;
use scraper::Html;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

const MAX_SAMPLE_URLS: usize = 10;

/// Infers extraction schemas from page structure and reuses them per site
///
/// Schemas are registered under `(domain, structural signature)`. A page
/// whose domain already owns a schema reuses the best one instead of
/// running detection again.
pub struct SchemaDetector {
    config: SchemaConfig,
    registry: RwLock<HashMap<(String, String), DetectedSchema>>,
}

impl SchemaDetector {
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// Detects or matches a schema for one page
    ///
    /// `existing` overrides the registry as the pool of reusable schemas.
    /// Returns `None` when no schema reaches `min_schema_confidence`.
    pub fn detect_schema(
        &self,
        html: &str,
        url: &str,
        existing: Option<&[DetectedSchema]>,
    ) -> Option<DetectedSchema> {
        let domain = domain_of(url).unwrap_or_default();

        if let Some(pool) = existing {
            if let Some(schema) = best_for_domain(pool.iter(), &domain) {
                tracing::debug!("Reusing schema {} for {}", schema.schema_id, url);
                return Some(schema.clone());
            }
        }

        let document = Html::parse_document(html);
        let structure = PageStructure::analyze(&document);
        let signature = structure.signature();

        if existing.is_none() {
            if let Some(schema) = self.reuse_registered(&domain, &signature, url) {
                return Some(schema);
            }
        }

        let fields = detect_fields(&document, self.config.max_examples);
        let confidence = schema_confidence(&fields);
        if confidence < self.config.min_schema_confidence {
            tracing::debug!(
                "No schema for {}: {} fields, confidence {:.2} below {:.2}",
                url,
                fields.len(),
                confidence,
                self.config.min_schema_confidence
            );
            return None;
        }

        let now = Utc::now();
        let schema = DetectedSchema {
            schema_id: schema_id(&domain, &signature),
            name: format!("{} {} page", domain, structure.page_type),
            confidence,
            fields,
            sample_urls: vec![url.to_string()],
            success_rate: 0.0,
            created_at: now,
            last_updated: now,
            domain: domain.clone(),
            signature: signature.clone(),
            usage_count: 0,
        };

        tracing::info!(
            "Detected schema {} ({} fields, confidence {:.2})",
            schema.name,
            schema.fields.len(),
            schema.confidence
        );
        self.registry
            .write()
            .insert((domain, signature), schema.clone());
        Some(schema)
    }

    /// Registry lookup: exact signature first, then the best schema on the domain
    fn reuse_registered(&self, domain: &str, signature: &str, url: &str) -> Option<DetectedSchema> {
        let mut registry = self.registry.write();
        let key = match registry.get_key_value(&(domain.to_string(), signature.to_string())) {
            Some((key, _)) => key.clone(),
            None => {
                let best = best_for_domain(registry.values(), domain)?;
                (best.domain.clone(), best.signature.clone())
            }
        };

        let schema = registry.get_mut(&key)?;
        if !schema.sample_urls.iter().any(|u| u == url) && schema.sample_urls.len() < MAX_SAMPLE_URLS
        {
            schema.sample_urls.push(url.to_string());
        }
        tracing::debug!("Reusing schema {} for {}", schema.schema_id, url);
        Some(schema.clone())
    }

    /// Folds an extraction outcome into the registered schema's stats
    pub fn record_extraction(&self, schema_id: &str, success: bool) {
        let mut registry = self.registry.write();
        if let Some(schema) = registry.values_mut().find(|s| s.schema_id == schema_id) {
            schema.record_outcome(success);
        }
    }

    /// Registers a schema, replacing any with the same key
    pub fn insert_schema(&self, schema: DetectedSchema) {
        let key = (schema.domain.clone(), schema.signature.clone());
        self.registry.write().insert(key, schema);
    }

    /// Snapshot of the registry, highest confidence first
    pub fn schemas(&self) -> Vec<DetectedSchema> {
        let mut schemas: Vec<DetectedSchema> = self.registry.read().values().cloned().collect();
        schemas.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.schema_id.cmp(&b.schema_id))
        });
        schemas
    }

    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }

    /// Persists one schema; failures are logged, never raised
    pub fn save_schema(&self, storage: &mut dyn Storage, schema: &DetectedSchema) -> bool {
        match storage.save_schema(schema) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to save schema {}: {}", schema.schema_id, e);
                false
            }
        }
    }

    /// Loads one schema into the registry; failures are logged, never raised
    pub fn load_schema(&self, storage: &dyn Storage, schema_id: &str) -> Option<DetectedSchema> {
        match storage.load_schema(schema_id) {
            Ok(Some(schema)) => {
                self.insert_schema(schema.clone());
                Some(schema)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to load schema {}: {}", schema_id, e);
                None
            }
        }
    }

    /// Persists every registered schema, returning how many were saved
    pub fn save_all(&self, storage: &mut dyn Storage) -> usize {
        self.schemas()
            .iter()
            .filter(|schema| self.save_schema(storage, schema))
            .count()
    }

    /// Loads every stored schema into the registry, returning how many
    pub fn load_all(&self, storage: &dyn Storage) -> usize {
        match storage.list_schemas() {
            Ok(schemas) => {
                let count = schemas.len();
                for schema in schemas {
                    self.insert_schema(schema);
                }
                count
            }
            Err(e) => {
                tracing::warn!("Failed to load schemas: {}", e);
                0
            }
        }
    }
}

fn best_for_domain<'a>(
    schemas: impl Iterator<Item = &'a DetectedSchema>,
    domain: &str,
) -> Option<&'a DetectedSchema> {
    schemas
        .filter(|s| {
            s.domain == domain
                || s.sample_urls
                    .iter()
                    .any(|u| domain_of(u).as_deref() == Some(domain))
        })
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
}

/// First 16 hex characters of SHA-256 over domain and signature
fn schema_id(domain: &str, signature: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update(signature.as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(16);
    id
}
