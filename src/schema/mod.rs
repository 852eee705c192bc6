//! Schema detection and structured extraction
//!
//! This module handles:
//! - Page structure analysis and structural signatures
//! - Field detection (typed patterns, business heuristics, structured data)
//! - Confidence-scored schema detection with per-domain reuse
//! - Extraction with a schema, or generically without one

mod detector;
mod extract;
mod fields;
mod structure;
mod types;

pub use detector::SchemaDetector;
pub use extract::{extract_generic, extract_with_schema, SUCCESS_THRESHOLD};
pub use fields::{detect_fields, merge_fields, schema_confidence};
pub use structure::{PageStructure, PageType};
pub use types::{
    DetectedSchema, ExtractionResult, FieldImportance, FieldSource, SchemaField, ValidationRule,
};
