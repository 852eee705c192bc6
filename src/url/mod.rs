//! URL handling module for Sumi-Scout
//!
//! Normalization gives every discovered link one canonical key for the
//! scheduler and the crawl graph; the exclusion list keeps configured
//! domains out of the run entirely.

mod domain;
mod matcher;
mod normalize;

pub use domain::{domain_of, extract_domain};
pub use matcher::{matches_wildcard, ExclusionList};
pub use normalize::normalize_url;
