//! Feature/pattern library
//!
//! Leaf module shared by the link classifier (category matchers) and the
//! schema detector (typed data matchers and business hints). All patterns are
//! compiled once on first use.

mod category;
mod data_types;

pub use category::{CategoryPatterns, CategoryScores, PatternLibrary};
pub use data_types::{
    business_hints, find_typed_values, typed_matchers, BusinessHint, DataType, TypedMatch,
    TypedMatcher,
};
