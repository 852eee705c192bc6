//! Category prediction strategies

use crate::classifier::features::LinkFeatures;
use crate::learning::NearestCentroid;
use crate::state::LinkCategory;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Minimum score a category needs before the rule-based model will pick it
pub const MIN_CATEGORY_SCORE: f64 = 0.1;

/// Predicts a category and confidence for a link
pub trait CategoryModel: Send + Sync + Debug {
    fn predict(&self, features: &LinkFeatures, context: &LinkContext) -> (LinkCategory, f64);

    fn is_trained(&self) -> bool;

    fn name(&self) -> &'static str;

    /// Serialized form for persistence; untrained models have none
    fn export(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Information about where a link was found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkContext {
    /// Depth of the page the link was found on
    pub depth: u32,

    /// Category the parent page was classified as, if known
    pub parent_category: Option<LinkCategory>,
}

/// Pattern scores plus fixed contextual bonuses
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedModel;

impl RuleBasedModel {
    /// Category scores after bonuses, before thresholding
    pub fn scores(
        &self,
        features: &LinkFeatures,
        context: &LinkContext,
    ) -> crate::patterns::CategoryScores {
        let mut scores = features.pattern_scores;

        if features.is_pdf || features.is_spreadsheet {
            scores.add(LinkCategory::FinancialData, 0.3);
        }
        if features.domain_gov {
            scores.add(LinkCategory::RegulatoryFiling, 0.5);
        }
        if features.domain_social {
            scores.add(LinkCategory::SocialMedia, 0.5);
        }
        if features.is_mailto_or_tel {
            scores.add(LinkCategory::ContactInfo, 0.5);
        }
        if let Some(parent) = context.parent_category {
            if parent != LinkCategory::Irrelevant {
                scores.add(parent, 0.1);
            }
        }

        scores
    }
}

impl CategoryModel for RuleBasedModel {
    fn predict(&self, features: &LinkFeatures, context: &LinkContext) -> (LinkCategory, f64) {
        let (category, score) = self.scores(features, context).best();
        if score >= MIN_CATEGORY_SCORE {
            (category, score.min(1.0))
        } else {
            (LinkCategory::Unknown, 0.0)
        }
    }

    fn is_trained(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}

/// Nearest-centroid model trained from labeled links
///
/// Falls back to the rule-based model for links whose features cannot be
/// compared against the trained centroids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidModel {
    centroids: NearestCentroid,
    pub trained_on: usize,
}

impl CentroidModel {
    pub fn new(centroids: NearestCentroid, trained_on: usize) -> Self {
        Self {
            centroids,
            trained_on,
        }
    }
}

impl CategoryModel for CentroidModel {
    fn predict(&self, features: &LinkFeatures, context: &LinkContext) -> (LinkCategory, f64) {
        match self.centroids.predict(&features.to_vector()) {
            Some(prediction) => prediction,
            None => RuleBasedModel.predict(features, context),
        }
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "nearest_centroid"
    }

    fn export(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gov_bonus_applies_to_regulatory_filing() {
        let features = LinkFeatures::extract("https://example.gov/registry", "Business Registry");
        let (category, confidence) = RuleBasedModel.predict(&features, &LinkContext::default());

        assert_eq!(category, LinkCategory::RegulatoryFiling);
        assert!((confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_pdf_bonus_applies_to_financial_data() {
        let features = LinkFeatures::extract("https://example.com/files/q3.pdf", "Download");
        let (category, confidence) = RuleBasedModel.predict(&features, &LinkContext::default());

        assert_eq!(category, LinkCategory::FinancialData);
        assert!(confidence >= 0.3);
    }

    #[test]
    fn test_no_signal_is_unknown() {
        let features = LinkFeatures::extract("https://example.com/xyz", "click");
        let (category, confidence) = RuleBasedModel.predict(&features, &LinkContext::default());

        assert_eq!(category, LinkCategory::Unknown);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_parent_category_bonus() {
        let features = LinkFeatures::extract("https://example.com/xyz", "click");
        let context = LinkContext {
            depth: 1,
            parent_category: Some(LinkCategory::CompanyNews),
        };
        let (category, confidence) = RuleBasedModel.predict(&features, &context);

        assert_eq!(category, LinkCategory::CompanyNews);
        assert!((confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_capped() {
        let features = LinkFeatures::extract(
            "https://www.linkedin.com/company/acme",
            "Follow us on social",
        );
        let (category, confidence) = RuleBasedModel.predict(&features, &LinkContext::default());

        assert_eq!(category, LinkCategory::SocialMedia);
        assert!(confidence <= 1.0);
    }
}
