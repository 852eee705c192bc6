/// Link categories assigned by the classifier
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of business content a link is expected to lead to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCategory {
    BusinessProfile,
    FinancialData,
    CompanyNews,
    RegulatoryFiling,
    ContactInfo,
    ProductService,
    Partnership,
    LegalDocument,
    SocialMedia,
    Irrelevant,
    Unknown,
}

impl LinkCategory {
    /// Categories that carry their own pattern set, in a fixed order
    ///
    /// The order is used for feature vectors and tie-breaking, so it must
    /// not change between a model being trained and being loaded.
    pub const SCORED: [LinkCategory; 10] = [
        Self::BusinessProfile,
        Self::FinancialData,
        Self::CompanyNews,
        Self::RegulatoryFiling,
        Self::ContactInfo,
        Self::ProductService,
        Self::Partnership,
        Self::LegalDocument,
        Self::SocialMedia,
        Self::Irrelevant,
    ];

    /// High-value categories that map to CRITICAL/HIGH/NORMAL
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            Self::FinancialData | Self::RegulatoryFiling | Self::BusinessProfile
        )
    }

    /// Secondary categories that map to HIGH/NORMAL/LOW
    pub fn is_secondary(&self) -> bool {
        matches!(
            self,
            Self::CompanyNews | Self::Partnership | Self::ContactInfo
        )
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::BusinessProfile => "business_profile",
            Self::FinancialData => "financial_data",
            Self::CompanyNews => "company_news",
            Self::RegulatoryFiling => "regulatory_filing",
            Self::ContactInfo => "contact_info",
            Self::ProductService => "product_service",
            Self::Partnership => "partnership",
            Self::LegalDocument => "legal_document",
            Self::SocialMedia => "social_media",
            Self::Irrelevant => "irrelevant",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        Self::SCORED
            .iter()
            .chain([Self::Unknown].iter())
            .find(|c| c.to_db_string() == s)
            .copied()
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string().to_uppercase())
    }
}
