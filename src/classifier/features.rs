//! Feature extraction for discovered links

use crate::patterns::{CategoryScores, PatternLibrary};
use std::collections::HashMap;
use url::Url;

const SOCIAL_DOMAINS: &[&str] = &[
    "linkedin.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
    "tiktok.com",
];

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];
const DOCUMENT_EXTENSIONS: &[&str] = &["doc", "docx", "rtf", "txt"];

/// Structural and textual features of a single link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkFeatures {
    pub url_length: usize,
    pub path_segments: usize,
    pub is_https: bool,
    pub subdomain_count: usize,
    pub has_query: bool,
    pub is_pdf: bool,
    pub is_spreadsheet: bool,
    pub is_document: bool,
    pub is_mailto_or_tel: bool,
    pub anchor_length: usize,
    pub anchor_words: usize,
    pub anchor_has_digits: bool,
    pub anchor_all_caps: bool,
    pub domain_gov: bool,
    pub domain_edu: bool,
    pub domain_org: bool,
    pub domain_social: bool,
    pub pattern_scores: CategoryScores,
}

impl LinkFeatures {
    /// Extracts features from a link URL and its anchor text
    ///
    /// Unparseable URLs still produce features; URL-derived flags are false.
    pub fn extract(url: &str, anchor: &str) -> Self {
        let parsed = Url::parse(url).ok();
        let host = parsed
            .as_ref()
            .and_then(|u| u.host_str())
            .unwrap_or("")
            .to_lowercase();
        let path = parsed.as_ref().map(|u| u.path()).unwrap_or("");
        let extension = path
            .rsplit('/')
            .next()
            .and_then(|last| last.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        let host_labels = host.split('.').filter(|l| !l.is_empty()).count();
        let anchor = anchor.trim();
        let letters: Vec<char> = anchor.chars().filter(|c| c.is_alphabetic()).collect();

        let text = format!("{} {}", url.to_lowercase(), anchor.to_lowercase());

        Self {
            url_length: url.len(),
            path_segments: path.split('/').filter(|s| !s.is_empty()).count(),
            is_https: parsed.as_ref().is_some_and(|u| u.scheme() == "https"),
            subdomain_count: host_labels.saturating_sub(2),
            has_query: parsed.as_ref().is_some_and(|u| u.query().is_some()),
            is_pdf: extension == "pdf",
            is_spreadsheet: SPREADSHEET_EXTENSIONS.contains(&extension.as_str()),
            is_document: DOCUMENT_EXTENSIONS.contains(&extension.as_str()),
            is_mailto_or_tel: url.starts_with("mailto:") || url.starts_with("tel:"),
            anchor_length: anchor.len(),
            anchor_words: anchor.split_whitespace().count(),
            anchor_has_digits: anchor.chars().any(|c| c.is_ascii_digit()),
            anchor_all_caps: letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()),
            domain_gov: is_government_host(&host),
            domain_edu: host.ends_with(".edu") || host.contains(".edu."),
            domain_org: host.ends_with(".org"),
            domain_social: SOCIAL_DOMAINS
                .iter()
                .any(|d| host == *d || host.ends_with(&format!(".{}", d))),
            pattern_scores: PatternLibrary::standard().category_scores(&text),
        }
    }

    /// Dense vector for trained models, each structural entry scaled to roughly [0, 1]
    pub fn to_vector(&self) -> Vec<f64> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let mut v = vec![
            (self.url_length as f64 / 200.0).min(1.0),
            (self.path_segments as f64 / 10.0).min(1.0),
            flag(self.is_https),
            (self.subdomain_count as f64 / 3.0).min(1.0),
            flag(self.has_query),
            flag(self.is_pdf),
            flag(self.is_spreadsheet),
            flag(self.is_document),
            flag(self.is_mailto_or_tel),
            (self.anchor_length as f64 / 100.0).min(1.0),
            (self.anchor_words as f64 / 10.0).min(1.0),
            flag(self.anchor_has_digits),
            flag(self.anchor_all_caps),
            flag(self.domain_gov),
            flag(self.domain_edu),
            flag(self.domain_org),
            flag(self.domain_social),
        ];
        v.extend_from_slice(self.pattern_scores.as_slice());
        v
    }

    /// Named feature map recorded on `LinkInfo`
    pub fn to_map(&self) -> HashMap<String, f64> {
        let names = [
            "url_length",
            "path_segments",
            "is_https",
            "subdomain_count",
            "has_query",
            "is_pdf",
            "is_spreadsheet",
            "is_document",
            "is_mailto_or_tel",
            "anchor_length",
            "anchor_words",
            "anchor_has_digits",
            "anchor_all_caps",
            "domain_gov",
            "domain_edu",
            "domain_org",
            "domain_social",
        ];
        let mut map: HashMap<String, f64> = names
            .iter()
            .zip(self.to_vector())
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        for (category, score) in self.pattern_scores.iter() {
            map.insert(format!("pattern_{}", category.to_db_string()), score);
        }
        map
    }
}

/// Government hosts: `.gov`, `.mil`, `.gov.<cc>`, `.gc.ca`, `.europa.eu`
pub fn is_government_host(host: &str) -> bool {
    host.ends_with(".gov")
        || host.ends_with(".mil")
        || host.contains(".gov.")
        || host.ends_with(".gc.ca")
        || host.ends_with(".europa.eu")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LinkCategory;

    #[test]
    fn test_structural_features() {
        let f = LinkFeatures::extract(
            "https://ir.example.com/reports/2023/annual.pdf?lang=en",
            "ANNUAL REPORT 2023",
        );

        assert!(f.is_https);
        assert!(f.is_pdf);
        assert!(f.has_query);
        assert_eq!(f.path_segments, 3);
        assert_eq!(f.subdomain_count, 1);
        assert_eq!(f.anchor_words, 3);
        assert!(f.anchor_has_digits);
        assert!(f.anchor_all_caps);
        assert!(!f.domain_gov);
    }

    #[test]
    fn test_domain_flags() {
        assert!(LinkFeatures::extract("https://example.gov/registry", "").domain_gov);
        assert!(LinkFeatures::extract("https://companies.gov.uk/", "").domain_gov);
        assert!(LinkFeatures::extract("https://www.linkedin.com/company/acme", "").domain_social);
        assert!(!LinkFeatures::extract("https://notlinkedin.com/", "").domain_social);
        assert!(LinkFeatures::extract("https://cs.stanford.edu/", "").domain_edu);
    }

    #[test]
    fn test_spreadsheet_extension() {
        let f = LinkFeatures::extract("https://example.com/data/filings.XLSX", "");
        assert!(f.is_spreadsheet);
        assert!(!f.is_pdf);
    }

    #[test]
    fn test_mailto() {
        let f = LinkFeatures::extract("mailto:info@example.com", "Email us");
        assert!(f.is_mailto_or_tel);
        assert!(f.pattern_scores.get(LinkCategory::ContactInfo) > 0.0);
    }

    #[test]
    fn test_vector_and_map_agree() {
        let f = LinkFeatures::extract("https://example.com/about-us", "About Us");
        let v = f.to_vector();
        let map = f.to_map();

        assert_eq!(v.len(), 17 + LinkCategory::SCORED.len());
        assert_eq!(map.len(), v.len());
        assert_eq!(map["is_https"], 1.0);
        assert!(map["pattern_business_profile"] > 0.0);
    }

    #[test]
    fn test_unparseable_url() {
        let f = LinkFeatures::extract("not a url", "");
        assert!(!f.is_https);
        assert_eq!(f.path_segments, 0);
    }
}
