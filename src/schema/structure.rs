//! Page structure analysis

use scraper::{Html, Selector};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Coarse page type inferred from title and keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Contact,
    About,
    Product,
    News,
    General,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::About => "about",
            Self::Product => "product",
            Self::News => "news",
            Self::General => "general",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const PAGE_KEYWORDS: &[(PageType, &[&str])] = &[
    (
        PageType::Contact,
        &["contact", "get in touch", "reach us", "email us", "call us"],
    ),
    (
        PageType::About,
        &["about", "our story", "who we are", "our mission", "our team"],
    ),
    (
        PageType::Product,
        &["product", "service", "pricing", "solutions", "features"],
    ),
    (
        PageType::News,
        &["news", "press", "blog", "announcement", "press release"],
    ),
];

/// Structural profile of one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageStructure {
    pub title: Option<String>,
    pub table_count: usize,
    pub form_count: usize,
    pub list_count: usize,
    pub heading_count: usize,
    pub link_count: usize,
    pub page_type: PageType,

    /// Tag names of the body's direct children, in order
    pub skeleton: Vec<String>,
}

impl PageStructure {
    pub fn analyze(document: &Html) -> Self {
        let count = |css: &str| {
            Selector::parse(css)
                .map(|sel| document.select(&sel).count())
                .unwrap_or(0)
        };

        let title = crate::crawler::extract_title(document);
        let body_text = Selector::parse("body")
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .map(|body| body.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        let skeleton = Selector::parse("body > *")
            .map(|sel| {
                document
                    .select(&sel)
                    .map(|el| el.value().name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            page_type: classify_page(title.as_deref().unwrap_or(""), &body_text),
            title,
            table_count: count("table"),
            form_count: count("form"),
            list_count: count("ul, ol, dl"),
            heading_count: count("h1, h2, h3, h4, h5, h6"),
            link_count: count("a[href]"),
            skeleton,
        }
    }

    pub fn has_tables(&self) -> bool {
        self.table_count > 0
    }

    pub fn has_forms(&self) -> bool {
        self.form_count > 0
    }

    pub fn has_lists(&self) -> bool {
        self.list_count > 0
    }

    /// Hex SHA-256 of the template-level profile
    ///
    /// Counts are bucketed so that pages of one template with slightly
    /// different content share a signature.
    pub fn signature(&self) -> String {
        let profile = format!(
            "{}|t{}|f{}|l{}|h{}|{}",
            self.page_type,
            bucket(self.table_count),
            bucket(self.form_count),
            bucket(self.list_count),
            bucket(self.heading_count),
            self.skeleton.join(",")
        );
        let mut hasher = Sha256::new();
        hasher.update(profile.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// 0, 1, 2-4, 5+
fn bucket(n: usize) -> u8 {
    match n {
        0 => 0,
        1 => 1,
        2..=4 => 2,
        _ => 3,
    }
}

/// Title keywords weigh twice as much as body keywords; earlier types win ties
fn classify_page(title: &str, body: &str) -> PageType {
    let title = title.to_lowercase();
    let body = body.to_lowercase();

    let mut best = (PageType::General, 0usize);
    for (page_type, keywords) in PAGE_KEYWORDS {
        let score: usize = keywords
            .iter()
            .map(|kw| 2 * usize::from(title.contains(kw)) + usize::from(body.contains(kw)))
            .sum();
        if score > best.1 {
            best = (*page_type, score);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(html: &str) -> PageStructure {
        PageStructure::analyze(&Html::parse_document(html))
    }

    #[test]
    fn test_counts() {
        let s = analyze(
            r#"<html><body>
            <h1>Acme</h1><h2>Team</h2>
            <table><tr><td>1</td></tr></table>
            <form><input name="q"></form>
            <ul><li>a</li></ul><dl><dt>x</dt><dd>y</dd></dl>
            <a href="/a">a</a>
            </body></html>"#,
        );
        assert_eq!(s.heading_count, 2);
        assert!(s.has_tables());
        assert!(s.has_forms());
        assert_eq!(s.list_count, 2);
        assert_eq!(s.link_count, 1);
    }

    #[test]
    fn test_page_type_from_title() {
        let s = analyze("<html><head><title>Contact Us</title></head><body><p>Hello</p></body></html>");
        assert_eq!(s.page_type, PageType::Contact);

        let s = analyze("<html><head><title>Press Releases</title></head><body></body></html>");
        assert_eq!(s.page_type, PageType::News);
    }

    #[test]
    fn test_page_type_general() {
        let s = analyze("<html><body><p>Lorem ipsum</p></body></html>");
        assert_eq!(s.page_type, PageType::General);
    }

    #[test]
    fn test_signature_stable_across_content() {
        let a = analyze("<html><head><title>About</title></head><body><h1>Acme</h1><p>One</p></body></html>");
        let b = analyze("<html><head><title>About</title></head><body><h1>Beta</h1><p>Two</p></body></html>");
        let c = analyze("<html><head><title>About</title></head><body><table></table></body></html>");

        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.signature(), c.signature());
        assert_eq!(a.signature().len(), 64);
    }
}
