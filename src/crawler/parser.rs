//! HTML parser for extracting links and metadata
//!
//! This module handles parsing fetched HTML to extract:
//! - Links to follow (from <a> tags and canonical links) with their anchor text
//! - Page title

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DiscoveredLink {
    /// Absolute http(s) URL
    pub url: String,

    /// Visible anchor text, whitespace-collapsed (empty for canonical links)
    pub anchor_text: String,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Links found on the page, first occurrence of each URL only
    pub links: Vec<DiscoveredLink>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```
/// use sumi_scout::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].anchor_text, "Link");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<DiscoveredLink> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(url) = resolve_link(href, base_url) else {
                continue;
            };

            if seen.insert(url.clone()) {
                let text = element.text().collect::<Vec<_>>().join(" ");
                let anchor_text = element
                    .value()
                    .attr("title")
                    .filter(|_| text.trim().is_empty())
                    .map(str::to_string)
                    .unwrap_or(text);
                links.push(DiscoveredLink {
                    url,
                    anchor_text: collapse_whitespace(&anchor_text),
                });
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                if seen.insert(url.clone()) {
                    links.push(DiscoveredLink {
                        url,
                        anchor_text: String::new(),
                    });
                }
            }
        }
    }

    links
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        assert_eq!(parse_html(html, &base_url()).title, None);
    }

    #[test]
    fn test_links_carry_anchor_text() {
        let html = r#"<body>
            <a href="/about">About
               <b>Us</b></a>
            <a href="https://other.com/investors">Investor Relations</a>
        </body>"#;
        let parsed = parse_html(html, &base_url());

        assert_eq!(parsed.links.len(), 2);
        assert_eq!(parsed.links[0].url, "https://example.com/about");
        assert_eq!(parsed.links[0].anchor_text, "About Us");
        assert_eq!(parsed.links[1].anchor_text, "Investor Relations");
    }

    #[test]
    fn test_title_attribute_used_for_empty_anchor() {
        let html = r#"<a href="/contact" title="Contact us"><img src="x.png"></a>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links[0].anchor_text, "Contact us");
    }

    #[test]
    fn test_excluded_links() {
        let html = r##"<body>
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:a@example.com">Mail</a>
            <a href="tel:123">Tel</a>
            <a href="#top">Top</a>
            <a href="/file.zip" download>Download</a>
            <a href="ftp://example.com/x">FTP</a>
            <a href="">Empty</a>
        </body>"##;
        assert!(parse_html(html, &base_url()).links.is_empty());
    }

    #[test]
    fn test_duplicates_and_fragments_collapse() {
        let html = r#"<body>
            <a href="/news#latest">Latest</a>
            <a href="/news">News</a>
        </body>
        <link rel="canonical" href="https://example.com/news">"#;
        let parsed = parse_html(html, &base_url());

        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].url, "https://example.com/news");
        assert_eq!(parsed.links[0].anchor_text, "Latest");
    }

    #[test]
    fn test_canonical_link() {
        let html = r#"<head><link rel="canonical" href="/canonical"></head>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links[0].url, "https://example.com/canonical");
        assert!(parsed.links[0].anchor_text.is_empty());
    }
}
