//! Page fetching
//!
//! This module handles:
//! - The `Fetcher` collaborator trait the coordinator depends on
//! - Building HTTP clients with proper user agent strings
//! - The reqwest-backed `HttpFetcher` (robots.txt, content-type check, link parsing)
//! - Error classification into retryable and permanent failures

use crate::config::UserAgentConfig;
use crate::crawler::parser::{parse_html, DiscoveredLink};
use crate::robots::{fetch_robots, origin_of, RobotsCache};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// A fetched and parsed HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status_code: u16,
    pub html: String,
    pub title: Option<String>,

    /// Absolute links found on the page
    pub links: Vec<DiscoveredLink>,

    /// Wall-clock fetch time in seconds
    pub response_time: f64,
}

/// Why a fetch failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("disallowed by robots.txt")]
    Disallowed,

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("not an HTML page ({0})")]
    NotHtml(String),
}

impl FetchError {
    /// Whether the scheduler should retry the request
    ///
    /// | Condition | Retry |
    /// |-----------|-------|
    /// | Timeout, network error | yes |
    /// | HTTP 5xx, 408, 429 | yes |
    /// | Other HTTP status | no |
    /// | robots.txt, non-HTML, bad URL | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Status(code) => *code >= 500 || *code == 408 || *code == 429,
            Self::InvalidUrl(_) | Self::Disallowed | Self::NotHtml(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Network(format!("connection failed: {}", e))
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Fetches pages for the coordinator
///
/// Implementations may render with a browser or do a plain HTTP GET; either
/// way they return raw HTML plus the absolute links found on the page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use sumi_scout::config::UserAgentConfig;
/// use sumi_scout::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiScout".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetcher that honors robots.txt
pub struct HttpFetcher {
    client: Client,
    robots: RobotsCache,

    /// Product token matched against robots.txt groups
    agent_token: String,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?, &config.crawler_name))
    }

    pub fn with_client(client: Client, agent_token: &str) -> Self {
        Self {
            client,
            robots: RobotsCache::new(),
            agent_token: agent_token.to_string(),
        }
    }

    async fn allowed(&self, url: &Url) -> bool {
        let origin = origin_of(url);
        let robots = match self.robots.get(&origin) {
            Some(robots) => robots,
            None => {
                let robots = fetch_robots(&self.client, &origin).await;
                self.robots.insert(&origin, robots.clone());
                robots
            }
        };
        robots.is_allowed(url.as_str(), &self.agent_token)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Fetches a page
    ///
    /// # Request Flow
    ///
    /// 1. Check robots.txt for the origin (cached)
    /// 2. Send GET, following up to 10 redirects
    /// 3. Reject non-2xx statuses and non-HTML content types
    /// 4. Parse the body for title and links
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        if !self.allowed(&parsed).await {
            return Err(FetchError::Disallowed);
        }

        let started = Instant::now();
        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(FetchError::NotHtml(content_type));
        }

        let html = response.text().await?;
        let response_time = started.elapsed().as_secs_f64();
        let page = parse_html(&html, &final_url);

        tracing::debug!(
            "Fetched {} ({}, {} links, {:.2}s)",
            final_url,
            status.as_u16(),
            page.links.len(),
            response_time
        );

        Ok(FetchedPage {
            url: final_url.to_string(),
            status_code: status.as_u16(),
            html,
            title: page.title,
            links: page.links,
            response_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestScout".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&create_test_config()).is_ok());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Network("reset".into()).is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Status(429).is_retryable());
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Disallowed.is_retryable());
        assert!(!FetchError::NotHtml("application/pdf".into()).is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    r#"<html><head><title>Acme Corp</title></head>
                    <body><a href="/about">About us</a></body></html>"#,
                    "text/html",
                ),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let page = fetcher.fetch(&format!("{}/", server.uri())).await.unwrap();

        assert_eq!(page.status_code, 200);
        assert_eq!(page.title.as_deref(), Some("Acme Corp"));
        assert_eq!(page.links.len(), 1);
        assert_eq!(page.links[0].url, format!("{}/about", server.uri()));
        assert_eq!(page.links[0].anchor_text, "About us");
    }

    #[tokio::test]
    async fn test_fetch_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(503));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/report.pdf"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "application/pdf"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/report.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotHtml(_)));
    }

    #[tokio::test]
    async fn test_fetch_honors_robots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/\n"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/private/page", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Disallowed);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
