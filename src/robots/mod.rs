//! Robots.txt handling module
//!
//! This module fetches, parses, and caches robots.txt files so that the HTTP
//! fetcher can skip disallowed URLs.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use reqwest::Client;

/// Fetches robots.txt for an origin
///
/// Missing files (4xx) allow everything. Server errors and network failures
/// also allow everything, but are logged.
///
/// # Arguments
///
/// * `client` - HTTP client carrying the crawler's user agent
/// * `origin` - `scheme://host[:port]` without trailing slash
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin);

    match client.get(&robots_url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        },
        Ok(response) => {
            if response.status().is_server_error() {
                tracing::warn!(
                    "robots.txt at {} returned {}, allowing all",
                    robots_url,
                    response.status()
                );
            }
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

/// Returns the origin (`scheme://host[:port]`) of an absolute URL
pub fn origin_of(url: &::url::Url) -> String {
    url.origin().ascii_serialization()
}
