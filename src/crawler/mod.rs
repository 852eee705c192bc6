//! Crawler module for request scheduling, fetching and run coordination
//!
//! This module contains the core discovery loop, including:
//! - Crawl requests and the tiered priority scheduler
//! - The learned prioritizer's feature vector
//! - Page fetching behind the `Fetcher` trait
//! - HTML parsing and link extraction
//! - The coordinator driving a complete run

mod coordinator;
mod fetcher;
mod parser;
mod prioritizer;
mod request;
mod scheduler;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use parser::{extract_title, parse_html, DiscoveredLink, ParsedPage};
pub use prioritizer::{training_target, PriorityFeatures, FEATURE_COUNT};
pub use request::CrawlRequest;
pub use scheduler::{FailedRequest, Scheduler, SchedulerStats};
