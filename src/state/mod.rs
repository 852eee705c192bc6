//! Shared state types used across the discovery engine
//!
//! # Components
//!
//! - `CrawlPriority`: dispatch tiers (CRITICAL..BACKGROUND, plus IGNORE)
//! - `LinkCategory`: what a classified link is expected to contain
//! - `CrawlStats`: incrementally aggregated per-URL / per-domain outcomes
//! - `RunState`: orchestrator lifecycle (INIT → RUNNING → STOPPED)
//! - `ModelSlot`: atomically swappable holder for trained models

mod category;
mod crawl_stats;
mod model_slot;
mod priority;
mod run_state;

pub use category::LinkCategory;
pub use crawl_stats::CrawlStats;
pub use model_slot::ModelSlot;
pub use priority::CrawlPriority;
pub use run_state::{RunState, StopReason};
