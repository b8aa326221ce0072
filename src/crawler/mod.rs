//! Crawler module
//!
//! This module contains the concurrent crawl engine:
//! - the coordinator owning process-wide state and the worker registry
//! - per-subdomain BFS workers with private frontiers and inboxes
//! - the page loader with single-hop redirect handling
//! - regex-driven link extraction
//! - per-host delay pacing with quadratic global back-pressure

mod coordinator;
mod extract;
mod loader;
mod pacer;
mod state;
mod worker;

pub use coordinator::{crawl, Registry};
pub use extract::extract_links;
pub use loader::PageLoader;
pub use pacer::{throttle_secs, watchdog_timeout, Pacer};
pub use state::{build_http_client, CrawlState, VisitedSet, WorkerStats};

pub use crate::output::CrawlSummary;
