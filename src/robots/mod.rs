//! Robots.txt handling module
//!
//! Provides lazy, once-per-host acquisition of robots.txt files and
//! answers allow/delay queries against the cached results.

mod parser;

pub use parser::RobotsRules;

use crate::output::ReportSink;
use crate::url::Target;
use crate::{CrawlError, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Cached robots.txt outcome for one host
#[derive(Debug, Clone)]
pub enum RobotsState {
    /// Fetched but not found or unusable; the host is fully permissive
    Missing,
    /// Fetched and parsed
    Present(Arc<RobotsRules>),
}

/// Lazily fetches and caches per-host robots.txt files.
///
/// The cache is keyed by authority (hostname plus any explicit port),
/// since robots.txt scope follows the authority. A host's state
/// transitions from absent to `Missing` or `Present` exactly once per
/// run; subsequent queries are answered from the cache.
pub struct RobotsManager {
    user_agent: String,
    cache: Mutex<HashMap<String, RobotsState>>,
}

impl RobotsManager {
    pub fn new(user_agent: String) -> Self {
        Self {
            user_agent,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of hosts whose robots.txt was fetched successfully
    pub fn fetched_count(&self) -> usize {
        self.cache
            .lock()
            .expect("robots cache poisoned")
            .values()
            .filter(|s| matches!(s, RobotsState::Present(_)))
            .count()
    }

    /// True once the host's robots state is decided (missing or present)
    pub fn is_resolved(&self, authority: &str) -> bool {
        self.cache
            .lock()
            .expect("robots cache poisoned")
            .contains_key(authority)
    }

    /// Checks whether the full URL is permitted for the crawler's agent.
    ///
    /// Hosts whose robots.txt is missing (or not yet fetched) are treated
    /// as fully permissive.
    pub fn allowed(&self, authority: &str, url: &str) -> bool {
        match self.lookup(authority) {
            Some(RobotsState::Present(rules)) => rules.is_allowed(url, &self.user_agent),
            _ => true,
        }
    }

    /// The crawl delay for a host in seconds, or `default` when the host
    /// has no usable robots.txt
    pub fn delay(&self, authority: &str, default: u64) -> u64 {
        match self.lookup(authority) {
            Some(RobotsState::Present(rules)) => rules.crawl_delay(),
            _ => default,
        }
    }

    fn lookup(&self, authority: &str) -> Option<RobotsState> {
        self.cache
            .lock()
            .expect("robots cache poisoned")
            .get(authority)
            .cloned()
    }

    fn store(&self, authority: &str, state: RobotsState) {
        self.cache
            .lock()
            .expect("robots cache poisoned")
            .entry(authority.to_string())
            .or_insert(state);
    }

    /// Ensures the robots state for the target's host is resolved,
    /// fetching `robots.txt` if this is the first time the host is seen.
    ///
    /// Acquisition protocol:
    /// 1. `GET scheme://host/robots.txt`
    /// 2. A 301/302 is followed once (the redirect may cross scheme);
    ///    the redirected response is authoritative for the host.
    /// 3. 200 stores the body and reports `OK ... crawl-delay=<d>`.
    /// 4. 101 aborts the entire run.
    /// 5. Anything else stores `Missing` and reports `NO ...`.
    pub async fn ensure(
        &self,
        client: &Client,
        target: &Target,
        sink: &dyn ReportSink,
    ) -> Result<()> {
        if self.is_resolved(&target.host_port()) {
            return Ok(());
        }

        let robots_url = format!("{}{}/robots.txt", target.scheme, target.host_port());
        tracing::debug!("Fetching robots.txt from {}", robots_url);

        let outcome = match self.fetch_once(client, &robots_url).await? {
            RobotsFetch::Body(body) => Some(body),
            RobotsFetch::Redirect(location) => {
                // one application-level hop; a bad location means no robots
                tracing::debug!("robots.txt redirected to {}", location);
                if location.to_lowercase().starts_with("http") {
                    match self.fetch_once(client, &location).await? {
                        RobotsFetch::Body(body) => Some(body),
                        _ => None,
                    }
                } else {
                    None
                }
            }
            RobotsFetch::Unavailable => None,
        };

        match outcome {
            Some(body) => {
                let rules = Arc::new(RobotsRules::new(body));
                sink.line(&format!(
                    "OK {}{}/robots.txt crawl-delay={}",
                    target.scheme,
                    target.host_port(),
                    rules.crawl_delay()
                ));
                self.store(&target.host_port(), RobotsState::Present(rules));
            }
            None => {
                sink.line(&format!(
                    "NO {}{}/robots.txt",
                    target.scheme,
                    target.host_port()
                ));
                self.store(&target.host_port(), RobotsState::Missing);
            }
        }

        Ok(())
    }

    async fn fetch_once(&self, client: &Client, url: &str) -> Result<RobotsFetch> {
        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("robots.txt fetch failed for {}: {}", url, e);
                return Ok(RobotsFetch::Unavailable);
            }
        };

        let status = response.status().as_u16();

        if status == 101 {
            return Err(CrawlError::SwitchingProtocols {
                url: url.to_string(),
            });
        }

        if status == 301 || status == 302 {
            let location = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            return Ok(match location {
                Some(location) => RobotsFetch::Redirect(location),
                None => RobotsFetch::Unavailable,
            });
        }

        if status != 200 {
            return Ok(RobotsFetch::Unavailable);
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text")
            .to_string();
        if !content_type.starts_with("text") {
            return Ok(RobotsFetch::Unavailable);
        }

        match response.text().await {
            Ok(body) => Ok(RobotsFetch::Body(body)),
            Err(e) => {
                tracing::debug!("failed to read robots.txt body from {}: {}", url, e);
                Ok(RobotsFetch::Unavailable)
            }
        }
    }
}

enum RobotsFetch {
    Body(String),
    Redirect(String),
    Unavailable,
}
