//! Process-wide crawl state
//!
//! One [`CrawlState`] is shared by the coordinator and every subdomain
//! worker. It owns the visited set, the robots cache, the pending-target
//! counter used for quiescence detection, and the shared HTTP client.

use crate::config::Config;
use crate::output::ReportSink;
use crate::robots::RobotsManager;
use crate::CrawlError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Set of canonical URL strings already dispatched to a loader.
///
/// Insertion is atomic test-and-set: exactly one caller wins the right
/// to load any given URL.
#[derive(Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the URL, returning true if it was not already present
    pub fn insert(&self, url: &str) -> bool {
        self.inner
            .lock()
            .expect("visited set poisoned")
            .insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.inner
            .lock()
            .expect("visited set poisoned")
            .contains(url)
    }

    /// Removes a URL; used when a watchdog-cancelled fetch is re-queued
    pub fn remove(&self, url: &str) -> bool {
        self.inner.lock().expect("visited set poisoned").remove(url)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("visited set poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-fetch reporting context supplied by the dispatching worker
#[derive(Debug, Clone, Copy)]
pub struct WorkerStats {
    /// Worker index in spawn order, starting at 1
    pub index: usize,

    /// When this worker started
    pub started: Instant,

    /// Pages this worker has dispatched before the current fetch
    pub local_requested: usize,
}

/// Shared state owned by the coordinator for the lifetime of one run
pub struct CrawlState {
    pub config: Config,

    /// Registrable domain derived from the seed hostname
    pub domain: String,

    pub visited: VisitedSet,

    pub robots: RobotsManager,

    pub sink: Arc<dyn ReportSink>,

    pub client: Client,

    /// Targets alive in some frontier or inbox; zero means quiescence
    pending: AtomicUsize,

    /// Workers spawned so far
    worker_count: AtomicUsize,

    /// Timestamp of the first fetch of the run
    started: Mutex<Option<Instant>>,

    fatal: Mutex<Option<CrawlError>>,
    fatal_flag: AtomicBool,
}

impl CrawlState {
    pub fn new(config: Config, domain: String, sink: Arc<dyn ReportSink>) -> crate::Result<Self> {
        let client = build_http_client(&config)?;
        let robots = RobotsManager::new(config.user_agent.crawler_name.clone());

        Ok(Self {
            config,
            domain,
            visited: VisitedSet::new(),
            robots,
            sink,
            client,
            pending: AtomicUsize::new(0),
            worker_count: AtomicUsize::new(0),
            started: Mutex::new(None),
            fatal: Mutex::new(None),
            fatal_flag: AtomicBool::new(false),
        })
    }

    pub fn add_pending(&self, n: usize) {
        self.pending.fetch_add(n, Ordering::SeqCst);
    }

    pub fn finish_pending(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Registers a new worker, returning its 1-based index
    pub fn next_worker_index(&self) -> usize {
        self.worker_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn workers(&self) -> usize {
        self.worker_count.load(Ordering::SeqCst)
    }

    /// Records the first fetch timestamp; later calls are no-ops
    pub fn mark_started(&self) {
        let mut started = self.started.lock().expect("start time poisoned");
        if started.is_none() {
            *started = Some(Instant::now());
        }
    }

    /// Overall request rate in pages per second since the first fetch.
    /// Counts successful pages plus fetched robots.txt files.
    pub fn global_rate(&self) -> f64 {
        let started = self.started.lock().expect("start time poisoned");
        match *started {
            Some(t) => {
                let secs = t.elapsed().as_secs_f64().max(0.001);
                (self.visited.len() + self.robots.fetched_count()) as f64 / secs
            }
            None => 0.0,
        }
    }

    /// Total requests made so far: visited pages plus robots files
    pub fn global_requested(&self) -> usize {
        self.visited.len() + self.robots.fetched_count()
    }

    /// Records the first fatal error; the run aborts at the next check
    pub fn set_fatal(&self, e: CrawlError) {
        let mut fatal = self.fatal.lock().expect("fatal slot poisoned");
        if fatal.is_none() {
            *fatal = Some(e);
            self.fatal_flag.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal_flag.load(Ordering::SeqCst)
    }

    pub fn take_fatal(&self) -> Option<CrawlError> {
        self.fatal.lock().expect("fatal slot poisoned").take()
    }
}

/// Builds the shared HTTP client.
///
/// Redirects are not followed automatically: the loader and the robots
/// manager need the raw 301/302 Location header to apply their own
/// single-hop redirect rules.
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("text/html,text"));

    Client::builder()
        .user_agent(config.user_agent.crawler_name.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.crawler.connect_timeout_secs))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;

    fn test_state() -> CrawlState {
        CrawlState::new(
            Config::default(),
            "example.com".to_string(),
            Arc::new(MemorySink::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_visited_insert_is_test_and_set() {
        let visited = VisitedSet::new();
        assert!(visited.insert("https://example.com/a"));
        assert!(!visited.insert("https://example.com/a"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_visited_remove() {
        let visited = VisitedSet::new();
        visited.insert("https://example.com/a");
        assert!(visited.remove("https://example.com/a"));
        assert!(!visited.contains("https://example.com/a"));
        assert!(visited.insert("https://example.com/a"));
    }

    #[test]
    fn test_pending_counter() {
        let state = test_state();
        assert_eq!(state.pending(), 0);
        state.add_pending(3);
        assert_eq!(state.pending(), 3);
        state.finish_pending();
        assert_eq!(state.pending(), 2);
    }

    #[test]
    fn test_worker_indices_start_at_one() {
        let state = test_state();
        assert_eq!(state.next_worker_index(), 1);
        assert_eq!(state.next_worker_index(), 2);
        assert_eq!(state.workers(), 2);
    }

    #[test]
    fn test_global_rate_zero_before_first_fetch() {
        let state = test_state();
        assert_eq!(state.global_rate(), 0.0);
    }

    #[test]
    fn test_fatal_first_error_wins() {
        let state = test_state();
        assert!(!state.is_fatal());

        state.set_fatal(CrawlError::SwitchingProtocols {
            url: "https://example.com/robots.txt".to_string(),
        });
        state.set_fatal(CrawlError::InvalidSeed("second".to_string()));

        assert!(state.is_fatal());
        let taken = state.take_fatal().unwrap();
        assert!(matches!(taken, CrawlError::SwitchingProtocols { .. }));
    }

    #[test]
    fn test_build_http_client() {
        let config = Config::default();
        assert!(build_http_client(&config).is_ok());
    }
}
