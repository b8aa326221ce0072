//! Crawl coordination
//!
//! The coordinator parses the seed URL, derives the registrable domain,
//! owns the worker registry, and waits for global quiescence before
//! emitting the final summary line. Workers are spawned lazily, one per
//! in-domain authority, as link routing first encounters each host.

use crate::config::Config;
use crate::crawler::state::CrawlState;
use crate::crawler::worker::Worker;
use crate::output::{CrawlSummary, ReportSink};
use crate::url::{registrable_domain, Target};
use crate::{CrawlError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

/// Registry of subdomain workers, keyed by authority.
///
/// Lookup plus spawn is atomic per authority: the registry lock is held
/// across both, so exactly one worker ever exists for a host.
pub struct Registry {
    state: Arc<CrawlState>,
    workers: Mutex<HashMap<String, WorkerEntry>>,
}

struct WorkerEntry {
    tx: mpsc::UnboundedSender<Target>,
    handle: Option<JoinHandle<()>>,
}

impl Registry {
    pub fn new(state: Arc<CrawlState>) -> Self {
        Self {
            state,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Delivers a target to its authority's worker, spawning the worker
    /// first if this host has not been seen before
    pub fn route(self: &Arc<Self>, target: Target) {
        let authority = target.host_port();
        let mut workers = self.workers.lock().expect("worker registry poisoned");

        if !workers.contains_key(&authority) {
            if workers.len() >= self.state.config.crawler.max_workers {
                tracing::warn!(
                    "worker limit ({}) reached; dropping {}",
                    self.state.config.crawler.max_workers,
                    target.url()
                );
                self.state.finish_pending();
                return;
            }
            let entry = self.spawn(authority.clone());
            workers.insert(authority.clone(), entry);
        }

        let entry = workers.get(&authority).expect("worker entry just ensured");
        if entry.tx.send(target).is_err() {
            tracing::warn!("worker inbox for {} closed; dropping target", authority);
            self.state.finish_pending();
        }
    }

    fn spawn(self: &Arc<Self>, authority: String) -> WorkerEntry {
        let (tx, rx) = mpsc::unbounded_channel();
        let index = self.state.next_worker_index();
        tracing::debug!("spawning worker {} for {}", index, authority);

        let worker = Worker::new(authority, index, self.state.clone(), self.clone(), rx);
        let handle = tokio::spawn(worker.run());

        WorkerEntry {
            tx,
            handle: Some(handle),
        }
    }

    /// Takes the join handles of workers not yet awaited; their inbox
    /// senders stay registered so routing keeps working
    fn take_handles(&self) -> Vec<JoinHandle<()>> {
        self.workers
            .lock()
            .expect("worker registry poisoned")
            .values_mut()
            .filter_map(|entry| entry.handle.take())
            .collect()
    }

    fn abort_all(&self) {
        for handle in self.take_handles() {
            handle.abort();
        }
    }
}

/// Runs a complete crawl from the seed URL.
///
/// The seed must begin with `http://` or `https://`. The registrable
/// domain derived from its hostname bounds the whole run; the first
/// worker is created for the seed's host and the run ends when every
/// worker has drained. The final report line is
/// `<N> pages crawled.` where N counts visited pages plus fetched
/// robots.txt files.
pub async fn crawl(seed: &str, config: Config, sink: Arc<dyn ReportSink>) -> Result<CrawlSummary> {
    let seed = seed.trim_end_matches('/');

    if !seed.starts_with("http://") && !seed.starts_with("https://") {
        return Err(CrawlError::InvalidSeed(format!(
            "'{}' must begin with http:// or https://",
            seed
        )));
    }

    // syntactic sanity check before the crawler's own model takes over
    Url::parse(seed).map_err(|e| CrawlError::InvalidSeed(format!("'{}': {}", seed, e)))?;

    let mut target = Target::parse(seed)?;
    target.needs_robots = true;

    let domain = registrable_domain(&target.host);
    tracing::info!("crawling domain '{}' from seed {}", domain, target.url());

    let state = Arc::new(CrawlState::new(config, domain, sink)?);
    let registry = Arc::new(Registry::new(state.clone()));
    let run_started = Instant::now();

    state.add_pending(1);
    registry.route(target);

    wait_for_quiescence(&state, &registry).await;

    if let Some(fatal) = state.take_fatal() {
        registry.abort_all();
        return Err(fatal);
    }

    let summary = CrawlSummary {
        pages: state.visited.len(),
        robots_files: state.robots.fetched_count(),
        workers: state.workers(),
        elapsed: run_started.elapsed(),
    };

    state.sink.line(&format!("{} pages crawled.", summary.total()));

    Ok(summary)
}

/// Waits until no targets remain in flight and every worker has exited.
///
/// Workers observe the shared pending counter and exit on their own;
/// the coordinator joins them in waves, picking up workers spawned
/// while it was waiting, and falls back to a periodic poll when nothing
/// is joinable yet.
async fn wait_for_quiescence(state: &Arc<CrawlState>, registry: &Arc<Registry>) {
    let poll = Duration::from_millis(state.config.crawler.quiescence_poll_ms);

    loop {
        let handles = registry.take_handles();

        if handles.is_empty() {
            if state.pending() == 0 || state.is_fatal() {
                break;
            }
            tokio::time::sleep(poll).await;
            continue;
        }

        for handle in handles {
            if state.is_fatal() {
                handle.abort();
            } else {
                let _ = handle.await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;

    #[tokio::test]
    async fn test_seed_must_be_http() {
        let sink = Arc::new(MemorySink::new());
        let result = crawl("ftp://example.com", Config::default(), sink).await;
        assert!(matches!(result, Err(CrawlError::InvalidSeed(_))));
    }

    #[tokio::test]
    async fn test_seed_must_parse() {
        let sink = Arc::new(MemorySink::new());
        let result = crawl("http://bad host", Config::default(), sink).await;
        assert!(matches!(result, Err(CrawlError::InvalidSeed(_))));
    }

    #[tokio::test]
    async fn test_seed_trailing_slashes_stripped() {
        // invalid scheme surfaces before any parsing of the stripped form
        let sink = Arc::new(MemorySink::new());
        let result = crawl("example.com///", Config::default(), sink).await;
        assert!(matches!(result, Err(CrawlError::InvalidSeed(_))));
    }
}
