//! Subdomain worker
//!
//! One worker runs breadth-first search over the pages of a single
//! host. It drains its frontier level by level, consulting the robots
//! manager and pacer before every fetch, and routes discovered links to
//! itself or to sibling workers via the registry. A worker exits when
//! its frontier and inbox are empty and no targets remain in flight
//! anywhere in the run.

use crate::crawler::coordinator::Registry;
use crate::crawler::loader::PageLoader;
use crate::crawler::pacer::{watchdog_timeout, Pacer};
use crate::crawler::state::{CrawlState, WorkerStats};
use crate::url::{has_ignored_extension, Target};
use crate::Result;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

pub struct Worker {
    /// Authority this worker is responsible for (host plus any port)
    authority: String,

    /// Spawn-order index, starting at 1
    index: usize,

    state: Arc<CrawlState>,

    registry: Arc<Registry>,

    /// Targets routed here by other workers or the coordinator
    inbox: mpsc::UnboundedReceiver<Target>,

    /// URLs this worker has dispatched; local dedup distinct from the
    /// global visited set
    requested: HashSet<String>,

    pacer: Pacer,

    started: Instant,

    local_requested: usize,
}

impl Worker {
    pub(crate) fn new(
        authority: String,
        index: usize,
        state: Arc<CrawlState>,
        registry: Arc<Registry>,
        inbox: mpsc::UnboundedReceiver<Target>,
    ) -> Self {
        Self {
            authority,
            index,
            state,
            registry,
            inbox,
            requested: HashSet::new(),
            pacer: Pacer::new(),
            started: Instant::now(),
            local_requested: 0,
        }
    }

    /// Runs the worker's BFS loop to completion
    pub async fn run(mut self) {
        tracing::debug!("worker {} started for {}", self.index, self.authority);

        let poll = Duration::from_millis(self.state.config.crawler.completion_poll_ms);
        let mut frontier: VecDeque<Target> = VecDeque::new();

        loop {
            while let Ok(target) = self.inbox.try_recv() {
                frontier.push_back(target);
            }

            if self.state.is_fatal() {
                for _ in frontier.drain(..) {
                    self.state.finish_pending();
                }
                while self.inbox.try_recv().is_ok() {
                    self.state.finish_pending();
                }
                break;
            }

            if frontier.is_empty() {
                if self.state.pending() == 0 {
                    break;
                }
                tokio::time::sleep(poll).await;
                continue;
            }

            // process one BFS level; discoveries go into the next level
            let level: Vec<Target> = frontier.drain(..).collect();
            let mut next: VecDeque<Target> = VecDeque::new();

            for target in level {
                if self.state.is_fatal() {
                    self.state.finish_pending();
                    continue;
                }
                if let Err(fatal) = self.process(target, &mut next).await {
                    self.state.set_fatal(fatal);
                }
            }

            frontier = next;
        }

        tracing::debug!(
            "worker {} for {} finished ({} pages)",
            self.index,
            self.authority,
            self.local_requested
        );
    }

    /// Handles a single frontier target end to end
    async fn process(&mut self, target: Target, next: &mut VecDeque<Target>) -> Result<()> {
        if target.host_port() != self.authority
            || !target.is_fetchable()
            || has_ignored_extension(&target.path)
        {
            self.state.finish_pending();
            return Ok(());
        }

        // no page is fetched while its host's robots state is unresolved;
        // a false hint means the state was already decided at enqueue time
        if target.needs_robots {
            if let Err(fatal) = self
                .state
                .robots
                .ensure(&self.state.client, &target, self.state.sink.as_ref())
                .await
            {
                self.state.finish_pending();
                return Err(fatal);
            }
        }

        let url = target.url();

        if !self.state.robots.allowed(&self.authority, &url) {
            self.state
                .sink
                .line(&format!("/robots.txt DISALLOW [{}]", url));
            self.state.finish_pending();
            return Ok(());
        }

        // first inserter wins the race; losers drop the target
        if !self.state.visited.insert(&url) {
            self.state.finish_pending();
            return Ok(());
        }
        self.requested.insert(url.clone());

        let delay = self
            .state
            .robots
            .delay(&self.authority, self.state.config.crawler.default_crawl_delay);
        self.pacer
            .pace(delay, self.state.workers(), self.state.config.crawler.throttle_factor)
            .await;
        self.state.mark_started();

        let stats = WorkerStats {
            index: self.index,
            started: self.started,
            local_requested: self.local_requested,
        };
        let loader = PageLoader::new(self.state.clone());
        let watchdog = watchdog_timeout(delay, self.state.config.crawler.watchdog_multiplier);

        match tokio::time::timeout(watchdog, loader.load(&target, &self.requested, stats)).await {
            Ok(Ok(links)) => {
                self.local_requested += 1;
                self.route(links, next);
                self.state.finish_pending();
                Ok(())
            }
            Ok(Err(fatal)) => {
                self.local_requested += 1;
                self.state.finish_pending();
                Err(fatal)
            }
            Err(_) => {
                // watchdog fired: cancel the fetch and retry at the head
                // of the next level with no penalty
                self.state.visited.remove(&url);
                self.requested.remove(&url);
                next.push_front(target);
                self.state.sink.line("RECRAWLING 1 PENDING TARGETS!");
                Ok(())
            }
        }
    }

    /// Classifies extracted links: own host goes to the next BFS level,
    /// sibling subdomains are routed through the registry
    fn route(&mut self, links: Vec<Target>, next: &mut VecDeque<Target>) {
        for mut link in links {
            let link_authority = link.host_port();
            link.needs_robots = !self.state.robots.is_resolved(&link_authority);

            self.state.add_pending(1);
            if link_authority == self.authority {
                next.push_back(link);
            } else {
                tracing::trace!("routing {} to worker for {}", link.url(), link_authority);
                self.registry.route(link);
            }
        }
    }
}
