//! Output handling
//!
//! The crawler's per-page report is line oriented and bit-stable: every
//! page, robots.txt fetch, and error produces exactly one line through a
//! [`ReportSink`]. Diagnostics go through `tracing` instead so verbosity
//! never disturbs the report stream.

use std::sync::Mutex;
use std::time::Duration;

/// Line-oriented sink for the crawl report
pub trait ReportSink: Send + Sync {
    /// Writes one complete report line
    fn line(&self, s: &str);
}

/// Writes report lines to stdout
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn line(&self, s: &str) {
        println!("{}", s);
    }
}

/// Captures report lines in memory; used by tests to assert on the
/// emitted report
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines captured so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("sink poisoned").clone()
    }

    /// True if any captured line contains the fragment
    pub fn contains(&self, fragment: &str) -> bool {
        self.lines
            .lock()
            .expect("sink poisoned")
            .iter()
            .any(|l| l.contains(fragment))
    }

    /// Number of captured lines containing the fragment
    pub fn count_containing(&self, fragment: &str) -> usize {
        self.lines
            .lock()
            .expect("sink poisoned")
            .iter()
            .filter(|l| l.contains(fragment))
            .count()
    }
}

impl ReportSink for MemorySink {
    fn line(&self, s: &str) {
        self.lines.lock().expect("sink poisoned").push(s.to_string());
    }
}

/// Summary statistics for a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// URLs dispatched to the loader (success or failure)
    pub pages: usize,

    /// Hosts whose robots.txt was fetched successfully
    pub robots_files: usize,

    /// Subdomain workers spawned over the run
    pub workers: usize,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// The page count reported in the final summary line: visited pages
    /// plus fetched robots.txt files
    pub fn total(&self) -> usize {
        self.pages + self.robots_files
    }
}
