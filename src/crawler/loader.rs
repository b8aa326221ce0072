//! Page loading
//!
//! Fetches one URL, applies the redirect and content gates, and returns
//! the in-domain links extracted from the body. Every terminal outcome
//! produces at most one report line for the URL.

use crate::crawler::extract::extract_links;
use crate::crawler::state::{CrawlState, WorkerStats};
use crate::url::{in_domain, Target};
use crate::{CrawlError, Result};
use std::collections::HashSet;
use std::sync::Arc;

pub struct PageLoader {
    state: Arc<CrawlState>,
}

impl PageLoader {
    pub fn new(state: Arc<CrawlState>) -> Self {
        Self { state }
    }

    /// Fetches one page and returns newly discovered in-domain targets.
    ///
    /// Exactly one 301/302 hop is handled here; the redirected location
    /// must stay in-domain and becomes the page's canonical URL for the
    /// rest of the fetch. Non-text and non-HTML bodies are dropped
    /// without a report line. An HTTP 101 aborts the whole run.
    pub async fn load(
        &self,
        target: &Target,
        requested: &HashSet<String>,
        stats: WorkerStats,
    ) -> Result<Vec<Target>> {
        let mut current = target.clone();
        let mut url = current.url();

        let mut response = match self.state.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.state.sink.line(&format!("  ERROR {} [{}]", e, url));
                return Ok(Vec::new());
            }
        };

        let mut status = response.status().as_u16();

        if status == 301 || status == 302 {
            let location = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .map(String::from);

            let Some(location) = location else {
                self.state.sink.line(&format!("  REDIRECT FAILED TO {}", url));
                return Ok(Vec::new());
            };

            let Ok(redirected) = Target::parse(&location) else {
                self.state
                    .sink
                    .line(&format!("  REDIRECT FAILED TO {}", location));
                return Ok(Vec::new());
            };

            if !in_domain(&redirected.host, &self.state.domain) {
                // redirects out of the domain are dropped silently
                return Ok(Vec::new());
            }

            if !self.state.visited.insert(&redirected.url()) {
                return Ok(Vec::new());
            }

            current = redirected;
            url = current.url();
            tracing::debug!("following redirect to {}", url);

            response = match self.state.client.get(&url).send().await {
                Ok(response) => response,
                Err(_) => {
                    self.state.sink.line(&format!("  REDIRECT FAILED TO {}", url));
                    return Ok(Vec::new());
                }
            };
            status = response.status().as_u16();
        }

        if status == 101 {
            self.state.sink.line(&format!(
                "  ERROR 101 Switching Protocols not supported. 101 [{}]",
                url
            ));
            return Err(CrawlError::SwitchingProtocols { url });
        }

        if status != 200 {
            self.state.sink.line(&format!("  ERROR {} [{}]", status, url));
            return Ok(Vec::new());
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("text") {
            return Ok(Vec::new());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.state.sink.line(&format!("  ERROR {} [{}]", e, url));
                return Ok(Vec::new());
            }
        };

        if !is_html_document(&body) {
            return Ok(Vec::new());
        }

        self.emit_success(&url, &stats);

        Ok(extract_links(
            &body,
            &current,
            &self.state.domain,
            &self.state.visited,
            requested,
        ))
    }

    fn emit_success(&self, url: &str, stats: &WorkerStats) {
        let local_secs = stats.started.elapsed().as_secs_f64().max(0.001);
        let local_rate = (stats.local_requested + 1) as f64 / local_secs;

        self.state.sink.line(&format!(
            "• {:.1}/{:.1} Crawler[{}/{}] {} [{}/{}]",
            local_rate,
            self.state.global_rate(),
            stats.index,
            self.state.workers(),
            url,
            stats.local_requested + 1,
            self.state.global_requested(),
        ));
    }
}

/// Accepts bodies with no DOCTYPE declaration, or one that names `html`
/// (any case, arbitrary spacing)
fn is_html_document(body: &str) -> bool {
    const DOCTYPE: &str = "<!DOCTYPE ";

    let Some(idx) = body.find(DOCTYPE) else {
        return true;
    };
    let rest = body[idx + DOCTYPE.len()..].trim_start_matches(' ');
    rest.get(..4)
        .map_or(false, |token| token.eq_ignore_ascii_case("html"))
}
