//! Robots.txt rule matching
//!
//! Rule semantics are delegated to the robotstxt crate; the crawl delay
//! is extracted separately by a literal scan of the raw body because the
//! upstream parser does not surface it reliably.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data for one host
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt body as fetched
    raw: String,
    /// Crawl delay in whole seconds
    delay: u64,
}

impl RobotsRules {
    /// Wraps a raw robots.txt body, extracting the crawl delay
    pub fn new(raw: String) -> Self {
        let delay = scan_crawl_delay(&raw);
        Self { raw, delay }
    }

    /// Checks whether the full URL is permitted for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.raw, user_agent, url)
    }

    /// The crawl delay in seconds; defaults to 1 when the directive is
    /// absent or unparseable
    pub fn crawl_delay(&self) -> u64 {
        self.delay
    }
}

/// Scans the raw body for the first `crawl-delay:` directive.
///
/// The token match is case-insensitive; the value is the run of
/// characters after optional spaces, terminated by a space, CR, LF, or
/// end of input, parsed as a decimal integer. Anything else falls back
/// to a delay of 1 second.
fn scan_crawl_delay(body: &str) -> u64 {
    const TOKEN: &[u8] = b"crawl-delay:";

    let bytes = body.as_bytes();
    let Some(found) = find_ascii_ci(bytes, TOKEN) else {
        return 1;
    };

    let mut i = found + TOKEN.len();
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    let start = i;
    while i < bytes.len() && bytes[i] != b' ' && bytes[i] != b'\r' && bytes[i] != b'\n' {
        i += 1;
    }

    body[start..i].parse::<u64>().unwrap_or(1)
}

/// Byte-wise ASCII case-insensitive substring search
fn find_ascii_ci(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
