use serde::Deserialize;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Crawl delay in seconds applied when robots.txt specifies none
    #[serde(rename = "default-crawl-delay")]
    pub default_crawl_delay: u64,

    /// Back-pressure factor: each worker sleeps
    /// `floor(throttle-factor × workers²)` seconds before a fetch
    #[serde(rename = "throttle-factor")]
    pub throttle_factor: f64,

    /// Upper bound on concurrent subdomain workers
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Watchdog timeout as a multiple of the host's crawl delay
    #[serde(rename = "watchdog-multiplier")]
    pub watchdog_multiplier: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Interval between coordinator quiescence checks (milliseconds)
    #[serde(rename = "quiescence-poll-ms")]
    pub quiescence_poll_ms: u64,

    /// Interval at which an idle worker re-checks its inbox (milliseconds)
    #[serde(rename = "completion-poll-ms")]
    pub completion_poll_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_crawl_delay: 1,
            throttle_factor: 0.02,
            max_workers: 100,
            watchdog_multiplier: 10,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            quiescence_poll_ms: 10_000,
            completion_poll_ms: 100,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Token sent in the User-Agent header and matched against
    /// robots.txt user-agent groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "rickbot".to_string(),
        }
    }
}
