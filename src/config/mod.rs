//! Configuration module
//!
//! Crawl behavior is tunable through an optional TOML file; every knob
//! has a default matching the crawler's built-in constants, so the file
//! may be omitted entirely or specify only the keys it cares about.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{Config, CrawlerConfig, UserAgentConfig};
pub use validation::validate;
