//! Rickbot main entry point
//!
//! This is the command-line interface for the rickbot crawler.

use clap::Parser;
use rickbot::config::{load_config, Config};
use rickbot::crawler::crawl;
use rickbot::output::StdoutSink;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Rickbot: a polite single-domain web crawler
///
/// Crawls every reachable HTML page under the seed URL's registrable
/// domain (all subdomains included), respecting robots.txt rules and
/// crawl delays, and prints a per-page report to stdout.
#[derive(Parser, Debug)]
#[command(name = "crawl")]
#[command(version = "1.0.0")]
#[command(about = "A polite single-domain web crawler", long_about = None)]
struct Cli {
    /// Seed URL; must begin with http:// or https://
    #[arg(value_name = "URL")]
    url: String,

    /// Path to an optional TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error diagnostics
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    match crawl(&cli.url, config, Arc::new(StdoutSink)).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed: {} pages, {} robots files, {} workers in {:.1}s",
                summary.pages,
                summary.robots_files,
                summary.workers,
                summary.elapsed.as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rickbot=warn"),
            1 => EnvFilter::new("rickbot=info,warn"),
            2 => EnvFilter::new("rickbot=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
