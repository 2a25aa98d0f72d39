//! Sumi-Wake main entry point
//!
//! This is the command-line interface for the Sumi-Wake crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_wake::config::{resolve_config, validate, Config};
use sumi_wake::crawler::{HttpFetcher, LinksParser, ParserSet, TitleParser};
use sumi_wake::output::{generate_markdown_summary, print_statistics, CrawlStatistics, RunInfo};
use sumi_wake::{Coordinator, CrawlEvent, CrawlRequest};
use tracing_subscriber::EnvFilter;

/// Sumi-Wake: a bounded same-origin crawler
///
/// Sumi-Wake fetches a starting page and follows links on the same origin
/// up to the given depth, fetching every URL at most once.
#[derive(Parser, Debug)]
#[command(name = "sumi-wake")]
#[command(version)]
#[command(about = "A bounded same-origin web crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Link hops to follow from the root (0 fetches the root only, negative is unlimited)
    #[arg(value_name = "DEPTH", allow_negative_numbers = true)]
    depth: i64,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Per-fetch timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Pause between two dispatched fetches in milliseconds
    #[arg(long, value_name = "MS")]
    cooldown_ms: Option<u64>,

    /// Maximum number of fetches in flight
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,

    /// Maximum number of resources to fetch
    #[arg(long, value_name = "N")]
    max_resources: Option<u64>,

    /// Write a markdown summary to this file
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration before logging so the environment picks the format
    let (mut config, config_hash) =
        resolve_config(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    setup_logging(cli.verbose, cli.quiet, config.is_production());

    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("No configuration file given, using defaults"),
    }

    let request = CrawlRequest::from_config(&cli.url, cli.depth, &config.crawler)
        .with_context(|| format!("Invalid URL: {}", cli.url))?;

    let fetcher =
        HttpFetcher::from_config(&config.user_agent).context("Failed to build HTTP client")?;
    let parsers = ParserSet::new()
        .with(Arc::new(LinksParser::new(request.url())))
        .with(Arc::new(TitleParser));
    let coordinator = Coordinator::new(&config.crawler, Arc::new(fetcher), parsers);

    let token = request.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            token.cancel();
        }
    });

    let info = RunInfo {
        root_url: request.url().to_string(),
        depth: request.depth(),
        config_hash,
    };

    let mut result = coordinator.crawl(request);
    while let Some(event) = result.next().await {
        match event {
            CrawlEvent::Parsed(parsed) => tracing::info!(
                url = %parsed.url(),
                bytes = parsed.resource.body().len(),
                elapsed_ms = parsed.resource.elapsed_ms(),
                links = parsed.links().count(),
                "Parsed"
            ),
            CrawlEvent::Failed(error) => tracing::error!(url = error.url(), "{}", error),
        }
    }
    let summary = result.into_summary().await;

    println!("Execution Time: {:.2?}", summary.duration());
    println!("Fetched: {}", summary.total_parsed());
    println!("Errors: {}", summary.total_errors());

    if !cli.quiet {
        println!();
        print_statistics(&CrawlStatistics::from_summary(&summary));
    }

    if let Some(path) = &cli.summary {
        generate_markdown_summary(&summary, &info, path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!("✓ Summary exported to: {}", path.display());
    }

    Ok(())
}

/// Applies command-line overrides on top of file and environment values
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(timeout_ms) = cli.timeout_ms {
        config.crawler.default_fetch_timeout_ms = timeout_ms;
    }
    if let Some(cooldown_ms) = cli.cooldown_ms {
        config.crawler.default_fetch_cooldown_ms = cooldown_ms;
    }
    if let Some(max_parallel) = cli.max_parallel {
        config.crawler.max_parallel_fetches = max_parallel;
    }
    if let Some(max_resources) = cli.max_resources {
        config.crawler.max_resources = Some(max_resources);
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the verbosity flags. Production runs
/// log JSON lines.
fn setup_logging(verbose: u8, quiet: bool, json: bool) {
    let default_filter = if quiet {
        // Only show errors
        "error"
    } else {
        match verbose {
            0 => "sumi_wake=info,warn",
            1 => "sumi_wake=debug,info",
            2 => "sumi_wake=trace,debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
