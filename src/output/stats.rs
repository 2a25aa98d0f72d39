//! Statistics derived from a crawl summary
//!
//! This module provides functionality for extracting and displaying
//! statistics about a finished crawl.

use crate::crawler::{ParserKind, Summary};
use std::collections::BTreeMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Number of resources fetched and parsed
    pub resources_parsed: u64,

    /// Number of reported failures
    pub total_errors: u64,

    /// Failures while fetching (network, timeout, HTTP status)
    pub fetch_failures: u64,

    /// Failures caused by malformed URLs
    pub invalid_urls: u64,

    /// Individual parser failures recorded on parsed resources
    pub parse_failures: u64,

    /// Sum of all fetched body sizes
    pub total_bytes: u64,

    /// Mean fetch time over all parsed resources
    pub mean_response_ms: Option<f64>,

    /// Slowest fetch and the URL it belonged to
    pub slowest: Option<(String, u64)>,

    /// Items extracted per parser kind
    pub items_by_kind: BTreeMap<ParserKind, u64>,

    /// Wall-clock duration of the crawl
    pub duration: Duration,
}

impl CrawlStatistics {
    /// Computes statistics from a sealed summary
    pub fn from_summary(summary: &Summary) -> Self {
        let mut stats = Self {
            resources_parsed: summary.total_parsed() as u64,
            total_errors: summary.total_errors() as u64,
            total_bytes: summary.total_bytes(),
            duration: summary.duration(),
            ..Default::default()
        };

        for error in summary.errors() {
            if error.is_fetch_failure() {
                stats.fetch_failures += 1;
            } else {
                stats.invalid_urls += 1;
            }
        }

        let mut total_ms = 0u64;
        for parsed in summary.results() {
            let elapsed = parsed.resource.elapsed_ms();
            total_ms = total_ms.saturating_add(elapsed);

            let is_slower = stats
                .slowest
                .as_ref()
                .map_or(true, |(_, slowest)| elapsed > *slowest);
            if is_slower {
                stats.slowest = Some((parsed.url().to_string(), elapsed));
            }

            for data in &parsed.results {
                if data.is_failure() {
                    stats.parse_failures += 1;
                }
                *stats.items_by_kind.entry(data.kind.clone()).or_insert(0) +=
                    data.items.len() as u64;
            }
        }

        if stats.resources_parsed > 0 {
            stats.mean_response_ms = Some(total_ms as f64 / stats.resources_parsed as f64);
        }

        stats
    }

    /// Share of tasks that ended in a parsed resource, in percent
    pub fn success_rate(&self) -> f64 {
        let total = self.resources_parsed + self.total_errors;
        if total == 0 {
            0.0
        } else {
            (self.resources_parsed as f64 / total as f64) * 100.0
        }
    }

    /// Share of tasks that ended in an error, in percent
    pub fn error_rate(&self) -> f64 {
        let total = self.resources_parsed + self.total_errors;
        if total == 0 {
            0.0
        } else {
            (self.total_errors as f64 / total as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Resources parsed: {}", stats.resources_parsed);
    println!("  Bytes fetched: {}", stats.total_bytes);
    println!("  Duration: {:.2?}", stats.duration);
    println!();

    println!("Response Times:");
    match stats.mean_response_ms {
        Some(mean) => println!("  Mean: {:.1} ms", mean),
        None => println!("  Mean: n/a"),
    }
    if let Some((url, ms)) = &stats.slowest {
        println!("  Slowest: {} ms ({})", ms, url);
    }
    println!();

    if !stats.items_by_kind.is_empty() {
        println!("Items Extracted:");
        for (kind, count) in &stats.items_by_kind {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if stats.total_errors > 0 || stats.parse_failures > 0 {
        println!("Error Summary:");
        println!("  Fetch failures: {}", stats.fetch_failures);
        println!("  Invalid URLs: {}", stats.invalid_urls);
        println!("  Parse failures: {}", stats.parse_failures);
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} tasks)",
        stats.success_rate(),
        stats.resources_parsed,
        stats.resources_parsed + stats.total_errors
    );
}
