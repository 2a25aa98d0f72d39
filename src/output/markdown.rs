//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, extracted items and error reports.

use crate::crawler::Summary;
use crate::output::stats::CrawlStatistics;
use crate::output::{OutputResult, RunInfo};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Maximum number of errors listed individually
const MAX_LISTED_ERRORS: usize = 50;

/// Generates a markdown summary of a finished crawl
///
/// # Arguments
///
/// * `summary` - The sealed crawl summary
/// * `info` - What was crawled
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    summary: &Summary,
    info: &RunInfo,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary, info);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &Summary, info: &RunInfo) -> String {
    let stats = CrawlStatistics::from_summary(summary);
    let mut md = String::new();

    // Title
    md.push_str("# Sumi-Wake Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Root URL**: {}\n", info.root_url));
    md.push_str(&format!("- **Depth**: {}\n", info.depth));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at().to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at().to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.3} seconds\n",
        summary.duration().as_secs_f64()
    ));
    if let Some(hash) = &info.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Resources Parsed**: {}\n",
        stats.resources_parsed
    ));
    md.push_str(&format!("- **Bytes Fetched**: {}\n", stats.total_bytes));
    md.push_str(&format!("- **Total Errors**: {}\n", stats.total_errors));
    md.push_str(&format!("- **Parse Failures**: {}\n", stats.parse_failures));
    if let Some(mean) = stats.mean_response_ms {
        md.push_str(&format!("- **Mean Response Time**: {:.1} ms\n", mean));
    }
    if let Some((url, ms)) = &stats.slowest {
        md.push_str(&format!("- **Slowest Response**: {} ms ({})\n", ms, url));
    }
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        stats.success_rate()
    ));
    md.push_str(&format!("- **Error Rate**: {:.2}%\n\n", stats.error_rate()));

    // Items per parser
    if !stats.items_by_kind.is_empty() {
        md.push_str("## Extracted Items\n\n");
        md.push_str("| Parser | Items |\n");
        md.push_str("|--------|-------|\n");
        for (kind, count) in &stats.items_by_kind {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    // Error list
    if !summary.errors().is_empty() {
        md.push_str("## Errors\n\n");
        md.push_str(&format!(
            "Fetch failures: {}, invalid URLs: {}\n\n",
            stats.fetch_failures, stats.invalid_urls
        ));
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");

        for error in summary.errors().iter().take(MAX_LISTED_ERRORS) {
            md.push_str(&format!("| {} | {} |\n", error.url(), error));
        }
        if summary.errors().len() > MAX_LISTED_ERRORS {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.errors().len() - MAX_LISTED_ERRORS
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{Depth, FetchedResource, ParsedData, ParsedResource, ParserKind};
    use crate::{CrawlError, FetchError};
    use chrono::Utc;
    use std::time::Duration;
    use url::Url;

    fn run_info() -> RunInfo {
        RunInfo {
            root_url: "https://example.com/".to_string(),
            depth: Depth::Remaining(2),
            config_hash: Some("abc123".to_string()),
        }
    }

    fn create_test_summary(error_count: usize) -> Summary {
        let url = Url::parse("https://example.com/").unwrap();
        let results = vec![ParsedResource {
            resource: FetchedResource::new(url, b"<html></html>".to_vec(), 42),
            results: vec![ParsedData::new(
                ParserKind::Links,
                vec!["https://example.com/a".to_string()],
            )],
        }];
        let errors = (0..error_count)
            .map(|i| CrawlError::FetchFailure {
                url: format!("https://example.com/missing-{}", i),
                source: FetchError::Status(404),
            })
            .collect();

        Summary::new(results, errors, Duration::from_secs(2), Utc::now(), Utc::now())
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_summary(0), &run_info());

        assert!(markdown.contains("# Sumi-Wake Crawl Summary"));
        assert!(markdown.contains("- **Root URL**: https://example.com/"));
        assert!(markdown.contains("- **Depth**: 2"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("- **Resources Parsed**: 1"));
        assert!(markdown.contains("| links | 1 |"));
        assert!(!markdown.contains("## Errors"));
    }

    #[test]
    fn test_markdown_lists_errors() {
        let markdown = format_markdown_summary(&create_test_summary(2), &run_info());

        assert!(markdown.contains("## Errors"));
        assert!(markdown.contains("| https://example.com/missing-0 |"));
        assert!(markdown.contains("| https://example.com/missing-1 |"));
        assert!(!markdown.contains("more"));
    }

    #[test]
    fn test_markdown_caps_error_list() {
        let markdown = format_markdown_summary(&create_test_summary(60), &run_info());

        assert!(markdown.contains("missing-49 |"));
        assert!(!markdown.contains("missing-50 |"));
        assert!(markdown.contains("... and 10 more"));
    }

    #[test]
    fn test_generate_markdown_summary_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&create_test_summary(1), &run_info(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Sumi-Wake Crawl Summary"));
    }
}
