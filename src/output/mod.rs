//! Output module for crawl reports
//!
//! This module handles:
//! - Deriving statistics from a crawl summary
//! - Printing those statistics to the terminal
//! - Writing a markdown report of a crawl

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlStatistics};

use crate::crawler::Depth;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Describes the crawl a report is about
#[derive(Debug, Clone)]
pub struct RunInfo {
    /// Normalized root URL
    pub root_url: String,

    /// Requested depth
    pub depth: Depth,

    /// Hash of the configuration file, if one was used
    pub config_hash: Option<String>,
}
