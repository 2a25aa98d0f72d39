//! Sumi-Wake: a bounded same-origin web crawler
//!
//! This crate fetches a starting page and follows same-origin links up to a
//! bounded depth, fetching each URL at most once, with a cap on concurrent
//! fetches, optional dispatch cooldown, cooperative cancellation and an
//! aggregated summary of everything that happened.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for {var}: {message}")]
    Env { var: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Errors produced by a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Per-task failures surfaced on a crawl's error stream
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl { url: String, source: UrlError },

    #[error("fetching {url}: {source}")]
    FetchFailure { url: String, source: FetchError },
}

impl CrawlError {
    /// The URL the failure refers to
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. } | Self::FetchFailure { url, .. } => url,
        }
    }

    /// Returns true if the failure happened while fetching
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailure { .. })
    }
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    Coordinator, CrawlEvent, CrawlRequest, CrawlResult, Depth, Fetcher, Parser, ParserKind,
    Summary,
};
pub use url::{normalize_url, same_origin};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_error_url() {
        let err = CrawlError::FetchFailure {
            url: "https://example.com/x".to_string(),
            source: FetchError::Status(500),
        };
        assert_eq!(err.url(), "https://example.com/x");
        assert!(err.is_fetch_failure());
        assert!(err.to_string().contains("https://example.com/x"));

        let err = CrawlError::InvalidUrl {
            url: "ht!tp://".to_string(),
            source: UrlError::MissingDomain,
        };
        assert!(!err.is_fetch_failure());
    }
}
