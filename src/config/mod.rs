//! Configuration module for Sumi-Wake
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus the `SUMI_WAKE_*` environment overrides. Every section has
//! defaults, so running without a file is valid.
//!
//! # Example
//!
//! ```no_run
//! use sumi_wake::config::resolve_config;
//! use std::path::Path;
//!
//! let (config, _hash) = resolve_config(Some(Path::new("sumi-wake.toml"))).unwrap();
//! println!("Parallel fetches: {}", config.crawler.max_parallel_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AppConfig, Config, CrawlerConfig, UserAgentConfig, DEVELOPMENT, PRODUCTION};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, load_config, load_config_with_hash, resolve_config,
    ENV_ENVIRONMENT, ENV_FETCH_COOLDOWN_MS, ENV_FETCH_TIMEOUT_MS, ENV_MAX_PARALLEL_FETCHES,
    ENV_MAX_RESOURCES,
};
pub use validation::validate;
