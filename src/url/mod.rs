//! URL handling module for Sumi-Wake
//!
//! This module provides URL normalization (the key under which the frontier
//! deduplicates URLs) and origin comparison (what keeps a crawl on the site
//! it started from).

mod normalize;
mod origin;

// Re-export main functions
pub use normalize::normalize_url;
pub use origin::same_origin;
