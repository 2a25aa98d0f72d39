//! Crawler module: the traversal and concurrency engine
//!
//! This module contains the core crawling logic, including:
//! - The resource and task model
//! - The frontier deduplicating URLs and queueing tasks
//! - The fetch limiter bounding concurrent fetches
//! - HTTP fetching and the parsers run over each resource
//! - Crawl coordination and result aggregation

mod aggregator;
mod coordinator;
mod fetcher;
mod frontier;
mod limiter;
mod model;
mod parser;

pub use aggregator::{CrawlEvent, CrawlResult, Summary};
pub use coordinator::{Coordinator, CrawlRequest, DEFAULT_FETCH_TIMEOUT, RESOURCE_HARD_CAP};
pub use fetcher::{build_http_client, Deadline, Fetcher, HttpFetcher};
pub use frontier::Frontier;
pub use limiter::{FetchLimiter, FetchPermit};
pub use model::{
    Depth, FetchedResource, ParseError, ParsedData, ParsedResource, ParserKind, Task,
};
pub use parser::{LinksParser, Parser, ParserSet, TitleParser};
