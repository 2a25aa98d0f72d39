//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the dispatch loop that drives a crawl:
//! - Seeding the frontier with the root task
//! - Pulling tasks and spawning one unit per task, paced by the cooldown
//! - Fetching under the limiter with a per-task deadline
//! - Running the parsers and scheduling children within the depth budget
//! - Detecting completion and closing the result streams

use crate::config::CrawlerConfig;
use crate::crawler::aggregator::CrawlResult;
use crate::crawler::fetcher::{Deadline, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::limiter::FetchLimiter;
use crate::crawler::model::{Depth, FetchedResource, ParsedResource, Task};
use crate::crawler::parser::{Parser, ParserSet};
use crate::url::normalize_url;
use crate::{CrawlError, FetchError, UrlError};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Maximum number of resources a crawl fetches when no cap is configured
pub const RESOURCE_HARD_CAP: u64 = 100_000;

/// Per-fetch timeout used by [`CrawlRequest::new`]
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// What to crawl and how
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    url: Url,
    depth: Depth,
    timeout: Duration,
    cooldown: Duration,
    token: CancellationToken,
}

impl CrawlRequest {
    /// Creates a request for `url`, following links up to `depth` hops
    ///
    /// A negative depth means unlimited, 0 fetches only the root. The URL is
    /// normalized; the cooldown starts at zero.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_wake::{CrawlRequest, Depth};
    ///
    /// let request = CrawlRequest::new("https://Example.com/docs/", 2).unwrap();
    /// assert_eq!(request.url().as_str(), "https://example.com/docs");
    /// assert_eq!(request.depth(), Depth::Remaining(2));
    /// ```
    pub fn new(url: &str, depth: i64) -> Result<Self, UrlError> {
        Ok(Self {
            url: normalize_url(url)?,
            depth: Depth::from(depth),
            timeout: DEFAULT_FETCH_TIMEOUT,
            cooldown: Duration::ZERO,
            token: CancellationToken::new(),
        })
    }

    /// Creates a request using the configured default timeout and cooldown
    pub fn from_config(url: &str, depth: i64, config: &CrawlerConfig) -> Result<Self, UrlError> {
        Ok(Self::new(url, depth)?
            .with_timeout(config.default_fetch_timeout())
            .with_cooldown(config.default_fetch_cooldown()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Uses `token` to cancel the crawl
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Main crawler coordinator structure
///
/// A coordinator holds the fetcher, the parsers and the fetch limiter. Each
/// call to [`Coordinator::crawl`] starts an independent crawl with its own
/// frontier; crawls started from the same coordinator share the limiter.
pub struct Coordinator {
    fetcher: Arc<dyn Fetcher>,
    parsers: ParserSet,
    limiter: FetchLimiter,
    max_resources: u64,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - Limits for parallel fetches and resources per crawl
    /// * `fetcher` - Performs the actual fetches
    /// * `parsers` - Run over every fetched resource
    pub fn new(config: &CrawlerConfig, fetcher: Arc<dyn Fetcher>, parsers: ParserSet) -> Self {
        Self {
            fetcher,
            parsers,
            limiter: FetchLimiter::new(config.max_parallel_fetches),
            max_resources: config.max_resources.unwrap_or(RESOURCE_HARD_CAP),
        }
    }

    /// Registers another parser for subsequent crawls
    pub fn add_parser(&mut self, parser: Arc<dyn Parser>) {
        self.parsers.add(parser);
    }

    pub fn limiter(&self) -> &FetchLimiter {
        &self.limiter
    }

    /// Starts a crawl and returns a handle to its results
    ///
    /// The crawl runs on spawned tasks, so this must be called from within a
    /// tokio runtime.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use sumi_wake::config::CrawlerConfig;
    /// use sumi_wake::crawler::{HttpFetcher, LinksParser, ParserSet};
    /// use sumi_wake::{Coordinator, CrawlRequest};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let request = CrawlRequest::new("https://example.com/", 2)?;
    /// let parsers = ParserSet::new().with(Arc::new(LinksParser::new(request.url())));
    /// let fetcher = HttpFetcher::from_config(&Default::default())?;
    /// let coordinator = Coordinator::new(&CrawlerConfig::default(), Arc::new(fetcher), parsers);
    ///
    /// let summary = coordinator.crawl(request).into_summary().await;
    /// println!("{} parsed, {} errors", summary.total_parsed(), summary.total_errors());
    /// # Ok(())
    /// # }
    /// ```
    pub fn crawl(&self, request: CrawlRequest) -> CrawlResult {
        let started = Instant::now();
        let started_at = Utc::now();

        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();

        // Cancelling the handle stops this crawl without touching the caller's token
        let token = request.token.child_token();

        let run = Arc::new(CrawlRun {
            frontier: Frontier::new(),
            fetcher: Arc::clone(&self.fetcher),
            parsers: self.parsers.clone(),
            limiter: self.limiter.clone(),
            token: token.clone(),
            outstanding: AtomicUsize::new(0),
            claimed: AtomicU64::new(0),
            max_resources: self.max_resources,
            results: results_tx,
            errors: errors_tx,
        });

        tracing::info!(
            url = %request.url,
            depth = %request.depth,
            timeout = ?request.timeout,
            cooldown = ?request.cooldown,
            "Starting crawl"
        );

        let root = Task::new(
            request.url.to_string(),
            request.depth,
            request.timeout,
            request.cooldown,
        );
        run.enter();
        if !run.frontier.add(root) {
            run.leave();
        }

        tokio::spawn(dispatch(run));

        CrawlResult::new(results_rx, errors_rx, token, started, started_at)
    }
}

/// State shared by the dispatch loop and every unit of one crawl
///
/// The result streams close once every handle to this state is dropped.
struct CrawlRun {
    frontier: Frontier,
    fetcher: Arc<dyn Fetcher>,
    parsers: ParserSet,
    limiter: FetchLimiter,
    token: CancellationToken,

    /// Join counter: admitted tasks whose unit has not finished yet
    outstanding: AtomicUsize,

    /// Resource slots claimed so far
    claimed: AtomicU64,
    max_resources: u64,

    results: UnboundedSender<ParsedResource>,
    errors: UnboundedSender<CrawlError>,
}

impl CrawlRun {
    fn enter(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Closes the frontier when the last outstanding task finishes
    fn leave(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            tracing::debug!("No outstanding work left, closing frontier");
            self.frontier.close();
        }
    }

    /// Claims one resource slot, returns false once the cap is reached
    fn claim_resource_slot(&self) -> bool {
        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |claimed| {
                (claimed < self.max_resources).then_some(claimed + 1)
            })
            .is_ok()
    }

    fn resource_cap_reached(&self) -> bool {
        self.claimed.load(Ordering::Acquire) >= self.max_resources
    }

    fn report(&self, error: CrawlError) {
        tracing::debug!(url = error.url(), "Reporting failure: {}", error);
        // The handle may already be gone; nobody is left to tell
        let _ = self.errors.send(error);
    }

    async fn fetch(&self, task: &Task, url: &Url) -> Result<FetchedResource, FetchError> {
        let permit = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(FetchError::Cancelled),
            permit = self.limiter.acquire() => permit
                .ok_or_else(|| FetchError::Other("fetch limiter closed".to_string()))?,
        };

        let deadline = Deadline::new(&self.token, task.timeout);
        tracing::debug!(url = %url, in_flight = self.limiter.in_flight(), "Fetch started");

        let result = deadline.run(self.fetcher.fetch(&deadline, url)).await;
        permit.release();

        tracing::debug!(url = %url, ok = result.is_ok(), "Fetch finished");
        result
    }

    /// Offers a discovered link to the frontier as a child of `parent`
    fn schedule(&self, parent: &Task, link: &str) {
        let url = match normalize_url(link) {
            Ok(url) => url.to_string(),
            Err(source) => {
                self.report(CrawlError::InvalidUrl {
                    url: link.to_string(),
                    source,
                });
                return;
            }
        };

        let Some(child) = parent.child(url) else {
            return;
        };
        let url = child.url.clone();
        let depth = child.depth;

        // Counted before admission so the child cannot finish before it is counted
        self.enter();
        if self.frontier.add(child) {
            tracing::debug!(url = %url, depth = %depth, parent = %parent.url, "Scheduled");
        } else {
            if self.frontier.exists(&url) {
                tracing::trace!(url = %url, "Skipping already visited URL");
            } else {
                tracing::debug!(url = %url, "Skipping URL, frontier is closed");
            }
            self.leave();
        }
    }
}

/// Releases a unit's join-counter slot on every exit path
struct UnitGuard<'a> {
    run: &'a CrawlRun,
}

impl Drop for UnitGuard<'_> {
    fn drop(&mut self) {
        self.run.leave();
    }
}

/// Hands out tasks until the frontier closes or the crawl is cancelled
async fn dispatch(run: Arc<CrawlRun>) {
    loop {
        let task = tokio::select! {
            biased;
            _ = run.token.cancelled() => {
                tracing::warn!("Crawl cancelled, dispatching no further tasks");
                run.frontier.close();
                break;
            }
            task = run.frontier.next() => match task {
                Some(task) => task,
                None => break,
            },
        };

        let cooldown = task.cooldown;
        tokio::spawn(process_task(Arc::clone(&run), task));

        if !cooldown.is_zero() {
            tracing::trace!(?cooldown, "Cooling down");
            tokio::select! {
                _ = run.token.cancelled() => {}
                _ = tokio::time::sleep(cooldown) => {}
            }
        }
    }

    tracing::debug!(visited = run.frontier.visited_count(), "Dispatch loop finished");
}

/// Fetches, parses and expands one task
async fn process_task(run: Arc<CrawlRun>, task: Task) {
    let _unit = UnitGuard { run: &run };

    if run.token.is_cancelled() {
        tracing::debug!(url = %task.url, "Crawl cancelled, dropping task");
        return;
    }

    let url = match Url::parse(&task.url) {
        Ok(url) => url,
        Err(e) => {
            run.report(CrawlError::InvalidUrl {
                url: task.url.clone(),
                source: UrlError::Parse(e.to_string()),
            });
            return;
        }
    };

    if !run.claim_resource_slot() {
        tracing::debug!(url = %task.url, "Resource cap reached, not fetching");
        return;
    }

    let resource = match run.fetch(&task, &url).await {
        Ok(resource) => resource,
        Err(source) => {
            run.report(CrawlError::FetchFailure {
                url: task.url.clone(),
                source,
            });
            return;
        }
    };

    let parsed = run.parsers.parse(resource);

    if task.depth.child().is_none() {
        tracing::trace!(url = %task.url, "Depth budget exhausted");
    } else {
        for link in parsed.links() {
            if run.token.is_cancelled() || run.resource_cap_reached() {
                tracing::debug!(url = %task.url, "Not scheduling further links");
                break;
            }
            run.schedule(&task, link);
        }
    }

    // The handle may already be gone; nobody is left to tell
    let _ = run.results.send(parsed);
}
