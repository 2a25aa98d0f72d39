//! Collects a crawl's results and errors into a [`Summary`]

use crate::crawler::model::ParsedResource;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

/// Final outcome of a crawl
#[derive(Debug, Default)]
pub struct Summary {
    results: Vec<ParsedResource>,
    errors: Vec<CrawlError>,
    duration: Duration,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl Summary {
    pub(crate) fn new(
        results: Vec<ParsedResource>,
        errors: Vec<CrawlError>,
        duration: Duration,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            results,
            errors,
            duration,
            started_at,
            finished_at,
        }
    }

    /// Every parsed resource, in arrival order
    pub fn results(&self) -> &[ParsedResource] {
        &self.results
    }

    /// Every reported failure, in arrival order
    pub fn errors(&self) -> &[CrawlError] {
        &self.errors
    }

    /// Time from crawl start until both streams closed
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn total_parsed(&self) -> usize {
        self.results.len()
    }

    pub fn total_errors(&self) -> usize {
        self.errors.len()
    }

    /// Sum of all fetched body sizes
    pub fn total_bytes(&self) -> u64 {
        self.results
            .iter()
            .map(|parsed| parsed.resource.body().len() as u64)
            .sum()
    }
}

/// One item observed on a running crawl
#[derive(Debug, Clone, Copy)]
pub enum CrawlEvent<'a> {
    Parsed(&'a ParsedResource),
    Failed(&'a CrawlError),
}

enum Received {
    Parsed(ParsedResource),
    Failed(CrawlError),
}

/// Handle to a running crawl
///
/// Events can be observed live with [`CrawlResult::next`]; [`CrawlResult::seal`]
/// waits for the crawl to finish and returns the [`Summary`]. Every event is
/// recorded whether or not it was observed through `next`.
///
/// Dropping the handle cancels the crawl.
pub struct CrawlResult {
    results_rx: UnboundedReceiver<ParsedResource>,
    errors_rx: UnboundedReceiver<CrawlError>,
    results_open: bool,
    errors_open: bool,

    results: Vec<ParsedResource>,
    errors: Vec<CrawlError>,

    token: CancellationToken,
    started: Instant,
    started_at: DateTime<Utc>,
    finished: Option<(Instant, DateTime<Utc>)>,

    summary: Option<Summary>,
}

impl CrawlResult {
    pub(crate) fn new(
        results_rx: UnboundedReceiver<ParsedResource>,
        errors_rx: UnboundedReceiver<CrawlError>,
        token: CancellationToken,
        started: Instant,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            results_rx,
            errors_rx,
            results_open: true,
            errors_open: true,
            results: Vec::new(),
            errors: Vec::new(),
            token,
            started,
            started_at,
            finished: None,
            summary: None,
        }
    }

    /// Requests cancellation of the crawl
    ///
    /// Already running fetches are cut off; the summary still completes.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_sealed(&self) -> bool {
        self.summary.is_some()
    }

    /// Waits for the next result or error
    ///
    /// Returns None once both streams are closed or the summary was sealed.
    pub async fn next(&mut self) -> Option<CrawlEvent<'_>> {
        if self.summary.is_some() {
            return None;
        }

        match self.receive().await? {
            Received::Parsed(parsed) => {
                self.results.push(parsed);
                self.results.last().map(CrawlEvent::Parsed)
            }
            Received::Failed(error) => {
                self.errors.push(error);
                self.errors.last().map(CrawlEvent::Failed)
            }
        }
    }

    /// Drains both streams and returns the summary
    ///
    /// Repeated calls return the same summary without waiting again.
    pub async fn seal(&mut self) -> &Summary {
        if self.summary.is_none() {
            while let Some(received) = self.receive().await {
                match received {
                    Received::Parsed(parsed) => self.results.push(parsed),
                    Received::Failed(error) => self.errors.push(error),
                }
            }

            let (finished, finished_at) = self
                .finished
                .unwrap_or_else(|| (Instant::now(), Utc::now()));
            let summary = Summary::new(
                std::mem::take(&mut self.results),
                std::mem::take(&mut self.errors),
                finished.saturating_duration_since(self.started),
                self.started_at,
                finished_at,
            );

            tracing::info!(
                parsed = summary.total_parsed(),
                errors = summary.total_errors(),
                duration = ?summary.duration,
                "Crawl finished"
            );
            self.summary = Some(summary);
        }

        self.summary.get_or_insert_with(Summary::default)
    }

    /// Seals the crawl and takes ownership of the summary
    pub async fn into_summary(mut self) -> Summary {
        self.seal().await;
        self.summary.take().unwrap_or_default()
    }

    async fn receive(&mut self) -> Option<Received> {
        loop {
            tokio::select! {
                result = self.results_rx.recv(), if self.results_open => match result {
                    Some(parsed) => return Some(Received::Parsed(parsed)),
                    None => self.results_open = false,
                },
                error = self.errors_rx.recv(), if self.errors_open => match error {
                    Some(error) => return Some(Received::Failed(error)),
                    None => self.errors_open = false,
                },
                else => {
                    if self.finished.is_none() {
                        self.finished = Some((Instant::now(), Utc::now()));
                    }
                    return None;
                }
            }
        }
    }
}

impl Drop for CrawlResult {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
