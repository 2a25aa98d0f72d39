//! Fetching resources over HTTP
//!
//! This module defines the [`Fetcher`] contract the crawl engine calls into,
//! the [`Deadline`] every fetch runs under, and [`HttpFetcher`], the
//! reqwest-backed implementation used by the binary.

use crate::config::UserAgentConfig;
use crate::crawler::model::FetchedResource;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Maximum number of redirects followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Cancellable time budget for a single fetch
///
/// A deadline combines the crawl's cancellation token with a per-task
/// timeout. It is cancelled when the crawl is cancelled; cancelling the
/// deadline itself does not affect the crawl.
#[derive(Debug, Clone)]
pub struct Deadline {
    token: CancellationToken,
    expires_at: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Starts a deadline of `timeout` from now, tied to `parent`
    pub fn new(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            token: parent.child_token(),
            expires_at: Instant::now() + timeout,
            timeout,
        }
    }

    /// The full budget this deadline was created with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs `fut` to completion unless the deadline is cancelled or expires
    /// first
    pub async fn run<F, T>(&self, fut: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(FetchError::Cancelled),
            _ = tokio::time::sleep_until(self.expires_at) => Err(FetchError::Timeout(self.timeout)),
            result = fut => result,
        }
    }
}

/// Performs one timed GET of a resource
///
/// Implementations must return promptly once the deadline is cancelled or
/// expired.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, deadline: &Deadline, url: &Url) -> Result<FetchedResource, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_wake::config::UserAgentConfig;
/// use sumi_wake::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiWake".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Per-request timeouts come from the deadline, not from the client
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher whose client identifies itself with `config`
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }

    async fn get(&self, deadline: &Deadline, url: &Url) -> Result<FetchedResource, FetchError> {
        let started = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .timeout(deadline.remaining())
            .send()
            .await
            .map_err(|e| classify_error(e, deadline))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let base = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(e, deadline))?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(FetchedResource::new(url.clone(), body.to_vec(), elapsed_ms).with_base(base))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, deadline: &Deadline, url: &Url) -> Result<FetchedResource, FetchError> {
        tracing::debug!(url = %url, timeout = ?deadline.timeout(), "Fetching");
        deadline.run(self.get(deadline, url)).await
    }
}

fn classify_error(error: reqwest::Error, deadline: &Deadline) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(deadline.timeout())
    } else {
        FetchError::Transport(error)
    }
}
