//! Value types shared by the crawl engine
//!
//! A [`Task`] is one URL waiting to be fetched, a [`FetchedResource`] is what
//! a fetcher hands back, and a [`ParsedResource`] pairs that resource with
//! the output of every registered parser.

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successfully fetched resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    url: Url,
    base: Url,
    body: Vec<u8>,
    elapsed_ms: u64,
}

impl FetchedResource {
    pub fn new(url: Url, body: Vec<u8>, elapsed_ms: u64) -> Self {
        Self {
            base: url.clone(),
            url,
            body,
            elapsed_ms,
        }
    }

    /// Sets the location the body was actually served from
    pub fn with_base(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    /// The requested URL, as admitted by the frontier
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Where the document lives after redirects; relative links resolve against it
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Wall-clock time the fetch took, in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

/// Identifies what a parser extracts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParserKind {
    /// Absolute same-origin URLs; the only kind that feeds the frontier
    Links,
    /// The document title
    Title,
    /// Any other extractor, identified by name
    Custom(String),
}

impl ParserKind {
    /// Returns true if results of this kind are scheduled as child tasks
    pub fn is_link_extraction(&self) -> bool {
        matches!(self, Self::Links)
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Links => write!(f, "links"),
            Self::Title => write!(f, "title"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// A single parser's failure to extract from a resource
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} parser failed: {message}")]
pub struct ParseError {
    pub kind: ParserKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParserKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Output of one parser over one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedData {
    pub kind: ParserKind,
    pub items: Vec<String>,
    pub error: Option<ParseError>,
}

impl ParsedData {
    /// Builds a successful extraction result
    pub fn new(kind: ParserKind, items: Vec<String>) -> Self {
        Self {
            kind,
            items,
            error: None,
        }
    }

    /// Builds a failed extraction result carrying no items
    pub fn failed(kind: ParserKind, message: impl Into<String>) -> Self {
        let error = ParseError::new(kind.clone(), message);
        Self {
            kind,
            items: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// A fetched resource together with every parser's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResource {
    pub resource: FetchedResource,
    pub results: Vec<ParsedData>,
}

impl ParsedResource {
    pub fn url(&self) -> &Url {
        self.resource.url()
    }

    /// Iterates over every item produced by link-extraction parsers
    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|data| data.kind.is_link_extraction())
            .flat_map(|data| data.items.iter().map(String::as_str))
    }

    /// Returns the output of the first parser of the given kind
    pub fn result(&self, kind: &ParserKind) -> Option<&ParsedData> {
        self.results.iter().find(|data| &data.kind == kind)
    }
}

/// Remaining link-hop budget of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Follow links without a hop limit
    Unlimited,
    /// Follow at most this many further hops
    Remaining(u64),
}

impl Depth {
    /// Budget handed to children of a task with this budget
    ///
    /// Returns None when no children may be scheduled.
    pub fn child(self) -> Option<Depth> {
        match self {
            Self::Unlimited => Some(Self::Unlimited),
            Self::Remaining(0) => None,
            Self::Remaining(n) => Some(Self::Remaining(n - 1)),
        }
    }
}

impl From<i64> for Depth {
    /// Negative values mean unlimited
    fn from(depth: i64) -> Self {
        if depth < 0 {
            Self::Unlimited
        } else {
            Self::Remaining(depth as u64)
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Remaining(n) => write!(f, "{}", n),
        }
    }
}

/// One URL scheduled for fetch, parse and expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Normalized absolute URL, also the frontier's dedup key
    pub url: String,
    pub depth: Depth,
    pub timeout: Duration,
    pub cooldown: Duration,
}

impl Task {
    pub fn new(url: impl Into<String>, depth: Depth, timeout: Duration, cooldown: Duration) -> Self {
        Self {
            url: url.into(),
            depth,
            timeout,
            cooldown,
        }
    }

    /// Builds a task for a link discovered by this one, if the budget allows
    pub fn child(&self, url: impl Into<String>) -> Option<Task> {
        let depth = self.depth.child()?;
        Some(Task {
            url: url.into(),
            depth,
            timeout: self.timeout,
            cooldown: self.cooldown,
        })
    }
}
