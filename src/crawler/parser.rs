//! Extractors applied to every fetched resource
//!
//! This module defines the [`Parser`] contract and the two parsers the
//! binary registers:
//! - [`LinksParser`] finds same-origin links to follow
//! - [`TitleParser`] extracts the page title

use crate::crawler::model::{FetchedResource, ParsedData, ParsedResource, ParserKind};
use crate::url::{normalize_url, same_origin};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Extracts data from a fetched resource
///
/// A failure is reported on the returned [`ParsedData`] rather than as an
/// error, so the other parsers registered for the same resource still run.
pub trait Parser: Send + Sync {
    fn kind(&self) -> ParserKind;

    fn parse(&self, resource: &FetchedResource) -> ParsedData;
}

/// Ordered registry of parsers
#[derive(Clone, Default)]
pub struct ParserSet {
    parsers: Vec<Arc<dyn Parser>>,
}

impl ParserSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parser; parsers run in registration order
    pub fn add(&mut self, parser: Arc<dyn Parser>) {
        self.parsers.push(parser);
    }

    /// Builder-style variant of [`ParserSet::add`]
    pub fn with(mut self, parser: Arc<dyn Parser>) -> Self {
        self.add(parser);
        self
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    pub fn kinds(&self) -> Vec<ParserKind> {
        self.parsers.iter().map(|parser| parser.kind()).collect()
    }

    /// Runs every registered parser over `resource`
    pub fn parse(&self, resource: FetchedResource) -> ParsedResource {
        let results = self
            .parsers
            .iter()
            .map(|parser| parser.parse(&resource))
            .collect();

        ParsedResource { resource, results }
    }
}

/// Extracts same-origin links to follow
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - Links to any other origin than the crawl root's
///
/// Links are normalized and reported once per page, in document order.
/// `rel="nofollow"` links are followed.
#[derive(Debug, Clone)]
pub struct LinksParser {
    origin: Url,
}

impl LinksParser {
    /// Creates a parser keeping links on the same origin as `root`
    pub fn new(root: &Url) -> Self {
        Self {
            origin: root.clone(),
        }
    }
}

impl Parser for LinksParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Links
    }

    fn parse(&self, resource: &FetchedResource) -> ParsedData {
        let html = match std::str::from_utf8(resource.body()) {
            Ok(html) => html,
            Err(e) => return ParsedData::failed(self.kind(), format!("body is not UTF-8: {}", e)),
        };

        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for href in extract_hrefs(&document) {
            let Some(absolute) = resolve_link(href, resource.base()) else {
                continue;
            };
            if !same_origin(&self.origin, &absolute) {
                continue;
            }
            let normalized = match normalize_url(absolute.as_str()) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    tracing::debug!("Failed to normalize URL {}: {}", absolute, e);
                    continue;
                }
            };
            if seen.insert(normalized.clone()) {
                links.push(normalized);
            }
        }

        ParsedData::new(self.kind(), links)
    }
}

/// Extracts the trimmed `<title>` text
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleParser;

impl Parser for TitleParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Title
    }

    fn parse(&self, resource: &FetchedResource) -> ParsedData {
        let html = String::from_utf8_lossy(resource.body());
        let document = Html::parse_document(&html);

        let title = Selector::parse("title").ok().and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty())
        });

        ParsedData::new(self.kind(), title.into_iter().collect())
    }
}

/// Collects raw hrefs from anchors and canonical links, in document order
fn extract_hrefs(document: &Html) -> Vec<&str> {
    let mut hrefs = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href);
            }
        }
    }

    hrefs
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None for empty or fragment-only hrefs, `javascript:`, `mailto:`,
/// `tel:` and `data:` links, and anything that does not resolve.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}
