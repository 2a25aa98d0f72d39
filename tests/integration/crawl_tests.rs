//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end over real HTTP.

use std::sync::Arc;
use std::time::Duration;
use sumi_wake::config::{CrawlerConfig, UserAgentConfig};
use sumi_wake::crawler::{HttpFetcher, LinksParser, ParserKind, ParserSet, TitleParser};
use sumi_wake::output::{generate_markdown_summary, RunInfo};
use sumi_wake::{Coordinator, CrawlError, CrawlRequest, FetchError, Summary};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds an HTML page with a title and the given hrefs
fn html_page(title: &str, links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();

    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, anchors
        ))
        .insert_header("content-type", "text/html")
}

fn links(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

async fn mount_page(server: &MockServer, page: &str, title: &str, hrefs: &[&str], expected: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_page(title, &links(hrefs)))
        .expect(expected)
        .mount(server)
        .await;
}

fn create_test_config() -> CrawlerConfig {
    CrawlerConfig {
        max_parallel_fetches: 4,
        default_fetch_timeout_ms: 2000,
        default_fetch_cooldown_ms: 0,
        max_resources: None,
    }
}

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

async fn crawl(server: &MockServer, depth: i64, config: &CrawlerConfig) -> Summary {
    crawl_from(server, "/", depth, config).await
}

async fn crawl_from(
    server: &MockServer,
    start: &str,
    depth: i64,
    config: &CrawlerConfig,
) -> Summary {
    let request = CrawlRequest::from_config(&format!("{}{}", server.uri(), start), depth, config)
        .expect("Failed to build request");

    let parsers = ParserSet::new()
        .with(Arc::new(LinksParser::new(request.url())))
        .with(Arc::new(TitleParser));
    let fetcher = HttpFetcher::from_config(&user_agent()).expect("Failed to build fetcher");
    let coordinator = Coordinator::new(config, Arc::new(fetcher), parsers);

    tokio::time::timeout(Duration::from_secs(10), coordinator.crawl(request).into_summary())
        .await
        .expect("Crawl did not complete")
}

fn titles(summary: &Summary) -> Vec<String> {
    let mut titles: Vec<String> = summary
        .results()
        .iter()
        .filter_map(|parsed| parsed.result(&ParserKind::Title))
        .flat_map(|data| data.items.clone())
        .collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn test_full_crawl_single_origin() {
    let server = MockServer::start().await;
    let page1 = format!("{}/page1", server.uri());

    mount_page(&server, "/", "Home", &[&page1, "/page2", "page2#section"], 1).await;
    mount_page(&server, "/page1", "Page 1", &["/"], 1).await;
    mount_page(&server, "/page2", "Page 2", &["/page1"], 1).await;

    let summary = crawl(&server, -1, &create_test_config()).await;

    assert_eq!(summary.total_parsed(), 3);
    assert_eq!(summary.total_errors(), 0);
    assert_eq!(titles(&summary), vec!["Home", "Page 1", "Page 2"]);
    assert!(summary.total_bytes() > 0);
}

#[tokio::test]
async fn test_depth_limit_is_respected() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Root", &["/level1"], 1).await;
    mount_page(&server, "/level1", "Level 1", &["/level2"], 1).await;
    mount_page(&server, "/level2", "Level 2", &[], 0).await;

    let summary = crawl(&server, 1, &create_test_config()).await;

    assert_eq!(summary.total_parsed(), 2);
    assert_eq!(titles(&summary), vec!["Level 1", "Root"]);
}

#[tokio::test]
async fn test_depth_zero_fetches_only_root() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Root", &["/child"], 1).await;
    mount_page(&server, "/child", "Child", &[], 0).await;

    let summary = crawl(&server, 0, &create_test_config()).await;

    assert_eq!(summary.total_parsed(), 1);
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Root", &["/a", "/b", "/b/"], 1).await;
    mount_page(&server, "/a", "A", &["/b", "/", "/a?utm_source=feed"], 1).await;
    mount_page(&server, "/b", "B", &["/a", "/"], 1).await;

    let summary = crawl(&server, -1, &create_test_config()).await;

    assert_eq!(summary.total_parsed(), 3);
    // `expect(1)` on every mock is verified when the server drops
}

#[tokio::test]
async fn test_relative_links_on_directory_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/blog/"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/blog/", "Blog", &["post"], 1).await;
    mount_page(&server, "/blog/post", "Post", &[], 1).await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let summary = crawl_from(&server, "/blog/", 1, &create_test_config()).await;

    assert_eq!(summary.total_errors(), 0);
    assert_eq!(titles(&summary), vec!["Blog", "Post"]);

    let root = summary
        .results()
        .iter()
        .find(|parsed| parsed.url().path() == "/blog")
        .expect("root page missing");
    let links: Vec<&str> = root.links().collect();
    assert_eq!(links, vec![format!("{}/blog/post", server.uri())]);
}

#[tokio::test]
async fn test_not_found_is_reported() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Root", &["/missing", "/ok"], 1).await;
    mount_page(&server, "/ok", "Ok", &[], 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let summary = crawl(&server, -1, &create_test_config()).await;

    assert_eq!(summary.total_parsed(), 2);
    assert_eq!(summary.total_errors(), 1);

    let error = &summary.errors()[0];
    assert_eq!(error.url(), format!("{}/missing", server.uri()));
    assert!(matches!(
        error,
        CrawlError::FetchFailure {
            source: FetchError::Status(404),
            ..
        }
    ));
}

#[tokio::test]
async fn test_other_origins_are_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    let elsewhere = format!("{}/elsewhere", other.uri());

    mount_page(&server, "/", "Root", &[&elsewhere, "https://example.invalid/x"], 1).await;
    mount_page(&other, "/elsewhere", "Elsewhere", &[], 0).await;

    let summary = crawl(&server, -1, &create_test_config()).await;

    assert_eq!(summary.total_parsed(), 1);
    assert_eq!(summary.total_errors(), 0);
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Root", &["/slow"], 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("Slow", &[]).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        default_fetch_timeout_ms: 200,
        ..create_test_config()
    };
    let summary = crawl(&server, -1, &config).await;

    assert_eq!(summary.total_parsed(), 1);
    assert!(matches!(
        &summary.errors()[0],
        CrawlError::FetchFailure {
            source: FetchError::Timeout(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_resource_cap_limits_fetches() {
    let server = MockServer::start().await;

    let children: Vec<String> = (0..10).map(|i| format!("/item{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();
    mount_page(&server, "/", "Root", &child_refs, 1).await;
    Mock::given(method("GET"))
        .respond_with(html_page("Item", &[]))
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        max_resources: Some(4),
        ..create_test_config()
    };
    let summary = crawl(&server, -1, &config).await;

    assert_eq!(summary.total_parsed(), 4);
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_markdown_summary_of_real_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Root", &["/gone"], 1).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let summary = crawl(&server, 2, &create_test_config()).await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("summary.md");
    let info = RunInfo {
        root_url: format!("{}/", server.uri()),
        depth: sumi_wake::Depth::from(2),
        config_hash: None,
    };
    generate_markdown_summary(&summary, &info, &output).unwrap();

    let markdown = std::fs::read_to_string(&output).unwrap();
    assert!(markdown.contains("- **Resources Parsed**: 1"));
    assert!(markdown.contains(&format!("| {}/gone |", server.uri())));
    assert!(markdown.contains("unexpected HTTP status 410"));
}
