use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Wake
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

impl Config {
    /// Returns true when running with the production environment
    pub fn is_production(&self) -> bool {
        self.app.environment == PRODUCTION
    }
}

pub const PRODUCTION: &str = "production";
pub const DEVELOPMENT: &str = "development";

/// Application environment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Either "development" or "production"
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once (0 behaves as 1)
    #[serde(rename = "max-parallel-fetches", default = "default_max_parallel_fetches")]
    pub max_parallel_fetches: usize,

    /// Per-fetch timeout used when a request does not set one (milliseconds)
    #[serde(rename = "default-fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub default_fetch_timeout_ms: u64,

    /// Pause between two dispatches used when a request does not set one (milliseconds)
    #[serde(rename = "default-fetch-cooldown-ms", default)]
    pub default_fetch_cooldown_ms: u64,

    /// Maximum number of resources fetched by a single crawl
    #[serde(rename = "max-resources", default)]
    pub max_resources: Option<u64>,
}

impl CrawlerConfig {
    pub fn default_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.default_fetch_timeout_ms)
    }

    pub fn default_fetch_cooldown(&self) -> Duration {
        Duration::from_millis(self.default_fetch_cooldown_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_parallel_fetches: default_max_parallel_fetches(),
            default_fetch_timeout_ms: default_fetch_timeout_ms(),
            default_fetch_cooldown_ms: 0,
            max_resources: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesised part dropped when no contact details are configured.
    pub fn header_value(&self) -> String {
        let contacts: Vec<String> = [
            (!self.contact_url.is_empty()).then(|| format!("+{}", self.contact_url)),
            (!self.contact_email.is_empty()).then(|| self.contact_email.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contacts.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contacts.join("; ")
            )
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: String::new(),
            contact_email: String::new(),
        }
    }
}

fn default_environment() -> String {
    DEVELOPMENT.to_string()
}

fn default_max_parallel_fetches() -> usize {
    1
}

fn default_fetch_timeout_ms() -> u64 {
    3_000
}

fn default_crawler_name() -> String {
    "SumiWake".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.crawler.max_parallel_fetches, 1);
        assert_eq!(config.crawler.default_fetch_timeout(), Duration::from_secs(3));
        assert_eq!(config.crawler.default_fetch_cooldown(), Duration::ZERO);
        assert!(config.crawler.max_resources.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_user_agent_header() {
        let mut ua = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        };
        assert_eq!(
            ua.header_value(),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );

        ua.contact_url.clear();
        assert_eq!(ua.header_value(), "TestCrawler/1.0 (admin@example.com)");

        ua.contact_email.clear();
        assert_eq!(ua.header_value(), "TestCrawler/1.0");
    }
}
