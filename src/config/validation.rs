use crate::config::types::{AppConfig, Config, CrawlerConfig, UserAgentConfig, DEVELOPMENT, PRODUCTION};
use crate::ConfigError;
use url::Url;

/// Upper bound for `max-parallel-fetches`
const MAX_PARALLEL_FETCHES_LIMIT: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_app_config(&config.app)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

fn validate_app_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.environment != PRODUCTION && config.environment != DEVELOPMENT {
        return Err(ConfigError::Validation(format!(
            "Unknown environment \"{}\" (expected \"{}\" or \"{}\")",
            config.environment, DEVELOPMENT, PRODUCTION
        )));
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // 0 is accepted and means fully serial fetching
    if config.max_parallel_fetches > MAX_PARALLEL_FETCHES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_parallel_fetches must be at most {}, got {}",
            MAX_PARALLEL_FETCHES_LIMIT, config.max_parallel_fetches
        )));
    }

    if config.default_fetch_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "default_fetch_timeout_ms must be >= 1ms, got {}ms",
            config.default_fetch_timeout_ms
        )));
    }

    if config.max_resources == Some(0) {
        return Err(ConfigError::Validation(
            "max_resources must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if !config.contact_url.is_empty() {
        Url::parse(&config.contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if !config.contact_email.is_empty() {
        validate_email(&config.contact_email)?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    // Must contain exactly one @ with text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
