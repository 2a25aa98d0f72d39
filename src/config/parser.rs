use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding `[app].environment`
pub const ENV_ENVIRONMENT: &str = "SUMI_WAKE_ENV";
/// Environment variable overriding `[crawler].max-parallel-fetches`
pub const ENV_MAX_PARALLEL_FETCHES: &str = "SUMI_WAKE_MAX_PARALLEL_FETCHES";
/// Environment variable overriding `[crawler].default-fetch-timeout-ms`
pub const ENV_FETCH_TIMEOUT_MS: &str = "SUMI_WAKE_FETCH_TIMEOUT_MS";
/// Environment variable overriding `[crawler].default-fetch-cooldown-ms`
pub const ENV_FETCH_COOLDOWN_MS: &str = "SUMI_WAKE_FETCH_COOLDOWN_MS";
/// Environment variable overriding `[crawler].max-resources`
pub const ENV_MAX_RESOURCES: &str = "SUMI_WAKE_MAX_RESOURCES";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_wake::config::load_config;
///
/// let config = load_config(Path::new("sumi-wake.toml")).unwrap();
/// println!("Parallel fetches: {}", config.crawler.max_parallel_fetches);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Resolves the effective configuration for a run
///
/// Starts from the file at `path` (or the built-in defaults when no file is
/// given), applies the `SUMI_WAKE_*` environment overrides and validates the
/// result. The file hash is returned alongside when a file was read.
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => (read_config(path)?, Some(compute_config_hash(path)?)),
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;

    Ok((config, hash))
}

/// Applies environment overrides using the given variable lookup
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(environment) = lookup(ENV_ENVIRONMENT) {
        config.app.environment = environment.trim().to_lowercase();
    }
    if let Some(value) = parse_var(&lookup, ENV_MAX_PARALLEL_FETCHES)? {
        config.crawler.max_parallel_fetches = value;
    }
    if let Some(value) = parse_var(&lookup, ENV_FETCH_TIMEOUT_MS)? {
        config.crawler.default_fetch_timeout_ms = value;
    }
    if let Some(value) = parse_var(&lookup, ENV_FETCH_COOLDOWN_MS)? {
        config.crawler.default_fetch_cooldown_ms = value;
    }
    if let Some(value) = parse_var(&lookup, ENV_MAX_RESOURCES)? {
        config.crawler.max_resources = Some(value);
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| ConfigError::Env {
            var: name.to_string(),
            message: format!("'{}': {}", raw, e),
        }),
    }
}
