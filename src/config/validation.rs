use crate::config::types::{AgentConfig, CacheConfig, Config, FetcherConfig, MAX_TTL_SECS};
use crate::ConfigError;
use robotstxt::DefaultMatcher;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_agent_config(&config.agent)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates the fetch executor address
///
/// The address is spliced into `http://{address}/response/base`, so it must be
/// a bare authority: no scheme, no path.
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    let address = config.address.as_str();

    if address.is_empty() {
        return Err(ConfigError::InvalidAddress(
            "address cannot be empty".to_string(),
        ));
    }

    if address.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidAddress(format!(
            "'{}' must not contain whitespace",
            address
        )));
    }

    if address.contains("://") {
        return Err(ConfigError::InvalidAddress(format!(
            "'{}' must not include a scheme",
            address
        )));
    }

    if address.contains(['/', '?', '#', '@']) {
        return Err(ConfigError::InvalidAddress(format!(
            "'{}' must be host or host:port only",
            address
        )));
    }

    let url = Url::parse(&format!("http://{}", address))
        .map_err(|e| ConfigError::InvalidAddress(format!("'{}': {}", address, e)))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidAddress(format!(
            "'{}' has no host",
            address
        )));
    }

    Ok(())
}

/// Validates the agent identity: a non-empty robots.txt product token
///
/// Robots files are matched on tokens made of `[a-zA-Z_-]`; any other
/// character would make the name unmatchable.
fn validate_agent_config(config: &AgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "agent name cannot be empty".to_string(),
        ));
    }

    if !DefaultMatcher::is_valid_user_agent_to_obey(&config.name) {
        return Err(ConfigError::Validation(format!(
            "agent name must contain only ASCII letters, '-' and '_', got '{}'",
            config.name
        )));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.ttl_secs == 0 || config.ttl_secs > MAX_TTL_SECS {
        return Err(ConfigError::Validation(format!(
            "cache ttl-secs must be between 1 and {}, got {}",
            MAX_TTL_SECS, config.ttl_secs
        )));
    }

    if config.max_sites == 0 {
        return Err(ConfigError::Validation(
            "cache max-sites must be at least 1".to_string(),
        ));
    }

    Ok(())
}
