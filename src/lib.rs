//! robots-policy: crawl-politeness enforcement for a scraping platform
//!
//! This crate answers two questions for a crawl worker: may this URL be fetched,
//! and what crawl-delay does the site ask for. Robots files are retrieved through
//! an external fetch executor, interpreted according to their HTTP status, and
//! cached per site.

pub mod config;
pub mod fetch;
pub mod robots;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for policy resolution and decisions
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed URL '{url}': {source}")]
    MalformedUrl { url: String, source: UrlError },

    #[error("Failed to retrieve {url}: {source}")]
    RetrievalFailed { url: String, source: FetchError },

    #[error("Resolving robots.txt for {url} exceeded the {deadline:?} deadline")]
    DeadlineExceeded { url: String, deadline: Duration },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid fetch executor address: {0}")]
    InvalidAddress(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] ::url::ParseError),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Failures talking to the fetch executor
///
/// These never describe the robots file's own HTTP status; a 404 or 503 for
/// robots.txt is a successful retrieval.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Fetch executor replied with HTTP {0}")]
    Status(u16),

    #[error("Invalid response envelope: {0}")]
    Decode(String),
}

/// Result type alias for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{HttpFetcher, RetrievalRequest, RetrievalResponse, RobotsFetcher};
pub use robots::{
    crawl_delay, is_allowed, is_robots_url, PolicyCache, PolicyResolver, RobotsPolicy, RuleGroup,
    DEFAULT_AGENT,
};
pub use crate::url::{robots_url, site_key};
