//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use robots_policy::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("robots-policy.toml")).unwrap();
//! println!("Fetch executor at: {}", config.fetcher.address);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AgentConfig, CacheConfig, Config, FetcherConfig, MAX_TTL_SECS};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
