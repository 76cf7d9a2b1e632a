use crate::robots::{DEFAULT_AGENT, DEFAULT_MAX_SITES, DEFAULT_TTL_HOURS};
use serde::Deserialize;
use std::num::NonZeroUsize;

/// Longest accepted cache TTL (30 days)
pub const MAX_TTL_SECS: u64 = 30 * 24 * 3600;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Location of the fetch executor
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// `host:port` the executor listens on, without scheme
    pub address: String,
}

/// Agent identity policies are evaluated for
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Product token matched against User-agent lines
    #[serde(default = "default_agent_name")]
    pub name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
        }
    }
}

/// Per-site policy cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Seconds a resolved policy stays valid
    #[serde(rename = "ttl-secs", default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Most sites tracked at once before the least recently used is evicted
    #[serde(rename = "max-sites", default = "default_max_sites")]
    pub max_sites: usize,
}

impl CacheConfig {
    /// TTL as a chrono duration, clamped to [`MAX_TTL_SECS`]
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs.min(MAX_TTL_SECS) as i64)
    }

    pub fn capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_sites).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_ttl_secs(),
            max_sites: default_max_sites(),
        }
    }
}

fn default_agent_name() -> String {
    DEFAULT_AGENT.to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_HOURS as u64 * 3600
}

fn default_max_sites() -> usize {
    DEFAULT_MAX_SITES
}
