//! Policy resolver - robots.txt retrieval and interpretation
//!
//! The resolver is the entry point crawl workers use: given any URL on a site,
//! it returns that site's [`RobotsPolicy`], fetching robots.txt through the
//! configured [`RobotsFetcher`] and, when a cache is attached, sharing the
//! result between workers.

use crate::config::Config;
use crate::fetch::{retrieve, HttpFetcher, RobotsFetcher};
use crate::robots::{PolicyCache, RobotsPolicy};
use crate::url::{parse_site_url, site_key};
use crate::PolicyError;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Resolves robots exclusion policies for sites
///
/// Shareable between tasks behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct PolicyResolver<F> {
    fetcher: F,
    cache: Option<PolicyCache>,
}

impl PolicyResolver<HttpFetcher> {
    /// Builds a resolver talking to the fetch executor named in `config`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use robots_policy::config::load_config;
    /// use robots_policy::{is_allowed, PolicyResolver};
    /// use std::path::Path;
    ///
    /// # async fn example() -> robots_policy::Result<()> {
    /// let config = load_config(Path::new("robots-policy.toml"))?;
    /// let resolver = PolicyResolver::from_config(&config)?;
    ///
    /// let url = "https://example.com/private/page";
    /// let policy = resolver.resolve(url).await?;
    /// let allowed = is_allowed(url, Some(&*policy), &config.agent.name)?;
    /// # let _ = allowed;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        let fetcher = HttpFetcher::new(&config.fetcher)?;
        let resolver = if config.cache.enabled {
            Self::with_cache(
                fetcher,
                PolicyCache::with_capacity(config.cache.ttl(), config.cache.capacity()),
            )
        } else {
            Self::new(fetcher)
        };
        Ok(resolver)
    }
}

impl<F: RobotsFetcher> PolicyResolver<F> {
    /// Creates a resolver without a cache; every resolve re-fetches
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: None,
        }
    }

    /// Creates a resolver that caches policies per site
    pub fn with_cache(fetcher: F, cache: PolicyCache) -> Self {
        Self {
            fetcher,
            cache: Some(cache),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> Option<&PolicyCache> {
        self.cache.as_ref()
    }

    /// Resolves the policy of the site `site_url` belongs to
    ///
    /// # Arguments
    ///
    /// * `site_url` - Any absolute HTTP(S) URL on the site
    ///
    /// # Returns
    ///
    /// * `Ok(policy)` - Parsed document, or full allow / full disallow derived
    ///   from the robots.txt status
    /// * `Err(PolicyError::MalformedUrl)` - `site_url` is unusable; nothing was fetched
    /// * `Err(PolicyError::RetrievalFailed)` - No response could be obtained.
    ///   The site's policy is unknown; callers should not treat this as allow.
    pub async fn resolve(&self, site_url: &str) -> Result<Arc<RobotsPolicy>, PolicyError> {
        let site = parse_url(site_url)?;

        match &self.cache {
            Some(cache) => {
                let key = site_key(&site);
                tracing::trace!("Looking up cached robots.txt for {}", key);
                cache.get_or_resolve(&key, || self.fetch_policy(&site)).await
            }
            None => self.fetch_policy(&site).await.map(Arc::new),
        }
    }

    /// Like [`resolve`](Self::resolve), but gives up after `deadline`
    ///
    /// On expiry this caller's retrieval is abandoned. Other callers waiting
    /// on the same site through the cache carry on and retry it.
    pub async fn resolve_within(
        &self,
        site_url: &str,
        deadline: Duration,
    ) -> Result<Arc<RobotsPolicy>, PolicyError> {
        match tokio::time::timeout(deadline, self.resolve(site_url)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Resolving robots.txt for {} timed out", site_url);
                Err(PolicyError::DeadlineExceeded {
                    url: site_url.to_string(),
                    deadline,
                })
            }
        }
    }

    /// Forgets the cached policy of the site `site_url` belongs to
    ///
    /// Returns true if an entry was dropped. Always false without a cache.
    pub fn invalidate(&self, site_url: &str) -> Result<bool, PolicyError> {
        let site = parse_url(site_url)?;
        Ok(self
            .cache
            .as_ref()
            .is_some_and(|cache| cache.invalidate(&site_key(&site))))
    }

    async fn fetch_policy(&self, site: &Url) -> Result<RobotsPolicy, PolicyError> {
        let (status, body) = retrieve(&self.fetcher, site).await?;
        let policy = RobotsPolicy::from_status_and_bytes(status, &body);

        match status {
            400..=499 => tracing::info!(
                "robots.txt for {} returned HTTP {}, allowing all paths",
                site_key(site),
                status
            ),
            500..=599 => tracing::warn!(
                "robots.txt for {} returned HTTP {}, disallowing all paths",
                site_key(site),
                status
            ),
            _ => tracing::debug!(
                "Parsed robots.txt for {} ({} groups)",
                site_key(site),
                policy.groups().len()
            ),
        }

        Ok(policy)
    }
}

fn parse_url(site_url: &str) -> Result<Url, PolicyError> {
    parse_site_url(site_url).map_err(|source| PolicyError::MalformedUrl {
        url: site_url.to_string(),
        source,
    })
}
