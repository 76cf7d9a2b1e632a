//! Robots.txt handling module
//!
//! This module resolves, caches and applies robots exclusion policies. The
//! decision functions here are pure: they take an already resolved policy,
//! where `None` stands for "no restrictions known".

mod cache;
mod parser;
mod resolver;

pub use cache::{CachedRobots, PolicyCache, DEFAULT_MAX_SITES, DEFAULT_TTL_HOURS};
pub use parser::{RobotsPolicy, RuleGroup};
pub use resolver::PolicyResolver;

use crate::url::parse_site_url;
use crate::PolicyError;
use std::time::Duration;

/// Agent identity used when the configuration does not name one
pub const DEFAULT_AGENT: &str = "DataflowKitBot";

/// Checks if a URL may be fetched under `policy`
///
/// # Arguments
///
/// * `url` - Absolute URL of the page to fetch
/// * `policy` - The site's resolved policy; `None` means full allow
/// * `user_agent` - Agent identity the policy is evaluated for
///
/// The URL's path and, when present, its `?query` are matched against the
/// rules, so `Disallow: /search?q=` blocks `/search?q=rust` but not
/// `/search`; a path-only match would never apply query-scoped rules.
/// The fragment is never part of the match.
///
/// # Returns
///
/// * `Ok(true)` - The URL is allowed
/// * `Ok(false)` - The URL is disallowed
/// * `Err(PolicyError::MalformedUrl)` - `url` could not be parsed
///
/// # Examples
///
/// ```
/// use robots_policy::{is_allowed, RobotsPolicy, DEFAULT_AGENT};
///
/// let policy = RobotsPolicy::from_content("User-agent: *\nDisallow: /private");
/// assert!(!is_allowed("https://example.com/private/a", Some(&policy), DEFAULT_AGENT).unwrap());
/// assert!(is_allowed("https://example.com/private/a", None, DEFAULT_AGENT).unwrap());
/// ```
pub fn is_allowed(
    url: &str,
    policy: Option<&RobotsPolicy>,
    user_agent: &str,
) -> Result<bool, PolicyError> {
    let Some(policy) = policy else {
        return Ok(true);
    };

    let parsed = parse_site_url(url).map_err(|source| PolicyError::MalformedUrl {
        url: url.to_string(),
        source,
    })?;

    let mut target = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        target.push('?');
        target.push_str(query);
    }

    Ok(policy.is_allowed(&target, user_agent))
}

/// Gets the crawl delay `policy` requests from `user_agent`
///
/// Zero when there is no policy or no delay is declared. The value is
/// advisory; pacing requests is the scheduler's job.
pub fn crawl_delay(policy: Option<&RobotsPolicy>, user_agent: &str) -> Duration {
    policy
        .and_then(|policy| policy.crawl_delay(user_agent))
        .unwrap_or(Duration::ZERO)
}

/// Checks if a URL points at a robots.txt file
///
/// Callers use this to avoid resolving a policy for the policy file itself.
/// The check is an exact suffix match, so a query string makes it false.
pub fn is_robots_url(url: &str) -> bool {
    url.ends_with("/robots.txt")
}
