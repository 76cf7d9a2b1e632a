use crate::{UrlError, UrlResult};
use url::Url;

/// Parses a crawl target and checks it can have a robots.txt
///
/// The URL must be absolute, use HTTP or HTTPS, and carry a host.
///
/// # Examples
///
/// ```
/// use robots_policy::url::parse_site_url;
///
/// assert!(parse_site_url("https://example.com/page").is_ok());
/// assert!(parse_site_url("/relative/path").is_err());
/// assert!(parse_site_url("mailto:someone@example.com").is_err());
/// ```
pub fn parse_site_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str)?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Returns the origin a site's policy is keyed by
///
/// Scheme, lowercased host and any non-default port. Path, query, fragment
/// and credentials are dropped, so every page of a site shares one key.
pub fn site_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Derives the robots.txt location for a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use robots_policy::url::robots_url;
///
/// let url = Url::parse("https://user:pw@Example.com/a/b?q=1#frag").unwrap();
/// assert_eq!(robots_url(&url), "https://example.com/robots.txt");
///
/// let url = Url::parse("http://example.com:8080/page").unwrap();
/// assert_eq!(robots_url(&url), "http://example.com:8080/robots.txt");
/// ```
pub fn robots_url(url: &Url) -> String {
    format!("{}/robots.txt", site_key(url))
}
