//! Retrieval bridge to the external fetch executor
//!
//! This module builds robots.txt retrieval requests and hands them to a
//! [`RobotsFetcher`]. It performs no retries, timeouts or redirect following;
//! those belong to the executor.

mod client;
mod types;

pub use client::HttpFetcher;
pub use types::{Method, RetrievalRequest, RetrievalResponse};

use crate::url::{parse_site_url, robots_url};
use crate::{FetchError, PolicyError};
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Transport used to retrieve robots files
///
/// Implementations return `Ok` for any response the executor relayed,
/// whatever its HTTP status, and `Err` only when no response was obtained.
pub trait RobotsFetcher: Send + Sync {
    fn fetch(
        &self,
        request: &RetrievalRequest,
    ) -> impl Future<Output = Result<RetrievalResponse, FetchError>> + Send;
}

impl<F: RobotsFetcher> RobotsFetcher for Arc<F> {
    fn fetch(
        &self,
        request: &RetrievalRequest,
    ) -> impl Future<Output = Result<RetrievalResponse, FetchError>> + Send {
        (**self).fetch(request)
    }
}

/// Fetches the robots.txt of the site `site_url` belongs to
///
/// # Arguments
///
/// * `fetcher` - Transport to the fetch executor
/// * `site_url` - Any absolute URL on the site
///
/// # Returns
///
/// * `Ok((status, body))` - The executor relayed a response, whatever its status
/// * `Err(PolicyError::MalformedUrl)` - `site_url` is unusable; nothing was sent
/// * `Err(PolicyError::RetrievalFailed)` - The executor could not produce a response
pub async fn fetch_robots_bytes<F: RobotsFetcher>(
    fetcher: &F,
    site_url: &str,
) -> Result<(u16, Vec<u8>), PolicyError> {
    let site = parse_site_url(site_url).map_err(|source| PolicyError::MalformedUrl {
        url: site_url.to_string(),
        source,
    })?;
    retrieve(fetcher, &site).await
}

/// Retrieves robots.txt for an already validated site URL
pub(crate) async fn retrieve<F: RobotsFetcher>(
    fetcher: &F,
    site: &Url,
) -> Result<(u16, Vec<u8>), PolicyError> {
    let request = RetrievalRequest::get(robots_url(site));
    tracing::debug!("Fetching {}", request.url);

    match fetcher.fetch(&request).await {
        Ok(response) => {
            tracing::debug!(
                "Fetched {} (HTTP {}, {} bytes)",
                request.url,
                response.status_code,
                response.body.len()
            );
            Ok((response.status_code, response.body))
        }
        Err(source) => {
            tracing::warn!("Failed to fetch {}: {}", request.url, source);
            Err(PolicyError::RetrievalFailed {
                url: request.url,
                source,
            })
        }
    }
}
