//! HTTP client for the fetch executor
//!
//! The executor exposes `POST /response/base`, taking a JSON
//! [`RetrievalRequest`] and answering with a JSON [`RetrievalResponse`].

use crate::config::FetcherConfig;
use crate::fetch::{RetrievalRequest, RetrievalResponse, RobotsFetcher};
use crate::FetchError;
use reqwest::Client;

/// Path of the executor endpoint that performs plain HTTP retrieval
const BASE_FETCH_PATH: &str = "/response/base";

/// [`RobotsFetcher`] backed by a remote fetch executor
///
/// No timeout or retry is configured on the client; bounding latency is the
/// caller's job (see `PolicyResolver::resolve_within`).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    endpoint: String,
}

impl HttpFetcher {
    /// Builds a fetcher for the executor at `config.address`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use robots_policy::config::FetcherConfig;
    /// use robots_policy::fetch::HttpFetcher;
    ///
    /// let config = FetcherConfig {
    ///     address: "127.0.0.1:8000".to_string(),
    /// };
    ///
    /// let fetcher = HttpFetcher::new(&config).unwrap();
    /// assert_eq!(fetcher.endpoint(), "http://127.0.0.1:8000/response/base");
    /// ```
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().gzip(true).brotli(true).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Uses an already configured client, e.g. one shared with other services
    pub fn with_client(client: Client, config: &FetcherConfig) -> Self {
        Self {
            client,
            endpoint: format!("http://{}{}", config.address, BASE_FETCH_PATH),
        }
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RobotsFetcher for HttpFetcher {
    async fn fetch(&self, request: &RetrievalRequest) -> Result<RetrievalResponse, FetchError> {
        tracing::trace!("Posting {} to {}", request.url, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        RetrievalResponse::from_json(&bytes)
    }
}
