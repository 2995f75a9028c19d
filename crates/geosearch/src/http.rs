//! HTTP client abstraction for testability.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;

/// Identifies the client to the encyclopedia API, which rejects anonymous
/// user agents.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "nearby-explorer/",
    env!("CARGO_PKG_VERSION"),
    " (map overlay geosearch client)"
);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Asynchronous GET transport.
///
/// Implementations return the response body for 2xx responses and
/// [`FetchError::FetchFailed`] for everything else.
pub trait AsyncHttpClient: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

impl<T: AsyncHttpClient> AsyncHttpClient for Arc<T> {
    fn get(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        (**self).get(url)
    }
}

/// Production transport backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| FetchError::FetchFailed(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "HTTP GET");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(
                url = %url,
                error = %e,
                is_connect = e.is_connect(),
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            FetchError::FetchFailed(format!("request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "HTTP error status");
            return Err(FetchError::FetchFailed(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url.host_str().unwrap_or("<unknown host>")
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::FetchFailed(format!("failed to read body: {e}")))?;
        debug!(url = %url, bytes = body.len(), "HTTP response received");
        Ok(body.to_vec())
    }
}
