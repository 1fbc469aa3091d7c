//! Plain HTTP fetcher backed by `reqwest`.

use std::time::Duration;

use reqwest::Client;

use super::origin::extract_domain;
use super::{Document, FetchRequest, Fetcher};
use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// HTTP client for retailer pages and JSON APIs.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors. Transient errors (429, network failures, 5xx) are
/// retried with exponential backoff up to `max_retries` additional attempts.
pub struct HttpFetcher {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    async fn fetch_once(&self, request: &FetchRequest) -> Result<Document, ScraperError> {
        let mut builder = self.client.get(&request.url).header(
            reqwest::header::ACCEPT,
            "text/html,application/json;q=0.9,*/*;q=0.8",
        );
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                domain: extract_domain(&request.url),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: request.url.clone(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: request.url.clone(),
            });
        }

        let body = response.text().await?;
        Ok(Document::new(request.url.clone(), body))
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Document, ScraperError> {
        reqwest::Url::parse(&request.url).map_err(|e| ScraperError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(url = %request.url, "fetching document");
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.fetch_once(request)
        })
        .await
    }
}
