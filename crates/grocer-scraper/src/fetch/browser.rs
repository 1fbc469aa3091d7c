//! Rendered-page fetching through a W3C WebDriver endpoint.
//!
//! Some retailers build their catalog client-side. For those a browser
//! session is opened against a running WebDriver (chromedriver, geckodriver,
//! selenium), pages are navigated and their rendered source returned as a
//! [`Document`]. Sessions are scoped: [`with_browser_session`] closes the
//! session on every exit path.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::{Document, FetchRequest, Fetcher};
use crate::error::ScraperError;

/// Where to find the WebDriver endpoint and how long to wait on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebDriverSettings {
    pub url: String,
    pub timeout_secs: u64,
}

/// An open WebDriver session.
#[derive(Debug, Clone)]
pub struct BrowserSession {
    client: Client,
    base: String,
    session_id: String,
}

impl BrowserSession {
    /// Opens a new headless browser session.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the endpoint refuses the session
    /// or answers without a session id.
    pub async fn open(settings: &WebDriverSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        let base = settings.url.trim_end_matches('/').to_owned();
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": ["--headless=new", "--disable-gpu"] }
                }
            }
        });

        let value = command(
            client.post(format!("{base}/session")).json(&capabilities),
            "open",
        )
        .await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ScraperError::Browser {
                operation: "open",
                reason: "response carried no sessionId".to_owned(),
            })?
            .to_owned();

        tracing::debug!(session_id, "browser session opened");
        Ok(Self {
            client,
            base,
            session_id,
        })
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{path}", self.base, self.session_id)
    }

    /// Navigates to `url` and returns the rendered page source.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] when navigation or source retrieval
    /// fails.
    pub async fn render(&self, url: &str) -> Result<Document, ScraperError> {
        command(
            self.client
                .post(self.session_url("/url"))
                .json(&json!({ "url": url })),
            "navigate",
        )
        .await?;
        let source = command(self.client.get(self.session_url("/source")), "source").await?;
        let body = source.as_str().ok_or_else(|| ScraperError::Browser {
            operation: "source",
            reason: "page source was not a string".to_owned(),
        })?;
        Ok(Document::new(url, body))
    }

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the endpoint rejects the delete.
    pub async fn close(self) -> Result<(), ScraperError> {
        command(self.client.delete(self.session_url("")), "close").await?;
        tracing::debug!(session_id = %self.session_id, "browser session closed");
        Ok(())
    }
}

impl Fetcher for BrowserSession {
    async fn fetch(&self, request: &FetchRequest) -> Result<Document, ScraperError> {
        if !request.headers.is_empty() {
            tracing::warn!(url = %request.url, "request headers are ignored in rendered mode");
        }
        self.render(&request.url).await
    }
}

/// Sends one WebDriver command and unwraps the `value` member of the reply.
async fn command(
    builder: reqwest::RequestBuilder,
    operation: &'static str,
) -> Result<Value, ScraperError> {
    let browser_err = |reason: String| ScraperError::Browser { operation, reason };

    let response = builder
        .send()
        .await
        .map_err(|e| browser_err(e.to_string()))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| browser_err(e.to_string()))?;

    if !status.is_success() {
        let message = body
            .pointer("/value/message")
            .and_then(Value::as_str)
            .unwrap_or("no message");
        return Err(browser_err(format!("status {}: {message}", status.as_u16())));
    }

    Ok(body.get("value").cloned().unwrap_or(Value::Null))
}

/// Runs `work` inside a freshly opened browser session.
///
/// The session is closed whether `work` succeeds or fails; a failure to close
/// is logged and does not mask the outcome of `work`.
///
/// # Errors
///
/// Returns the open failure, or whatever `work` returns.
pub async fn with_browser_session<T, W, Fut>(
    settings: &WebDriverSettings,
    work: W,
) -> Result<T, ScraperError>
where
    W: FnOnce(BrowserSession) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let session = BrowserSession::open(settings).await?;
    let outcome = work(session.clone()).await;
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }
    outcome
}
