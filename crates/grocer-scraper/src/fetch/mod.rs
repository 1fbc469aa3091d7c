//! Document retrieval: plain HTTP and rendered (WebDriver) pages behind one
//! [`Fetcher`] interface.

mod browser;
mod http;
mod origin;

pub use browser::{with_browser_session, BrowserSession, WebDriverSettings};
pub use http::HttpFetcher;
pub use origin::{absolute_url, extract_domain};

use crate::error::ScraperError;

/// One request against a retailer: a URL plus any extra headers the endpoint
/// needs (some retailer APIs take the page number as a header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A fetched document. Parsing is left to the extractor that consumes it.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub body: String,
}

impl Document {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Parses the body as HTML.
    #[must_use]
    pub fn html(&self) -> scraper::Html {
        scraper::Html::parse_document(&self.body)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Deserialize`] when the body is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, ScraperError> {
        serde_json::from_str(&self.body).map_err(|e| ScraperError::Deserialize {
            context: format!("document from {}", self.url),
            source: e,
        })
    }
}

/// Retrieves documents for the traversal engine.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetches one document.
    ///
    /// # Errors
    ///
    /// Implementations return transport, status, or session errors; they never
    /// inspect document structure.
    async fn fetch(&self, request: &FetchRequest) -> Result<Document, ScraperError>;
}

/// Initial reachability check for a retailer's main endpoint.
///
/// # Errors
///
/// Any failure is reported as [`ScraperError::Connectivity`] so the
/// aggregator can exclude the retailer from the run.
pub async fn ensure_reachable<F: Fetcher>(fetcher: &F, url: &str) -> Result<(), ScraperError> {
    match fetcher.fetch(&FetchRequest::get(url)).await {
        Ok(_) => Ok(()),
        Err(e) => Err(ScraperError::Connectivity {
            url: url.to_owned(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_request_collects_headers_in_order() {
        let request = FetchRequest::get("https://api.example.com/products")
            .header("page", "2")
            .header("storeNumber", "null");
        assert_eq!(request.url, "https://api.example.com/products");
        assert_eq!(
            request.headers,
            vec![
                ("page".to_owned(), "2".to_owned()),
                ("storeNumber".to_owned(), "null".to_owned())
            ]
        );
    }

    #[test]
    fn document_json_reports_source_url_on_failure() {
        let doc = Document::new("https://api.example.com/x", "<html>");
        let err = doc.json().unwrap_err();
        assert!(err.to_string().contains("https://api.example.com/x"));
    }

    #[test]
    fn document_json_parses_body() {
        let doc = Document::new("https://api.example.com/x", r#"{"items": []}"#);
        let value = doc.json().unwrap();
        assert!(value["items"].as_array().unwrap().is_empty());
    }
}
