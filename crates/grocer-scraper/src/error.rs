use grocer_core::{Capability, RetailerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("cannot reach {url}: {reason}")]
    Connectivity { url: String, reason: String },

    #[error("expected {region} not found in {url}")]
    StructureNotFound { url: String, region: &'static str },

    #[error("pagination stalled on {url} at page {page} after {stalls} attempts without progress")]
    PaginationStalled { url: String, page: u32, stalls: u32 },

    #[error("pagination limit reached for {url}: exceeded {max_pages} pages")]
    PaginationLimit { url: String, max_pages: u32 },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("browser session {operation} failed: {reason}")]
    Browser {
        operation: &'static str,
        reason: String,
    },

    #[error("retailer {retailer} does not support {capability}")]
    UnsupportedCapability {
        retailer: RetailerId,
        capability: Capability,
    },
}

/// A single record whose required fields could not be located.
///
/// Never aborts a page: the collector drops the record and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required field \"{field}\" is missing")]
pub struct ExtractionFailure {
    pub field: String,
}

impl ExtractionFailure {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}
