//! The per-retailer extraction contract.
//!
//! A [`CatalogExtractor`] knows one retailer's document structure: where the
//! category list lives, where the product records live, which raw fields a
//! record carries and how the retailer paginates. It never fetches anything
//! itself; the walker and collector drive it.

pub(crate) mod html;
pub(crate) mod json;

use std::collections::BTreeMap;

use grocer_core::Category;

use crate::error::ExtractionFailure;
use crate::fetch::{Document, FetchRequest};
use crate::normalize::RetailerSchema;

/// Retailer-native field mapping for one record, keyed by the names the
/// retailer's [`RetailerSchema`] refers to.
pub type RawRecord = BTreeMap<String, String>;

/// One record-bearing piece of a listing document.
///
/// HTML fragments are carried as their outer markup so no parsed tree has to
/// outlive the document it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Html(String),
    Json(serde_json::Value),
}

impl Fragment {
    /// Stable text used to detect a listing that repeats the previous page.
    #[must_use]
    pub fn fingerprint_text(&self) -> String {
        match self {
            Fragment::Html(markup) => markup.clone(),
            Fragment::Json(value) => value.to_string(),
        }
    }
}

/// Parses an HTML fragment for field lookups.
///
/// # Errors
///
/// Returns [`ExtractionFailure`] when handed a JSON fragment.
pub(crate) fn html_fragment(fragment: &Fragment) -> Result<scraper::Html, ExtractionFailure> {
    match fragment {
        Fragment::Html(markup) => Ok(html::parse_fragment(markup)),
        Fragment::Json(_) => Err(ExtractionFailure::missing("html fragment")),
    }
}

/// # Errors
///
/// Returns [`ExtractionFailure`] when handed an HTML fragment.
pub(crate) fn json_fragment(fragment: &Fragment) -> Result<&serde_json::Value, ExtractionFailure> {
    match fragment {
        Fragment::Json(value) => Ok(value),
        Fragment::Html(_) => Err(ExtractionFailure::missing("json fragment")),
    }
}

/// Records `value` under `key` when the field was found.
pub(crate) fn put(raw: &mut RawRecord, key: &str, value: Option<String>) {
    if let Some(value) = value {
        raw.insert(key.to_owned(), value);
    }
}

/// Depth in the two-level category tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Root,
    Category,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Root => "root",
            Level::Category => "category",
        }
    }
}

/// How a listing reveals where it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// Everything is on one page.
    Single,
    /// The first response declares the page count.
    KnownBound,
    /// Pages are requested until one comes back empty.
    Sentinel,
}

/// Whether listing fragments are full records or links to detail pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Inline,
    DetailPages,
}

pub trait CatalogExtractor {
    /// Field mapping used to normalize this retailer's records.
    fn schema(&self) -> &RetailerSchema;

    /// Category nodes on a tree page. `None` when the category region is not
    /// present, which callers treat as a leaf.
    fn locate_categories(&self, _doc: &Document, _level: Level) -> Option<Vec<Category>> {
        None
    }

    /// Record fragments on a listing page. `None` when the record container
    /// is absent; `Some(vec![])` when it is present but empty.
    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>>;

    /// Raw fields of one inline record, or the first required field that
    /// could not be found.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionFailure`] naming the missing field.
    fn extract(&self, fragment: &Fragment) -> Result<RawRecord, ExtractionFailure>;

    fn listing_mode(&self) -> ListingMode {
        ListingMode::Inline
    }

    /// Detail page URL of a listing fragment ([`ListingMode::DetailPages`]).
    fn item_link(&self, _fragment: &Fragment) -> Option<String> {
        None
    }

    /// Raw fields from a product detail page.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionFailure`] naming the missing field.
    fn extract_detail(&self, _doc: &Document) -> Result<RawRecord, ExtractionFailure> {
        Err(ExtractionFailure::missing("detail page"))
    }

    fn page_strategy(&self) -> PageStrategy {
        PageStrategy::Single
    }

    /// Request for page `page` (1-based) of a listing.
    fn page_request(&self, listing_url: &str, _page: u32) -> FetchRequest {
        FetchRequest::get(listing_url)
    }

    /// Request whose response declares the page count.
    fn bound_request(&self, listing_url: &str) -> FetchRequest {
        self.page_request(listing_url, 1)
    }

    /// Declared page count, if the document carries one.
    fn page_bound(&self, _doc: &Document) -> Option<u32> {
        None
    }
}
