use serde::{Deserialize, Serialize};

/// A product scraped from a retailer's catalog, normalized so that every
/// retailer's output shares one shape.
///
/// Prices are kept exactly as the retailer renders them (e.g. `"1.29"`,
/// `"129"` from separately rendered euros and cents). No numeric parsing
/// happens at scrape time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Retailer-assigned product identifier, when the retailer exposes one.
    pub id: Option<String>,
    /// Retailer the product was collected from (e.g. `"aldi"`).
    pub retailer: String,
    pub name: String,
    /// Canonical product page URL.
    pub url: String,
    pub image_url: String,
    /// Current selling price, verbatim.
    pub price: String,
    /// Pre-discount price. Equal to [`Product::price`] when the retailer shows
    /// no previous price.
    pub old_price: String,
    /// Pack size or measure text (e.g. `"1L"`, `"per stuk"`).
    pub description: Option<String>,
    /// Free-text promotion label, e.g. `"2e halve prijs"`.
    pub sale: Option<String>,
}

impl Product {
    /// Returns `true` when the retailer displayed a previous price distinct
    /// from the current one.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.old_price != self.price
    }
}

/// A node in a retailer's two-level category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name exactly as scraped; used verbatim for target matching.
    pub name: String,
    /// Absolute URL (or API endpoint) of the category listing.
    pub link: String,
}

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }
}
