use grocer_core::RetailerId;

use super::base_or;
use crate::collector::{Collector, Harvest};
use crate::error::{ExtractionFailure, ScraperError};
use crate::extract::json::text;
use crate::extract::{json_fragment, put, CatalogExtractor, Fragment, PageStrategy, RawRecord};
use crate::fetch::{absolute_url, Document, FetchRequest, Fetcher};
use crate::normalize::{PriceField, RetailerSchema, SaleRule};

const DEFAULT_HOME: &str = "https://www.hoogvliet.com";
const DEFAULT_API: &str = "https://navigator-group1.tweakwise.com";
const NAVIGATION_PATH: &str = "/navigation/ed681b01";
const PAGE_SIZE: u32 = 99;

const SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Hoogvliet,
    id: None,
    name: "title",
    url: "url",
    image: "image",
    price: PriceField::Single("price"),
    old_price: None,
    description: None,
    sale: SaleRule::None,
};

/// Hoogvliet: the whole catalog is one search-navigation feed that is read
/// until it returns an empty page.
#[derive(Debug, Clone)]
pub struct Hoogvliet {
    home: String,
    api: String,
}

impl Hoogvliet {
    /// A base override points both the site and its navigation API at the
    /// same host.
    #[must_use]
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            home: base_or(base_url, DEFAULT_HOME),
            api: base_or(base_url, DEFAULT_API),
        }
    }

    #[must_use]
    pub fn home_url(&self) -> String {
        format!("{}/", self.home)
    }

    fn feed_url(&self) -> String {
        format!("{}{NAVIGATION_PATH}", self.api)
    }

    /// # Errors
    ///
    /// Never fails on page errors; those count toward the stall limit.
    pub async fn collect_catalog<F: Fetcher>(
        &self,
        fetcher: &F,
        delay_ms: u64,
    ) -> Result<Harvest, ScraperError> {
        let collector = Collector::new(fetcher, self).with_delay_ms(delay_ms);
        collector.collect_listing(&self.feed_url()).await
    }
}

impl CatalogExtractor for Hoogvliet {
    fn schema(&self) -> &RetailerSchema {
        &SCHEMA
    }

    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>> {
        let body = doc
            .json()
            .map_err(|e| tracing::debug!(error = %e, "feed page is not JSON"))
            .ok()?;
        let items = body.get("items")?.as_array()?;
        Some(items.iter().cloned().map(Fragment::Json).collect())
    }

    fn extract(&self, fragment: &Fragment) -> Result<RawRecord, ExtractionFailure> {
        let item = json_fragment(fragment)?;
        let mut raw = RawRecord::new();
        put(&mut raw, "title", text(item, "title"));
        put(
            &mut raw,
            "url",
            text(item, "url").and_then(|url| absolute_url(&self.home, &url)),
        );
        put(&mut raw, "image", text(item, "image"));
        put(&mut raw, "price", text(item, "price"));
        Ok(raw)
    }

    fn page_strategy(&self) -> PageStrategy {
        PageStrategy::Sentinel
    }

    fn page_request(&self, listing_url: &str, page: u32) -> FetchRequest {
        FetchRequest::get(format!(
            "{listing_url}?tn_q=&tn_p={page}&tn_ps={PAGE_SIZE}&tn_sort=&tn_cid=999999\
             &CatalogPermalink=producten&CategoryPermalink=producten&format=json\
             &tn_parameters=ae-productorrecipe%3Dproduct"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn page_number_goes_in_tn_p() {
        let site = Hoogvliet::new(None);
        let request = site.page_request(&site.feed_url(), 3);
        assert!(request
            .url
            .starts_with("https://navigator-group1.tweakwise.com/navigation/ed681b01?tn_q=&tn_p=3&tn_ps=99"));
        assert!(request.url.ends_with("format=json&tn_parameters=ae-productorrecipe%3Dproduct"));
        assert!(request.headers.is_empty());
    }

    #[test]
    fn items_are_records_and_missing_items_is_no_container() {
        let site = Hoogvliet::new(None);
        let doc = Document::new(
            "https://api/x",
            r#"{"items": [{"title": "Melk", "url": "/melk", "image": "https://img/melk.png", "price": 1.05}]}"#,
        );
        let fragments = site.locate_records(&doc).unwrap();
        let product = normalize(&site.extract(&fragments[0]).unwrap(), &SCHEMA).unwrap();
        assert_eq!(product.url, "https://www.hoogvliet.com/melk");
        assert_eq!(product.price, "1.05");
        assert_eq!(product.old_price, "1.05");

        let broken = Document::new("https://api/x", r#"{"error": "busy"}"#);
        assert!(site.locate_records(&broken).is_none());
        let html = Document::new("https://api/x", "<html></html>");
        assert!(site.locate_records(&html).is_none());
    }

    #[test]
    fn base_override_moves_home_and_feed() {
        let site = Hoogvliet::new(Some("http://127.0.0.1:4000"));
        assert_eq!(site.home_url(), "http://127.0.0.1:4000/");
        assert_eq!(site.feed_url(), "http://127.0.0.1:4000/navigation/ed681b01");
    }
}
