use grocer_core::{Category, RetailerId, TargetConfig};

use super::base_or;
use crate::collector::{Collector, Harvest};
use crate::error::{ExtractionFailure, ScraperError};
use crate::extract::html::{attr_of, fragments_in, select_all, select_first, text_of};
use crate::extract::{html_fragment, put, CatalogExtractor, Fragment, Level, RawRecord};
use crate::fetch::{absolute_url, Document, Fetcher};
use crate::normalize::{PriceField, RetailerSchema, SaleRule};
use crate::traversal::{CatalogWalker, TraversalCursor};

const DEFAULT_BASE: &str = "https://www.vomar.nl";

const DISCOUNT_MARKER: &str = "discount_marker";

const SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Vomar,
    id: None,
    name: "name",
    url: "url",
    image: "img_url",
    price: PriceField::Split {
        whole: "price_large",
        fraction: "price_small",
        separator: "",
    },
    // Vomar shows a discount badge but never the previous price.
    old_price: None,
    description: None,
    sale: SaleRule::Marker {
        field: DISCOUNT_MARKER,
        present: "discount",
        absent: "no discount",
    },
};

/// Vomar: the root and category levels use different containers.
#[derive(Debug, Clone)]
pub struct Vomar {
    base: String,
    target: Option<TargetConfig>,
}

impl Vomar {
    #[must_use]
    pub fn new(base_url: Option<&str>, target: Option<TargetConfig>) -> Self {
        Self {
            base: base_or(base_url, DEFAULT_BASE),
            target,
        }
    }

    #[must_use]
    pub fn home_url(&self) -> String {
        self.base.clone()
    }

    fn catalog_url(&self) -> String {
        format!("{}/producten", self.base)
    }

    /// # Errors
    ///
    /// Returns the error of the catalog root request.
    pub async fn collect_catalog<F: Fetcher>(
        &self,
        fetcher: &F,
        delay_ms: u64,
    ) -> Result<Harvest, ScraperError> {
        let walker = CatalogWalker::new(Collector::new(fetcher, self).with_delay_ms(delay_ms));
        let mut cursor = TraversalCursor::from_target(self.target.as_ref());
        walker.walk(&self.catalog_url(), &mut cursor).await
    }
}

impl CatalogExtractor for Vomar {
    fn schema(&self) -> &RetailerSchema {
        &SCHEMA
    }

    fn locate_categories(&self, doc: &Document, level: Level) -> Option<Vec<Category>> {
        let (container, card) = match level {
            Level::Root => ("div.productrange", "div.col-xs-6"),
            Level::Category => ("div.department", "div.department-group"),
        };
        let html = doc.html();
        let region = select_first(html.root_element(), container)?;
        let categories = select_all(region, card)
            .into_iter()
            .filter_map(|card| {
                let name = text_of(card, "span")?;
                let href = attr_of(card, "a", "href")?;
                Some(Category::new(name, absolute_url(&self.base, &href)?))
            })
            .collect();
        Some(categories)
    }

    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>> {
        let html = doc.html();
        let products = fragments_in(&html, "div#products", "div.product")?;
        Some(products.into_iter().map(Fragment::Html).collect())
    }

    fn extract(&self, fragment: &Fragment) -> Result<RawRecord, ExtractionFailure> {
        let html = html_fragment(fragment)?;
        let card = html.root_element();
        let mut raw = RawRecord::new();

        put(&mut raw, "name", text_of(card, "p.description"));
        put(
            &mut raw,
            "url",
            attr_of(card, "a", "href").and_then(|href| absolute_url(&self.base, &href)),
        );
        put(
            &mut raw,
            "img_url",
            attr_of(card, "img:not(.discount)", "src")
                .and_then(|src| absolute_url(&self.base, &src)),
        );
        put(&mut raw, "price_large", text_of(card, "span.large"));
        put(&mut raw, "price_small", text_of(card, "span.small"));
        if select_first(card, "img.discount").is_some() {
            raw.insert(DISCOUNT_MARKER.to_owned(), String::new());
        }

        Ok(raw)
    }
}
