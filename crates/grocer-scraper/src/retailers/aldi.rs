use grocer_core::{Category, RetailerId, TargetConfig};

use super::base_or;
use crate::collector::{Collector, Harvest};
use crate::error::{ExtractionFailure, ScraperError};
use crate::extract::html::{attr_of, select_all, select_first, text_of};
use crate::extract::{html_fragment, put, CatalogExtractor, Fragment, Level, RawRecord};
use crate::fetch::{absolute_url, Document, Fetcher};
use crate::normalize::{PriceField, RetailerSchema, SaleRule};
use crate::traversal::{CatalogWalker, TraversalCursor};

const DEFAULT_BASE: &str = "https://www.aldi.nl";

const SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Aldi,
    id: None,
    name: "name",
    url: "url",
    image: "img_url",
    price: PriceField::Single("price"),
    old_price: Some(PriceField::Single("old_price")),
    description: Some("description"),
    sale: SaleRule::None,
};

/// Aldi: category tiles on every tree level, article tiles on listings.
#[derive(Debug, Clone)]
pub struct Aldi {
    base: String,
    target: Option<TargetConfig>,
}

impl Aldi {
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
        format!("{}/producten.html", self.base)
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

/// The highest-resolution candidate of a `srcset` list.
fn largest_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .rsplit(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
}

impl CatalogExtractor for Aldi {
    fn schema(&self) -> &RetailerSchema {
        &SCHEMA
    }

    fn locate_categories(&self, doc: &Document, _level: Level) -> Option<Vec<Category>> {
        let html = doc.html();
        let grid = select_first(html.root_element(), "div.tiles-grid")?;
        let tiles = select_all(grid, "div.mod.mod-content-tile")
            .into_iter()
            .filter_map(|tile| {
                let name = text_of(tile, "h4.mod-content-tile__title")?;
                let href = attr_of(tile, "a.link.link--primary", "href")?;
                Some(Category::new(name, absolute_url(&self.base, &href)?))
            })
            .collect();
        Some(tiles)
    }

    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>> {
        let html = doc.html();
        let tiles = select_all(html.root_element(), "div.mod-article-tile")
            .into_iter()
            .map(|tile| Fragment::Html(tile.html()))
            .collect();
        Some(tiles)
    }

    fn extract(&self, fragment: &Fragment) -> Result<RawRecord, ExtractionFailure> {
        let html = html_fragment(fragment)?;
        let tile = html.root_element();
        let mut raw = RawRecord::new();

        put(&mut raw, "name", text_of(tile, "span.mod-article-tile__title"));
        put(
            &mut raw,
            "url",
            attr_of(tile, "a", "href").and_then(|href| absolute_url(&self.base, &href)),
        );
        put(&mut raw, "description", text_of(tile, "span.price__unit"));
        put(
            &mut raw,
            "img_url",
            attr_of(tile, "img", "data-srcset")
                .as_deref()
                .and_then(largest_srcset_candidate)
                .and_then(|src| absolute_url(&self.base, src)),
        );
        put(&mut raw, "price", text_of(tile, "span.price__wrapper"));
        put(&mut raw, "old_price", text_of(tile, "s.price__previous"));

        Ok(raw)
    }
}
