use grocer_core::RetailerId;

use super::base_or;
use crate::collector::{Collector, Harvest};
use crate::error::{ExtractionFailure, ScraperError};
use crate::extract::html::{attr_of, select_all, text_of};
use crate::extract::{html_fragment, put, CatalogExtractor, Fragment, RawRecord};
use crate::fetch::{absolute_url, Document, Fetcher};
use crate::normalize::{PriceField, RetailerSchema, SaleRule};

const DEFAULT_BASE: &str = "https://www.dekamarkt.nl";

const SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Deka,
    id: None,
    name: "name",
    url: "url",
    image: "img_url",
    price: PriceField::Split {
        whole: "offer_euros",
        fraction: "offer_cents",
        separator: "",
    },
    old_price: Some(PriceField::Split {
        whole: "regular_euros",
        fraction: "regular_cents",
        separator: "",
    }),
    description: None,
    sale: SaleRule::None,
};

/// Deka: only the weekly offers page is collected.
#[derive(Debug, Clone)]
pub struct Deka {
    base: String,
}

impl Deka {
    #[must_use]
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base: base_or(base_url, DEFAULT_BASE),
        }
    }

    #[must_use]
    pub fn home_url(&self) -> String {
        self.base.clone()
    }

    fn offers_url(&self) -> String {
        format!("{}/aanbiedingen", self.base)
    }

    /// # Errors
    ///
    /// Returns the error of the offers page request.
    pub async fn collect_discounts<F: Fetcher>(
        &self,
        fetcher: &F,
        delay_ms: u64,
    ) -> Result<Harvest, ScraperError> {
        let collector = Collector::new(fetcher, self).with_delay_ms(delay_ms);
        tracing::info!(retailer = %SCHEMA.retailer, "collecting offers");
        collector.collect_listing(&self.offers_url()).await
    }
}

impl CatalogExtractor for Deka {
    fn schema(&self) -> &RetailerSchema {
        &SCHEMA
    }

    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>> {
        let html = doc.html();
        let cards = select_all(html.root_element(), "article.deka-product-card")
            .into_iter()
            .map(|card| Fragment::Html(card.html()))
            .collect();
        Some(cards)
    }

    fn extract(&self, fragment: &Fragment) -> Result<RawRecord, ExtractionFailure> {
        let html = html_fragment(fragment)?;
        let card = html.root_element();
        let mut raw = RawRecord::new();

        put(
            &mut raw,
            "name",
            text_of(card, "h3.deka-product-card--info--title.product-card-title-1"),
        );
        put(
            &mut raw,
            "url",
            attr_of(card, "a.deka-product-card--image", "href")
                .and_then(|href| absolute_url(&self.base, &href)),
        );
        put(
            &mut raw,
            "img_url",
            attr_of(card, "img", "src").and_then(|src| absolute_url(&self.base, &src)),
        );
        put(
            &mut raw,
            "offer_euros",
            text_of(card, "span.price--before-decimal--offer.price-1"),
        );
        put(
            &mut raw,
            "offer_cents",
            text_of(card, "span.price--after-decimal--offer.price-2"),
        );
        put(
            &mut raw,
            "regular_euros",
            text_of(card, "span.price--before-decimal--regular.price-2"),
        );
        put(
            &mut raw,
            "regular_cents",
            text_of(card, "span.price--after-decimal--regular.price-2"),
        );

        Ok(raw)
    }
}
