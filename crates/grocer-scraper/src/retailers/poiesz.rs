use grocer_core::{Category, CategorySeed, RetailerId, TargetConfig};
use serde_json::{json, Value};

use super::base_or;
use crate::collector::{Collector, Harvest};
use crate::error::{ExtractionFailure, ScraperError};
use crate::extract::json::{joined, text};
use crate::extract::{json_fragment, put, CatalogExtractor, Fragment, PageStrategy, RawRecord};
use crate::fetch::{Document, FetchRequest, Fetcher};
use crate::normalize::{PriceField, RetailerSchema, SaleRule};
use crate::pagination::parse_page_count;
use crate::traversal::{CatalogWalker, CategoryBranch, TraversalCursor};

const DEFAULT_HOME: &str = "https://www.poiesz-supermarkten.nl";
const DEFAULT_API: &str = "https://api.poiesz-supermarkten.nl";
const DEFAULT_SHOP: &str = "https://webwinkel.poiesz-supermarkten.nl";

const CATALOG_SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Poiesz,
    id: Some("id"),
    name: "name",
    url: "url",
    image: "image",
    price: PriceField::Single("price"),
    old_price: None,
    description: Some("description"),
    sale: SaleRule::Fixed("0%"),
};

const OFFERS_SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Poiesz,
    id: Some("id"),
    name: "name",
    url: "url",
    image: "image",
    price: PriceField::Single("price"),
    old_price: Some(PriceField::Single("old_price")),
    description: Some("description"),
    sale: SaleRule::Field("sale"),
};

/// Poiesz: a JSON product API whose category tree is not published, so the
/// tree comes from `retailers.yaml`. The page number travels in a header.
#[derive(Debug, Clone)]
pub struct Poiesz {
    home: String,
    api: String,
    shop: String,
    target: Option<TargetConfig>,
    tree: Vec<CategoryBranch>,
}

impl Poiesz {
    #[must_use]
    pub fn new(
        base_url: Option<&str>,
        target: Option<TargetConfig>,
        seeds: &[CategorySeed],
    ) -> Self {
        let api = base_or(base_url, DEFAULT_API);
        let tree = seeds
            .iter()
            .map(|seed| CategoryBranch {
                category: Category::new(
                    seed.name.as_str(),
                    format!("{api}/api/v1.0/products/{}/products", seed.name),
                ),
                children: seed
                    .subcategories
                    .iter()
                    .map(|sub| {
                        Category::new(
                            sub.as_str(),
                            format!("{api}/api/v1.0/products/{}/{sub}/products", seed.name),
                        )
                    })
                    .collect(),
            })
            .collect();

        Self {
            home: base_or(base_url, DEFAULT_HOME),
            shop: base_or(base_url, DEFAULT_SHOP),
            api,
            target,
            tree,
        }
    }

    #[must_use]
    pub fn home_url(&self) -> String {
        format!("{}/", self.home)
    }

    fn offers_url(&self) -> String {
        format!("{}/api/v1.0/offers?storeNumber=null", self.api)
    }

    fn product_url(&self, id: &str) -> String {
        format!("{}/boodschappen/producten/{id}", self.shop)
    }

    /// # Errors
    ///
    /// Never fails as a whole; listings that fail are logged and skipped.
    pub async fn collect_catalog<F: Fetcher>(
        &self,
        fetcher: &F,
        delay_ms: u64,
    ) -> Result<Harvest, ScraperError> {
        if self.tree.is_empty() {
            tracing::warn!(
                retailer = %CATALOG_SCHEMA.retailer,
                "no static categories configured, catalog skipped"
            );
            return Ok(Harvest::default());
        }
        let walker = CatalogWalker::new(Collector::new(fetcher, self).with_delay_ms(delay_ms));
        let mut cursor = TraversalCursor::from_target(self.target.as_ref());
        Ok(walker.walk_tree(&self.tree, &mut cursor).await)
    }

    /// # Errors
    ///
    /// Returns the error of the offers feed request.
    pub async fn collect_offers<F: Fetcher>(
        &self,
        fetcher: &F,
        delay_ms: u64,
    ) -> Result<Harvest, ScraperError> {
        let offers = PoieszOffers { poiesz: self };
        let collector = Collector::new(fetcher, &offers).with_delay_ms(delay_ms);
        tracing::info!(retailer = %OFFERS_SCHEMA.retailer, "collecting offers");
        collector.collect_listing(&self.offers_url()).await
    }
}

impl CatalogExtractor for Poiesz {
    fn schema(&self) -> &RetailerSchema {
        &CATALOG_SCHEMA
    }

    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>> {
        let body = doc
            .json()
            .map_err(|e| tracing::debug!(error = %e, "product page is not JSON"))
            .ok()?;
        let items = body.get("items")?.as_array()?;
        Some(items.iter().cloned().map(Fragment::Json).collect())
    }

    fn extract(&self, fragment: &Fragment) -> Result<RawRecord, ExtractionFailure> {
        let item = json_fragment(fragment)?;
        let mut raw = RawRecord::new();
        let id = text(item, "id");
        put(&mut raw, "url", id.as_deref().map(|id| self.product_url(id)));
        put(&mut raw, "id", id);
        put(&mut raw, "name", text(item, "name"));
        put(&mut raw, "description", text(item, "description"));
        put(&mut raw, "image", text(item, "image"));
        put(&mut raw, "price", text(item, "price"));
        Ok(raw)
    }

    fn page_strategy(&self) -> PageStrategy {
        PageStrategy::KnownBound
    }

    fn page_request(&self, listing_url: &str, page: u32) -> FetchRequest {
        FetchRequest::get(listing_url)
            .header("page", page.to_string())
            .header("storeNumber", "null")
    }

    fn page_bound(&self, doc: &Document) -> Option<u32> {
        let body = doc.json().ok()?;
        let paging = body.get("paging")?;
        text(paging, "pages").and_then(|pages| parse_page_count(&pages))
    }
}

/// The Poiesz promotions feed. One offer can cover several products; each
/// covered product becomes its own record.
pub struct PoieszOffers<'a> {
    poiesz: &'a Poiesz,
}

impl CatalogExtractor for PoieszOffers<'_> {
    fn schema(&self) -> &RetailerSchema {
        &OFFERS_SCHEMA
    }

    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>> {
        let body = doc.json().ok()?;
        let categories = body.get("categories")?.as_array()?;
        let mut fragments = Vec::new();
        for category in categories {
            let offers = category.get("offers").and_then(Value::as_array);
            for offer in offers.into_iter().flatten() {
                let product_ids = offer.get("productIDs").and_then(Value::as_array);
                for product_id in product_ids.into_iter().flatten() {
                    fragments.push(Fragment::Json(json!({
                        "productId": product_id,
                        "offer": offer,
                    })));
                }
            }
        }
        Some(fragments)
    }

    fn extract(&self, fragment: &Fragment) -> Result<RawRecord, ExtractionFailure> {
        let record = json_fragment(fragment)?;
        let offer = record
            .get("offer")
            .ok_or_else(|| ExtractionFailure::missing("offer"))?;
        let id = text(record, "productId").ok_or_else(|| ExtractionFailure::missing("productId"))?;

        let mut raw = RawRecord::new();
        raw.insert("url".to_owned(), self.poiesz.product_url(&id));
        raw.insert(
            "image".to_owned(),
            format!("{}/artikelen/{id}.png", self.poiesz.shop),
        );
        raw.insert("id".to_owned(), id);
        put(&mut raw, "name", text(offer, "commercialTextLine1"));
        raw.insert(
            "description".to_owned(),
            joined(
                offer,
                &[
                    "commercialTextDetailsLine1",
                    "commercialTextDetailsLine2",
                    "commercialTextDetailsLine3",
                ],
            ),
        );
        put(&mut raw, "price", text(offer, "newPriceLow"));
        put(&mut raw, "old_price", text(offer, "oldPriceHigh"));
        raw.insert(
            "sale".to_owned(),
            joined(offer, &["offerTypeLine1", "offerTypeLine2", "offerTypeLine3"]),
        );
        Ok(raw)
    }
}
