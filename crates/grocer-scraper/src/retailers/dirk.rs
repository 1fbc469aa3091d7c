use grocer_core::{Category, RetailerId, TargetConfig};

use super::base_or;
use crate::collector::{Collector, Harvest};
use crate::error::{ExtractionFailure, ScraperError};
use crate::extract::html::{attr_of, fragments_in, select_all, select_first, text_of};
use crate::extract::{
    html_fragment, put, CatalogExtractor, Fragment, Level, ListingMode, RawRecord,
};
use crate::fetch::{absolute_url, Document, Fetcher};
use crate::normalize::{PriceField, RetailerSchema, SaleRule};
use crate::traversal::{CatalogWalker, TraversalCursor};

const DEFAULT_BASE: &str = "https://www.dirk.nl";

const SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Dirk,
    id: None,
    name: "name",
    url: "url",
    image: "img_url",
    price: PriceField::Split {
        whole: "euros",
        fraction: "cents",
        separator: "",
    },
    old_price: Some(PriceField::Single("old_price")),
    description: None,
    sale: SaleRule::None,
};

/// Dirk: listings only link to product pages, so every product costs one
/// extra request.
#[derive(Debug, Clone)]
pub struct Dirk {
    base: String,
    target: Option<TargetConfig>,
}

impl Dirk {
    #[must_use]
    pub fn new(base_url: Option<&str>, target: Option<TargetConfig>) -> Self {
        Self {
            base: base_or(base_url, DEFAULT_BASE),
            target,
        }
    }

    #[must_use]
    pub fn home_url(&self) -> String {
        format!("{}/", self.base)
    }

    fn catalog_url(&self) -> String {
        format!("{}/boodschappen", self.base)
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

impl CatalogExtractor for Dirk {
    fn schema(&self) -> &RetailerSchema {
        &SCHEMA
    }

    fn locate_categories(&self, doc: &Document, _level: Level) -> Option<Vec<Category>> {
        let html = doc.html();
        let nav = select_first(html.root_element(), "nav.product-category-header__nav")?;
        let categories = select_all(nav, "li")
            .into_iter()
            .filter_map(|item| {
                let name = text_of(item, "a")?;
                let href = attr_of(item, "a", "href")?;
                Some(Category::new(name, absolute_url(&self.base, &href)?))
            })
            .collect();
        Some(categories)
    }

    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>> {
        let html = doc.html();
        let cards = fragments_in(
            &html,
            "div.products-list-container div.products-wrapper",
            "div.product-card",
        )?;
        Some(cards.into_iter().map(Fragment::Html).collect())
    }

    fn extract(&self, _fragment: &Fragment) -> Result<RawRecord, ExtractionFailure> {
        Err(ExtractionFailure::missing("inline record"))
    }

    fn listing_mode(&self) -> ListingMode {
        ListingMode::DetailPages
    }

    fn item_link(&self, fragment: &Fragment) -> Option<String> {
        let html = html_fragment(fragment).ok()?;
        let href = attr_of(html.root_element(), "a.product-card__image", "href")?;
        absolute_url(&self.base, &href)
    }

    fn extract_detail(&self, doc: &Document) -> Result<RawRecord, ExtractionFailure> {
        let html = doc.html();
        let page = html.root_element();
        let mut raw = RawRecord::new();

        raw.insert("url".to_owned(), doc.url.clone());
        put(
            &mut raw,
            "name",
            text_of(page, "div.product-details__info h1.product-details__info__title"),
        );
        put(
            &mut raw,
            "img_url",
            attr_of(page, "div.product-details__image img", "src")
                .and_then(|src| absolute_url(&self.base, &src)),
        );
        if let Some(prices) = select_first(page, "div.product-card__price") {
            put(
                &mut raw,
                "euros",
                text_of(prices, "span.product-card__price__euros"),
            );
            put(
                &mut raw,
                "cents",
                text_of(prices, "span.product-card__price__cents"),
            );
            put(
                &mut raw,
                "old_price",
                text_of(prices, "div.product-card__price__old"),
            );
        }

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    const NAV: &str = r#"
        <nav class="product-category-header__nav">
          <ul>
            <li><a href="/boodschappen/zuivel">Zuivel</a></li>
            <li><a href="/boodschappen/brood">Brood</a></li>
          </ul>
        </nav>"#;

    const LISTING: &str = r#"
        <div class="products-list-container">
          <div class="products-wrapper">
            <div class="product-card"><a class="product-card__image" href="/boodschappen/zuivel/melk/123"></a></div>
            <div class="product-card"><span>no link</span></div>
          </div>
        </div>"#;

    const DETAIL: &str = r#"
        <div class="product-details__info"><h1 class="product-details__info__title">Halfvolle melk</h1></div>
        <div class="product-details__image"><img src="https://static.dirk.nl/melk.png"></div>
        <div class="product-card__price">
          <div class="product-card__price__old"> 1.29 </div>
          <span class="product-card__price__euros">0.</span><span class="product-card__price__cents">99</span>
        </div>"#;

    fn dirk() -> Dirk {
        Dirk::new(None, None)
    }

    #[test]
    fn locates_nav_categories() {
        let doc = Document::new("https://www.dirk.nl/boodschappen", NAV);
        let categories = dirk().locate_categories(&doc, Level::Root).unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].name, "Brood");
        assert_eq!(categories[1].link, "https://www.dirk.nl/boodschappen/brood");
    }

    #[test]
    fn category_names_keep_scraped_whitespace() {
        let nav = r#"<nav class="product-category-header__nav"><ul>
            <li><a href="/boodschappen/brood">Brood</a></li>
            <li><a href="/boodschappen/zuivel"> Zuivel
</a></li>
        </ul></nav>"#;
        let doc = Document::new("https://www.dirk.nl/boodschappen", nav);
        let categories = dirk().locate_categories(&doc, Level::Root).unwrap();
        assert_eq!(categories[1].name, " Zuivel\n");

        let mut cursor = TraversalCursor {
            target_category: Some(" Zuivel\n".to_owned()),
            ..TraversalCursor::unrestricted()
        };
        let selected = cursor.select_categories(&categories);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].link, "https://www.dirk.nl/boodschappen/zuivel");
    }

    #[test]
    fn item_links_from_listing() {
        let site = dirk();
        let doc = Document::new("https://www.dirk.nl/boodschappen/zuivel", LISTING);
        let fragments = site.locate_records(&doc).unwrap();
        let links: Vec<String> = fragments.iter().filter_map(|f| site.item_link(f)).collect();
        assert_eq!(links, ["https://www.dirk.nl/boodschappen/zuivel/melk/123"]);
    }

    #[test]
    fn listing_without_wrapper_has_no_container() {
        let doc = Document::new("https://www.dirk.nl/boodschappen/leeg", NAV);
        assert!(dirk().locate_records(&doc).is_none());
    }

    #[test]
    fn detail_page_joins_euros_and_cents() {
        let site = dirk();
        let doc = Document::new("https://www.dirk.nl/boodschappen/zuivel/melk/123", DETAIL);
        let product = normalize(&site.extract_detail(&doc).unwrap(), &SCHEMA).unwrap();
        assert_eq!(product.name, "Halfvolle melk");
        assert_eq!(product.url, "https://www.dirk.nl/boodschappen/zuivel/melk/123");
        assert_eq!(product.image_url, "https://static.dirk.nl/melk.png");
        assert_eq!(product.price, "0.99");
        assert_eq!(product.old_price, "1.29");
    }
}
