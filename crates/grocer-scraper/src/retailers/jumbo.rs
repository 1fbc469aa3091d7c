use grocer_core::{Category, RetailerId, TargetConfig};
use serde_json::Value;

use super::base_or;
use crate::collector::{Collector, Harvest};
use crate::error::{ExtractionFailure, ScraperError};
use crate::extract::html::{attr_of, fragments_in, select_all, select_first, text_of};
use crate::extract::json::text;
use crate::extract::{html_fragment, put, CatalogExtractor, Fragment, PageStrategy, RawRecord};
use crate::fetch::{absolute_url, Document, FetchRequest, Fetcher};
use crate::normalize::{PriceField, RetailerSchema, SaleRule};
use crate::pagination::{offset_for_page, parse_page_count};
use crate::traversal::{CatalogWalker, CategoryBranch, TraversalCursor};

const DEFAULT_BASE: &str = "https://www.jumbo.com";
const TREE_PATH: &str = "/api/category-search-api/categories/tree";
const PAGE_SIZE: u32 = 24;

const SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Jumbo,
    id: None,
    name: "name",
    url: "url",
    image: "img_url",
    price: PriceField::Split {
        whole: "price_whole",
        fraction: "price_fraction",
        separator: ".",
    },
    old_price: None,
    description: Some("description"),
    sale: SaleRule::Field("sale"),
};

/// Jumbo: listings are rendered client-side, so this retailer is meant to run
/// over a [`BrowserSession`](crate::fetch::BrowserSession). The category tree
/// is a JSON endpoint; listings page by record offset.
#[derive(Debug, Clone)]
pub struct Jumbo {
    base: String,
    target: Option<TargetConfig>,
}

impl Jumbo {
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

    fn tree_url(&self) -> String {
        format!("{}{TREE_PATH}", self.base)
    }

    /// # Errors
    ///
    /// Returns the error of the tree request, or
    /// [`ScraperError::StructureNotFound`] when the tree cannot be read.
    pub async fn collect_catalog<F: Fetcher>(
        &self,
        fetcher: &F,
        delay_ms: u64,
    ) -> Result<Harvest, ScraperError> {
        let collector = Collector::new(fetcher, self).with_delay_ms(delay_ms);
        let doc = collector.fetch(&FetchRequest::get(self.tree_url())).await?;
        let tree = self.parse_tree(&doc)?;
        tracing::info!(
            retailer = %SCHEMA.retailer,
            categories = tree.len(),
            "category tree loaded"
        );

        let walker = CatalogWalker::new(collector);
        let mut cursor = TraversalCursor::from_target(self.target.as_ref());
        Ok(walker.walk_tree(&tree, &mut cursor).await)
    }

    fn parse_tree(&self, doc: &Document) -> Result<Vec<CategoryBranch>, ScraperError> {
        let not_found = || ScraperError::StructureNotFound {
            url: doc.url.clone(),
            region: "category tree",
        };
        let body = tree_json(doc).ok_or_else(not_found)?;
        let pages = body
            .pointer("/data/subpages")
            .and_then(Value::as_array)
            .ok_or_else(not_found)?;

        Ok(pages
            .iter()
            .filter_map(|page| {
                let category = self.node(page)?;
                let children = page
                    .get("subpages")
                    .and_then(Value::as_array)
                    .map(|subs| subs.iter().filter_map(|sub| self.node(sub)).collect())
                    .unwrap_or_default();
                Some(CategoryBranch { category, children })
            })
            .collect())
    }

    fn node(&self, page: &Value) -> Option<Category> {
        let title = text(page, "title")?;
        let link = text(page, "link")?;
        Some(Category::new(title, absolute_url(&self.base, &link)?))
    }
}

/// A browser wraps raw JSON responses in a `<pre>` inside an HTML page.
fn tree_json(doc: &Document) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(&doc.body) {
        return Some(value);
    }
    let html = doc.html();
    let body = select_first(html.root_element(), "body")?;
    serde_json::from_str(&body.text().collect::<String>()).ok()
}

impl CatalogExtractor for Jumbo {
    fn schema(&self) -> &RetailerSchema {
        &SCHEMA
    }

    fn locate_records(&self, doc: &Document) -> Option<Vec<Fragment>> {
        let html = doc.html();
        let cards = fragments_in(&html, "div.jum-card-grid", "article.product-container")?;
        Some(cards.into_iter().map(Fragment::Html).collect())
    }

    fn extract(&self, fragment: &Fragment) -> Result<RawRecord, ExtractionFailure> {
        let html = html_fragment(fragment)?;
        let card = html.root_element();
        let mut raw = RawRecord::new();

        put(&mut raw, "name", text_of(card, "a.title-link"));
        put(
            &mut raw,
            "url",
            attr_of(card, "a.title-link", "href").and_then(|href| absolute_url(&self.base, &href)),
        );
        put(&mut raw, "img_url", attr_of(card, "img.image", "src"));
        if let Some(subtitle) = select_first(card, "div.subtitle") {
            let parts: Vec<String> = select_all(subtitle, "a")
                .into_iter()
                .map(|a| a.text().collect::<String>().trim().to_owned())
                .filter(|part| !part.is_empty())
                .collect();
            raw.insert("description".to_owned(), parts.join(" "));
        }
        if let Some(price) = select_first(card, "div.current-price") {
            put(&mut raw, "price_whole", text_of(price, "span"));
            put(&mut raw, "price_fraction", text_of(price, "sup"));
        }
        put(&mut raw, "sale", text_of(card, "span.jum-tag.prominent"));

        Ok(raw)
    }

    fn page_strategy(&self) -> PageStrategy {
        PageStrategy::KnownBound
    }

    fn page_request(&self, listing_url: &str, page: u32) -> FetchRequest {
        let separator = if listing_url.contains('?') { '&' } else { '?' };
        FetchRequest::get(format!(
            "{listing_url}{separator}offSet={}&pageSize={PAGE_SIZE}",
            offset_for_page(page, PAGE_SIZE)
        ))
    }

    fn page_bound(&self, doc: &Document) -> Option<u32> {
        let html = doc.html();
        let grid = select_first(html.root_element(), "div.pages-grid")?;
        text_of(grid, "span.page-text").and_then(|t| parse_page_count(&t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    const TREE: &str = r#"{"data": {"subpages": [
        {"title": "Zuivel", "link": "/producten/zuivel", "subpages": [
            {"title": "Melk", "link": "/producten/zuivel/melk"},
            {"title": "Kaas", "link": "/producten/zuivel/kaas"}
        ]},
        {"title": "Brood", "link": "/producten/brood"}
    ]}}"#;

    const LISTING: &str = r#"
        <div class="pages-grid"><span class="page-text">3</span></div>
        <div class="jum-card-grid">
          <article class="product-container">
            <a class="title-link" href="/producten/melk-123">Halfvolle melk</a>
            <img class="image" src="https://static.jumbo.com/melk.png">
            <div class="subtitle"><a>1 L</a> <a>Houdbaar</a></div>
            <div class="current-price"><span>1</span><sup>09</sup></div>
            <span class="jum-tag prominent">2e halve prijs</span>
          </article>
        </div>"#;

    fn jumbo() -> Jumbo {
        Jumbo::new(None, None)
    }

    #[test]
    fn tree_from_raw_json() {
        let doc = Document::new("https://www.jumbo.com/api/tree", TREE);
        let tree = jumbo().parse_tree(&doc).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[1].link, "https://www.jumbo.com/producten/zuivel/kaas");
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn tree_from_rendered_json_page() {
        let rendered = format!("<html><head></head><body><pre>{TREE}</pre></body></html>");
        let doc = Document::new("https://www.jumbo.com/api/tree", rendered);
        assert_eq!(jumbo().parse_tree(&doc).unwrap().len(), 2);
    }

    #[test]
    fn unreadable_tree_is_structure_not_found() {
        let doc = Document::new("https://www.jumbo.com/api/tree", "<html>blocked</html>");
        assert!(matches!(
            jumbo().parse_tree(&doc),
            Err(ScraperError::StructureNotFound { region: "category tree", .. })
        ));
    }

    #[test]
    fn pages_map_to_offsets_of_24() {
        let site = jumbo();
        assert_eq!(
            site.page_request("https://www.jumbo.com/producten/zuivel/melk", 1).url,
            "https://www.jumbo.com/producten/zuivel/melk?offSet=0&pageSize=24"
        );
        assert_eq!(
            site.page_request("https://www.jumbo.com/producten/zuivel/melk", 3).url,
            "https://www.jumbo.com/producten/zuivel/melk?offSet=48&pageSize=24"
        );
        // Every page is built from the listing URL, never from the previous page.
        assert_eq!(
            site.page_request("https://www.jumbo.com/x?f=1", 2).url,
            "https://www.jumbo.com/x?f=1&offSet=24&pageSize=24"
        );
    }

    #[test]
    fn listing_bound_and_card() {
        let site = jumbo();
        let doc = Document::new("https://www.jumbo.com/producten/zuivel/melk", LISTING);
        assert_eq!(site.page_bound(&doc), Some(3));

        let fragments = site.locate_records(&doc).unwrap();
        let product = normalize(&site.extract(&fragments[0]).unwrap(), &SCHEMA).unwrap();
        assert_eq!(product.name, "Halfvolle melk");
        assert_eq!(product.url, "https://www.jumbo.com/producten/melk-123");
        assert_eq!(product.price, "1.09");
        assert_eq!(product.old_price, "1.09");
        assert_eq!(product.description.as_deref(), Some("1 L Houdbaar"));
        assert_eq!(product.sale.as_deref(), Some("2e halve prijs"));
    }
}
