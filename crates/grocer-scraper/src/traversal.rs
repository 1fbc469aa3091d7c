//! Category tree discovery and selective descent.
//!
//! Retailer catalogs are two levels deep: categories, then subcategories.
//! The walker discovers each level, lets the [`TraversalCursor`] decide which
//! nodes to enter, and hands every selected listing to the [`Collector`].
//! A category whose subcategory region is missing is a leaf and its own
//! listing is collected instead.

use grocer_core::{Category, TargetConfig};

use crate::collector::{Collector, Harvest};
use crate::error::ScraperError;
use crate::extract::{CatalogExtractor, Level};
use crate::fetch::{FetchRequest, Fetcher};

/// Where a traversal should jump to, and whether it stays there.
///
/// A target is matched by exact, case-sensitive name. After the match an
/// unpinned target is cleared, so every later sibling is visited; a pinned
/// target (`resume_after_match`) keeps filtering on every re-entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalCursor {
    pub target_category: Option<String>,
    pub target_subcategory: Option<String>,
    pub resume_after_match: bool,
}

impl TraversalCursor {
    /// A cursor that visits everything.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_target(target: Option<&TargetConfig>) -> Self {
        target.map_or_else(Self::unrestricted, |t| Self {
            target_category: t.category.clone(),
            target_subcategory: t.subcategory.clone(),
            resume_after_match: t.pin,
        })
    }

    /// Filters one level of categories, updating the cursor as targets match.
    pub fn select_categories<'c>(&mut self, categories: &'c [Category]) -> Vec<&'c Category> {
        select(
            &mut self.target_category,
            self.resume_after_match,
            Level::Root,
            categories,
            |c| c.name.as_str(),
        )
    }

    /// Filters the subcategories of one category.
    pub fn select_subcategories<'c>(
        &mut self,
        subcategories: &'c [Category],
    ) -> Vec<&'c Category> {
        select(
            &mut self.target_subcategory,
            self.resume_after_match,
            Level::Category,
            subcategories,
            |c| c.name.as_str(),
        )
    }

    fn select_branches<'c>(
        &mut self,
        branches: &'c [CategoryBranch],
    ) -> Vec<&'c CategoryBranch> {
        select(
            &mut self.target_category,
            self.resume_after_match,
            Level::Root,
            branches,
            |b| b.category.name.as_str(),
        )
    }

    /// `true` while an unpinned target is still waiting for its match.
    #[must_use]
    pub fn has_pending_target(&self) -> bool {
        !self.resume_after_match
            && (self.target_category.is_some() || self.target_subcategory.is_some())
    }
}

fn select<'c, T>(
    target: &mut Option<String>,
    pinned: bool,
    level: Level,
    items: &'c [T],
    name_of: impl Fn(&T) -> &str,
) -> Vec<&'c T> {
    let mut selected = Vec::with_capacity(items.len());
    for item in items {
        let name = name_of(item);
        if let Some(wanted) = target.as_deref() {
            if wanted != name {
                tracing::info!(
                    level = level.as_str(),
                    wanted,
                    skipped = name,
                    "skipping toward target"
                );
                continue;
            }
            if !pinned {
                *target = None;
            }
        }
        selected.push(item);
    }
    selected
}

/// Result of probing a category for subcategories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    SubTree(Vec<Category>),
    /// No subcategory region: collect the category's own listing.
    Leaf,
}

/// A category with its subcategories, for trees that are known without
/// visiting category pages (a JSON tree endpoint, or static configuration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBranch {
    pub category: Category,
    pub children: Vec<Category>,
}

pub struct CatalogWalker<'a, F, E> {
    collector: Collector<'a, F, E>,
}

impl<'a, F: Fetcher, E: CatalogExtractor> CatalogWalker<'a, F, E> {
    pub fn new(collector: Collector<'a, F, E>) -> Self {
        Self { collector }
    }

    /// Category nodes found on the page at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::StructureNotFound`] when the page has no
    /// category region, or the fetch error. Nothing is retried here beyond
    /// the fetcher's own transport retries.
    pub async fn discover(&self, url: &str, level: Level) -> Result<Vec<Category>, ScraperError> {
        let doc = self.collector.fetch(&FetchRequest::get(url)).await?;
        self.collector
            .extractor()
            .locate_categories(&doc, level)
            .ok_or_else(|| ScraperError::StructureNotFound {
                url: url.to_owned(),
                region: "category list",
            })
    }

    /// Like [`discover`](Self::discover), with structure absence recovered
    /// as [`Discovery::Leaf`].
    ///
    /// # Errors
    ///
    /// Returns transport and status errors only.
    pub async fn probe(&self, url: &str, level: Level) -> Result<Discovery, ScraperError> {
        match self.discover(url, level).await {
            Ok(categories) if categories.is_empty() => Ok(Discovery::Leaf),
            Ok(categories) => Ok(Discovery::SubTree(categories)),
            Err(ScraperError::StructureNotFound { url, region }) => {
                tracing::debug!(
                    url = %url,
                    region,
                    level = level.as_str(),
                    "no category region, treating as leaf"
                );
                Ok(Discovery::Leaf)
            }
            Err(e) => Err(e),
        }
    }

    /// Walks the tree rooted at `root_url`.
    ///
    /// # Errors
    ///
    /// Only a failure to fetch the root is returned. A category or listing
    /// that fails is logged and skipped.
    pub async fn walk(
        &self,
        root_url: &str,
        cursor: &mut TraversalCursor,
    ) -> Result<Harvest, ScraperError> {
        let retailer = self.collector.extractor().schema().retailer;
        let categories = match self.probe(root_url, Level::Root).await? {
            Discovery::SubTree(categories) => categories,
            Discovery::Leaf => return self.collector.collect_listing(root_url).await,
        };

        let mut harvest = Harvest::default();
        for category in cursor.select_categories(&categories) {
            tracing::info!(%retailer, category = %category.name, "handling category");
            match self.probe(&category.link, Level::Category).await {
                Ok(Discovery::SubTree(subcategories)) => {
                    harvest.absorb(self.walk_listings(&subcategories, cursor).await);
                }
                Ok(Discovery::Leaf) => harvest.absorb(self.leaf(category).await),
                Err(e) => {
                    tracing::warn!(
                        %retailer,
                        category = %category.name,
                        error = %e,
                        "category skipped"
                    );
                }
            }
        }

        warn_unmatched(cursor, retailer);
        Ok(harvest)
    }

    /// Walks a tree that is already known.
    pub async fn walk_tree(
        &self,
        tree: &[CategoryBranch],
        cursor: &mut TraversalCursor,
    ) -> Harvest {
        let retailer = self.collector.extractor().schema().retailer;
        let mut harvest = Harvest::default();

        for branch in cursor.select_branches(tree) {
            tracing::info!(%retailer, category = %branch.category.name, "handling category");
            if branch.children.is_empty() {
                harvest.absorb(self.leaf(&branch.category).await);
            } else {
                harvest.absorb(self.walk_listings(&branch.children, cursor).await);
            }
        }

        warn_unmatched(cursor, retailer);
        harvest
    }

    async fn walk_listings(
        &self,
        subcategories: &[Category],
        cursor: &mut TraversalCursor,
    ) -> Harvest {
        let retailer = self.collector.extractor().schema().retailer;
        let mut harvest = Harvest::default();
        for subcategory in cursor.select_subcategories(subcategories) {
            tracing::info!(%retailer, subcategory = %subcategory.name, "handling subcategory");
            match self.collector.collect_listing(&subcategory.link).await {
                Ok(listing) => harvest.absorb(listing),
                Err(e) => {
                    tracing::warn!(
                        %retailer,
                        subcategory = %subcategory.name,
                        error = %e,
                        "subcategory skipped"
                    );
                }
            }
        }
        harvest
    }

    async fn leaf(&self, category: &Category) -> Harvest {
        let retailer = self.collector.extractor().schema().retailer;
        match self.collector.collect_listing(&category.link).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(
                    %retailer,
                    category = %category.name,
                    error = %e,
                    "category listing skipped"
                );
                Harvest::default()
            }
        }
    }
}

fn warn_unmatched(cursor: &TraversalCursor, retailer: grocer_core::RetailerId) {
    if cursor.has_pending_target() {
        tracing::warn!(
            %retailer,
            category = ?cursor.target_category,
            subcategory = ?cursor.target_subcategory,
            "traversal target never matched"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(names: &[&str]) -> Vec<Category> {
        names
            .iter()
            .map(|n| Category::new(*n, format!("https://shop.example.com/{n}")))
            .collect()
    }

    fn names<'a>(selected: &[&'a Category]) -> Vec<&'a str> {
        selected.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn no_target_visits_everything() {
        let cats = level(&["A", "B", "C"]);
        let mut cursor = TraversalCursor::unrestricted();
        assert_eq!(names(&cursor.select_categories(&cats)), ["A", "B", "C"]);
    }

    #[test]
    fn unpinned_target_skips_until_match_then_resumes() {
        let cats = level(&["A", "B", "C"]);
        let mut cursor = TraversalCursor {
            target_category: Some("B".to_owned()),
            ..TraversalCursor::default()
        };
        assert_eq!(names(&cursor.select_categories(&cats)), ["B", "C"]);
        assert!(cursor.target_category.is_none());
        // Later re-entries are unfiltered.
        assert_eq!(names(&cursor.select_categories(&cats)), ["A", "B", "C"]);
    }

    #[test]
    fn pinned_target_visits_only_match_on_every_entry() {
        let cats = level(&["A", "B", "C"]);
        let mut cursor = TraversalCursor {
            target_category: Some("B".to_owned()),
            resume_after_match: true,
            ..TraversalCursor::default()
        };
        assert_eq!(names(&cursor.select_categories(&cats)), ["B"]);
        assert_eq!(names(&cursor.select_categories(&cats)), ["B"]);
        assert_eq!(cursor.target_category.as_deref(), Some("B"));
    }

    #[test]
    fn match_is_case_sensitive() {
        let cats = level(&["Zuivel", "Brood"]);
        let mut cursor = TraversalCursor {
            target_category: Some("zuivel".to_owned()),
            ..TraversalCursor::default()
        };
        assert!(cursor.select_categories(&cats).is_empty());
        assert!(cursor.has_pending_target());
    }

    #[test]
    fn subcategory_target_clears_across_categories() {
        let first = level(&["x", "y"]);
        let second = level(&["x", "y"]);
        let mut cursor = TraversalCursor {
            target_subcategory: Some("y".to_owned()),
            ..TraversalCursor::default()
        };
        assert_eq!(names(&cursor.select_subcategories(&first)), ["y"]);
        assert_eq!(names(&cursor.select_subcategories(&second)), ["x", "y"]);
    }

    #[test]
    fn from_target_copies_pin() {
        let target = TargetConfig {
            category: Some("Zuivel".to_owned()),
            subcategory: None,
            pin: true,
        };
        let cursor = TraversalCursor::from_target(Some(&target));
        assert_eq!(cursor.target_category.as_deref(), Some("Zuivel"));
        assert!(cursor.resume_after_match);
        assert_eq!(TraversalCursor::from_target(None), TraversalCursor::unrestricted());
    }
}
