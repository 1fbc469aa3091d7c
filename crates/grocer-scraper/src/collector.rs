//! Fetch → locate → extract → normalize over listing pages and item pages.
//!
//! Failures are isolated as narrowly as possible: a malformed record is
//! dropped without touching its siblings, a failed item page drops only that
//! item, and a failed page in a multi-page listing loses only that page.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use grocer_core::Product;

use crate::error::ScraperError;
use crate::extract::{CatalogExtractor, Fragment, ListingMode, PageStrategy};
use crate::fetch::{Document, FetchRequest, Fetcher};
use crate::normalize::normalize;
use crate::pagination::{
    known_bound_targets, PageObservation, SentinelPager, Step, MAX_PAGES,
};

/// Outcome of one listing page.
#[derive(Debug, Clone, Default)]
pub struct PageHarvest {
    pub products: Vec<Product>,
    /// Records located but not turned into products.
    pub dropped: usize,
    /// Record fragments located on the page.
    pub fragments: usize,
    /// `false` when the page had no record container at all.
    pub container_found: bool,
    /// Content hash of the located fragments.
    pub fingerprint: u64,
}

/// Accumulated outcome of a listing, a category or a whole retailer.
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub products: Vec<Product>,
    pub dropped: usize,
    pub pages: usize,
}

impl Harvest {
    pub fn absorb(&mut self, other: Harvest) {
        self.products.extend(other.products);
        self.dropped += other.dropped;
        self.pages += other.pages;
    }

    fn absorb_page(&mut self, page: PageHarvest) {
        self.products.extend(page.products);
        self.dropped += page.dropped;
        self.pages += 1;
    }
}

fn fingerprint(fragments: &[Fragment]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for fragment in fragments {
        fragment.fingerprint_text().hash(&mut hasher);
    }
    hasher.finish()
}

pub struct Collector<'a, F, E> {
    fetcher: &'a F,
    extractor: &'a E,
    delay: Duration,
}

impl<'a, F: Fetcher, E: CatalogExtractor> Collector<'a, F, E> {
    pub fn new(fetcher: &'a F, extractor: &'a E) -> Self {
        Self {
            fetcher,
            extractor,
            delay: Duration::ZERO,
        }
    }

    /// Pause before every request, to stay polite with retailer hosts.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn extractor(&self) -> &'a E {
        self.extractor
    }

    pub(crate) async fn fetch(&self, request: &FetchRequest) -> Result<Document, ScraperError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.fetcher.fetch(request).await
    }

    /// Fetches one listing page and harvests its records.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; a page without a record container is an
    /// empty harvest, not an error.
    pub async fn collect(&self, request: &FetchRequest) -> Result<PageHarvest, ScraperError> {
        let doc = self.fetch(request).await?;
        Ok(self.harvest_document(&doc).await)
    }

    /// Harvests records from an already fetched listing document.
    pub async fn harvest_document(&self, doc: &Document) -> PageHarvest {
        let retailer = self.extractor.schema().retailer;
        let Some(fragments) = self.extractor.locate_records(doc) else {
            tracing::debug!(%retailer, url = %doc.url, "no record container on page");
            return PageHarvest::default();
        };

        let mut harvest = PageHarvest {
            fragments: fragments.len(),
            container_found: true,
            fingerprint: fingerprint(&fragments),
            ..PageHarvest::default()
        };

        match self.extractor.listing_mode() {
            ListingMode::Inline => {
                let schema = self.extractor.schema();
                for fragment in &fragments {
                    match self
                        .extractor
                        .extract(fragment)
                        .and_then(|raw| normalize(&raw, schema))
                    {
                        Ok(product) => harvest.products.push(product),
                        Err(e) => {
                            harvest.dropped += 1;
                            tracing::debug!(
                                %retailer,
                                url = %doc.url,
                                error = %e,
                                "record dropped"
                            );
                        }
                    }
                }
            }
            ListingMode::DetailPages => {
                let links: Vec<String> = fragments
                    .iter()
                    .filter_map(|fragment| self.extractor.item_link(fragment))
                    .collect();
                let unlinked = fragments.len() - links.len();
                if unlinked > 0 {
                    tracing::debug!(
                        %retailer,
                        url = %doc.url,
                        unlinked,
                        "records without item link dropped"
                    );
                }
                let items = self.collect_items(&links).await;
                harvest.products = items.products;
                harvest.dropped = unlinked + items.dropped;
            }
        }

        harvest
    }

    /// Fetches each item page and extracts one product from it.
    ///
    /// An item that cannot be fetched or lacks a required field is dropped.
    pub async fn collect_items(&self, urls: &[String]) -> Harvest {
        let retailer = self.extractor.schema().retailer;
        let schema = self.extractor.schema();
        let mut harvest = Harvest::default();

        for url in urls {
            let doc = match self.fetch(&FetchRequest::get(url.as_str())).await {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(%retailer, url = %url, error = %e, "item page fetch failed");
                    harvest.dropped += 1;
                    continue;
                }
            };
            match self
                .extractor
                .extract_detail(&doc)
                .and_then(|raw| normalize(&raw, schema))
            {
                Ok(product) => {
                    tracing::debug!(%retailer, name = %product.name, "item collected");
                    harvest.products.push(product);
                }
                Err(e) => {
                    harvest.dropped += 1;
                    tracing::debug!(%retailer, url = %url, error = %e, "item dropped");
                }
            }
        }

        harvest
    }

    /// Collects every page of a listing according to the extractor's
    /// [`PageStrategy`].
    ///
    /// # Errors
    ///
    /// Returns the fetch error of the first request (the single page, or the
    /// page-count probe). Failures on later pages are logged and skipped.
    pub async fn collect_listing(&self, listing_url: &str) -> Result<Harvest, ScraperError> {
        match self.extractor.page_strategy() {
            PageStrategy::Single => {
                let page = self
                    .collect(&self.extractor.page_request(listing_url, 1))
                    .await?;
                let mut harvest = Harvest::default();
                harvest.absorb_page(page);
                Ok(harvest)
            }
            PageStrategy::KnownBound => self.collect_known_bound(listing_url).await,
            PageStrategy::Sentinel => Ok(self.collect_until_empty(listing_url).await),
        }
    }

    async fn collect_known_bound(&self, listing_url: &str) -> Result<Harvest, ScraperError> {
        let retailer = self.extractor.schema().retailer;
        let bound_request = self.extractor.bound_request(listing_url);
        let probe = self.fetch(&bound_request).await?;

        let mut bound = self.extractor.page_bound(&probe).unwrap_or_else(|| {
            tracing::debug!(
                %retailer,
                url = %listing_url,
                "no page count indicator, reading one page"
            );
            1
        });
        if bound > MAX_PAGES {
            let limit = ScraperError::PaginationLimit {
                url: listing_url.to_owned(),
                max_pages: MAX_PAGES,
            };
            tracing::warn!(%retailer, declared = bound, error = %limit, "truncating listing");
            bound = MAX_PAGES;
        }
        tracing::debug!(%retailer, url = %listing_url, pages = bound, "listing page count");

        let mut harvest = Harvest::default();
        let mut probe = Some(probe);
        let targets = known_bound_targets(bound, |page| {
            self.extractor.page_request(listing_url, page)
        });

        for (index, request) in targets.enumerate() {
            let page = index + 1;
            // Page 1 is often the probe itself; reuse it instead of fetching twice.
            let result = match probe.take().filter(|_| request == bound_request) {
                Some(doc) => Ok(self.harvest_document(&doc).await),
                None => self.collect(&request).await,
            };
            match result {
                Ok(page_harvest) => harvest.absorb_page(page_harvest),
                Err(e) => {
                    tracing::warn!(
                        %retailer,
                        url = %request.url,
                        page,
                        error = %e,
                        "page fetch failed, skipping"
                    );
                }
            }
        }

        Ok(harvest)
    }

    async fn collect_until_empty(&self, listing_url: &str) -> Harvest {
        let retailer = self.extractor.schema().retailer;
        let mut pager = SentinelPager::new(listing_url, MAX_PAGES);
        let mut harvest = Harvest::default();

        loop {
            let page = match pager.next_page() {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(%retailer, error = %e, "abandoning remaining pages");
                    break;
                }
            };
            let request = self.extractor.page_request(listing_url, page);

            let (observation, accepted) = match self.collect(&request).await {
                Ok(page_harvest) if !page_harvest.container_found => {
                    (PageObservation::Failed, None)
                }
                Ok(page_harvest) if page_harvest.fragments == 0 => (PageObservation::Empty, None),
                Ok(page_harvest) => (
                    PageObservation::Records {
                        fingerprint: page_harvest.fingerprint,
                    },
                    Some(page_harvest),
                ),
                Err(e) => {
                    tracing::warn!(
                        %retailer,
                        url = %request.url,
                        page,
                        error = %e,
                        "page fetch failed"
                    );
                    (PageObservation::Failed, None)
                }
            };

            match pager.observe(observation) {
                Step::Accept => {
                    if let Some(page_harvest) = accepted {
                        harvest.absorb_page(page_harvest);
                    }
                }
                Step::Skip => {
                    tracing::debug!(%retailer, page, "page made no progress");
                }
                Step::Done => {
                    tracing::debug!(%retailer, page, "empty page, listing exhausted");
                    break;
                }
                Step::Stalled(e) => {
                    tracing::warn!(%retailer, error = %e, "remaining pages abandoned");
                    break;
                }
            }
        }

        harvest
    }
}
