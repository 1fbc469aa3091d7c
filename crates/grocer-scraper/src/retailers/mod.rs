//! Retailer extractors and capability dispatch.
//!
//! Every retailer declares which [`Capability`]s it offers. The aggregator
//! asks a [`Site`] to run each of them in turn; asking for an undeclared
//! capability is an error rather than a silent no-op.

mod aldi;
mod deka;
mod dirk;
mod hoogvliet;
mod jumbo;
mod poiesz;
mod vomar;

pub use aldi::Aldi;
pub use deka::Deka;
pub use dirk::Dirk;
pub use hoogvliet::Hoogvliet;
pub use jumbo::Jumbo;
pub use poiesz::Poiesz;
pub use vomar::Vomar;

use grocer_core::{Capability, RetailerConfig, RetailerId};

use crate::collector::Harvest;
use crate::error::ScraperError;
use crate::fetch::{with_browser_session, Fetcher, WebDriverSettings};

/// Run-wide knobs passed down to every retailer.
#[derive(Debug, Clone)]
pub struct CollectSettings {
    pub inter_request_delay_ms: u64,
    /// Retailers traversed at the same time. `1` is fully sequential.
    pub max_concurrent_retailers: usize,
    /// Required by retailers whose catalog only exists in rendered pages.
    pub webdriver: Option<WebDriverSettings>,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            inter_request_delay_ms: 0,
            max_concurrent_retailers: 1,
            webdriver: None,
        }
    }
}

/// A configured retailer, tagged by what it can collect.
#[derive(Debug, Clone)]
pub enum Site {
    Aldi(Aldi),
    Deka(Deka),
    Dirk(Dirk),
    Hoogvliet(Hoogvliet),
    Jumbo(Jumbo),
    Poiesz(Poiesz),
    Vomar(Vomar),
}

impl Site {
    #[must_use]
    pub fn from_config(config: &RetailerConfig) -> Self {
        let base = config.base_url.as_deref();
        let target = config.target.clone();
        match config.id {
            RetailerId::Aldi => Site::Aldi(Aldi::new(base, target)),
            RetailerId::Deka => Site::Deka(Deka::new(base)),
            RetailerId::Dirk => Site::Dirk(Dirk::new(base, target)),
            RetailerId::Hoogvliet => Site::Hoogvliet(Hoogvliet::new(base)),
            RetailerId::Jumbo => Site::Jumbo(Jumbo::new(base, target)),
            RetailerId::Poiesz => Site::Poiesz(Poiesz::new(base, target, &config.categories)),
            RetailerId::Vomar => Site::Vomar(Vomar::new(base, target)),
        }
    }

    #[must_use]
    pub fn id(&self) -> RetailerId {
        match self {
            Site::Aldi(_) => RetailerId::Aldi,
            Site::Deka(_) => RetailerId::Deka,
            Site::Dirk(_) => RetailerId::Dirk,
            Site::Hoogvliet(_) => RetailerId::Hoogvliet,
            Site::Jumbo(_) => RetailerId::Jumbo,
            Site::Poiesz(_) => RetailerId::Poiesz,
            Site::Vomar(_) => RetailerId::Vomar,
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> &'static [Capability] {
        capabilities_of(self.id())
    }

    /// Main endpoint used for the reachability check.
    #[must_use]
    pub fn home_url(&self) -> String {
        match self {
            Site::Aldi(s) => s.home_url(),
            Site::Deka(s) => s.home_url(),
            Site::Dirk(s) => s.home_url(),
            Site::Hoogvliet(s) => s.home_url(),
            Site::Jumbo(s) => s.home_url(),
            Site::Poiesz(s) => s.home_url(),
            Site::Vomar(s) => s.home_url(),
        }
    }

    /// Runs one capability.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::UnsupportedCapability`] when the retailer does
    /// not declare `capability`, [`ScraperError::Browser`] when a rendered
    /// retailer has no WebDriver endpoint, or the error of the first request.
    pub async fn collect<F: Fetcher>(
        &self,
        capability: Capability,
        fetcher: &F,
        settings: &CollectSettings,
    ) -> Result<Harvest, ScraperError> {
        let delay = settings.inter_request_delay_ms;
        match (self, capability) {
            (Site::Aldi(s), Capability::Basic) => s.collect_catalog(fetcher, delay).await,
            (Site::Deka(s), Capability::DiscountListing) => {
                s.collect_discounts(fetcher, delay).await
            }
            (Site::Dirk(s), Capability::Basic) => s.collect_catalog(fetcher, delay).await,
            (Site::Hoogvliet(s), Capability::Basic) => s.collect_catalog(fetcher, delay).await,
            (Site::Jumbo(s), Capability::Basic) => {
                let webdriver = settings
                    .webdriver
                    .as_ref()
                    .ok_or_else(|| ScraperError::Browser {
                        operation: "open",
                        reason: "no WebDriver endpoint configured (GROCER_WEBDRIVER_URL)"
                            .to_owned(),
                    })?;
                with_browser_session(webdriver, |session| async move {
                    s.collect_catalog(&session, delay).await
                })
                .await
            }
            (Site::Poiesz(s), Capability::Basic) => s.collect_catalog(fetcher, delay).await,
            (Site::Poiesz(s), Capability::OfferListing) => s.collect_offers(fetcher, delay).await,
            (Site::Vomar(s), Capability::Basic) => s.collect_catalog(fetcher, delay).await,
            (site, capability) => Err(ScraperError::UnsupportedCapability {
                retailer: site.id(),
                capability,
            }),
        }
    }
}

/// Declared capabilities per retailer, in the order they are run.
#[must_use]
pub fn capabilities_of(id: RetailerId) -> &'static [Capability] {
    match id {
        RetailerId::Aldi
        | RetailerId::Dirk
        | RetailerId::Hoogvliet
        | RetailerId::Jumbo
        | RetailerId::Vomar => &[Capability::Basic],
        RetailerId::Deka => &[Capability::DiscountListing],
        RetailerId::Poiesz => &[Capability::Basic, Capability::OfferListing],
    }
}

/// Strips a trailing slash so paths can be appended with `format!`.
fn base_or(override_url: Option<&str>, default: &str) -> String {
    override_url
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Document, FetchRequest};

    struct NoFetch;

    impl Fetcher for NoFetch {
        async fn fetch(&self, request: &FetchRequest) -> Result<Document, ScraperError> {
            Err(ScraperError::NotFound {
                url: request.url.clone(),
            })
        }
    }

    #[test]
    fn from_config_honours_base_override() {
        let mut config = RetailerConfig::new(RetailerId::Vomar);
        config.base_url = Some("http://127.0.0.1:9999/".to_owned());
        let site = Site::from_config(&config);
        assert_eq!(site.id(), RetailerId::Vomar);
        assert_eq!(site.home_url(), "http://127.0.0.1:9999");
    }

    #[test]
    fn default_hosts_are_production() {
        let site = Site::from_config(&RetailerConfig::new(RetailerId::Aldi));
        assert_eq!(site.home_url(), "https://www.aldi.nl");
    }

    #[test]
    fn poiesz_declares_offer_listing() {
        assert_eq!(
            capabilities_of(RetailerId::Poiesz),
            [Capability::Basic, Capability::OfferListing]
        );
        assert_eq!(
            capabilities_of(RetailerId::Deka),
            [Capability::DiscountListing]
        );
    }

    #[tokio::test]
    async fn undeclared_capability_is_rejected() {
        let site = Site::from_config(&RetailerConfig::new(RetailerId::Aldi));
        let err = site
            .collect(Capability::OfferListing, &NoFetch, &CollectSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnsupportedCapability {
                retailer: RetailerId::Aldi,
                capability: Capability::OfferListing
            }
        ));
    }

    #[tokio::test]
    async fn rendered_retailer_requires_webdriver() {
        let site = Site::from_config(&RetailerConfig::new(RetailerId::Jumbo));
        let err = site
            .collect(Capability::Basic, &NoFetch, &CollectSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScraperError::Browser { operation: "open", .. }));
    }
}
