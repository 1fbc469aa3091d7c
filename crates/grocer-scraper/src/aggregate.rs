//! Runs every selected retailer and merges their products into one
//! collection.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use grocer_core::{Capability, Product, RetailerId};

use crate::fetch::{ensure_reachable, Fetcher};
use crate::normalize::merge;
use crate::retailers::{CollectSettings, Site};

/// How one retailer's part of the run went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetailerOutcome {
    Collected {
        products: usize,
        dropped: usize,
        /// Capabilities that failed while others succeeded.
        failed: Vec<Capability>,
    },
    /// The reachability check failed; nothing was attempted.
    Unreachable { reason: String },
    /// Every declared capability failed.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetailerReport {
    pub retailer: RetailerId,
    pub outcome: RetailerOutcome,
}

/// All products of a run, in retailer order, plus one report per retailer.
#[derive(Debug, Clone, Default)]
pub struct ProductCollection {
    pub products: Vec<Product>,
    pub reports: Vec<RetailerReport>,
}

/// Collects from `sites`, restricted to `filter` when one is given.
///
/// An unreachable retailer is excluded and the others proceed. Up to
/// `settings.max_concurrent_retailers` retailers run at once; products are
/// merged in the order of `sites` regardless.
pub async fn run<F: Fetcher>(
    sites: &[Site],
    fetcher: &F,
    settings: &CollectSettings,
    filter: Option<&HashSet<RetailerId>>,
) -> ProductCollection {
    let selected: Vec<&Site> = sites
        .iter()
        .filter(|site| filter.is_none_or(|wanted| wanted.contains(&site.id())))
        .collect();
    tracing::info!(retailers = selected.len(), "starting collection run");

    let results: Vec<(Vec<Product>, RetailerReport)> = stream::iter(
        selected
            .into_iter()
            .map(|site| collect_site(site, fetcher, settings)),
    )
    .buffered(settings.max_concurrent_retailers.max(1))
    .collect()
    .await;

    let (streams, reports): (Vec<_>, Vec<_>) = results.into_iter().unzip();
    let products = merge(streams);
    tracing::info!(products = products.len(), "collection run complete");
    ProductCollection { products, reports }
}

async fn collect_site<F: Fetcher>(
    site: &Site,
    fetcher: &F,
    settings: &CollectSettings,
) -> (Vec<Product>, RetailerReport) {
    let retailer = site.id();
    let home = site.home_url();
    tracing::info!(%retailer, url = %home, "checking reachability");

    if let Err(e) = ensure_reachable(fetcher, &home).await {
        tracing::error!(%retailer, error = %e, "retailer unreachable, excluded from run");
        return (
            Vec::new(),
            RetailerReport {
                retailer,
                outcome: RetailerOutcome::Unreachable {
                    reason: e.to_string(),
                },
            },
        );
    }

    let mut products = Vec::new();
    let mut dropped = 0;
    let mut failed = Vec::new();
    let mut last_error = None;

    for &capability in site.capabilities() {
        match site.collect(capability, fetcher, settings).await {
            Ok(harvest) => {
                tracing::info!(
                    %retailer,
                    %capability,
                    products = harvest.products.len(),
                    dropped = harvest.dropped,
                    pages = harvest.pages,
                    "capability complete"
                );
                products.extend(harvest.products);
                dropped += harvest.dropped;
            }
            Err(e) => {
                tracing::error!(%retailer, %capability, error = %e, "capability failed");
                failed.push(capability);
                last_error = Some(e.to_string());
            }
        }
    }

    let outcome = match last_error {
        Some(reason) if failed.len() == site.capabilities().len() => {
            RetailerOutcome::Failed { reason }
        }
        _ => RetailerOutcome::Collected {
            products: products.len(),
            dropped,
            failed,
        },
    };
    (products, RetailerReport { retailer, outcome })
}
