//! `grocer collect`: traverse the enabled retailers and export the result.
//!
//! Per-retailer failures are reported in the summary rather than aborting
//! the run; only configuration and export errors end the command.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Args;
use grocer_core::{AppConfig, OutputFormat, RetailerConfig, RetailerId, TargetConfig};
use grocer_scraper::{
    CollectSettings, HttpFetcher, ProductCollection, RetailerOutcome, Site, WebDriverSettings,
};

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct CollectArgs {
    /// Restrict the run to these retailers (repeatable)
    #[arg(long = "retailer", value_name = "ID")]
    pub retailers: Vec<RetailerId>,

    /// Output format, overriding GROCER_OUTPUT_FORMAT
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Output file, overriding GROCER_OUTPUT_PATH
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Start traversal at this category
    #[arg(long)]
    pub category: Option<String>,

    /// Start traversal at this subcategory
    #[arg(long)]
    pub subcategory: Option<String>,

    /// Collect only the target instead of resuming from it
    #[arg(long)]
    pub pin: bool,
}

impl CollectArgs {
    fn target(&self) -> anyhow::Result<Option<TargetConfig>> {
        if self.category.is_none() && self.subcategory.is_none() {
            if self.pin {
                anyhow::bail!("--pin needs --category or --subcategory");
            }
            return Ok(None);
        }
        Ok(Some(TargetConfig {
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            pin: self.pin,
        }))
    }

    fn filter(&self) -> Option<HashSet<RetailerId>> {
        (!self.retailers.is_empty()).then(|| self.retailers.iter().copied().collect())
    }
}

/// The enabled retailers in file order, with the command-line target applied
/// to every retailer the run will touch.
pub(crate) fn configure(
    retailers: &[RetailerConfig],
    args: &CollectArgs,
) -> anyhow::Result<Vec<RetailerConfig>> {
    let target = args.target()?;
    let filter = args.filter();

    if let Some(wanted) = &filter {
        for id in wanted {
            if !retailers.iter().any(|r| r.id == *id && r.enabled) {
                tracing::warn!(
                    retailer = %id,
                    "requested retailer is not enabled in the retailers file"
                );
            }
        }
    }

    Ok(retailers
        .iter()
        .filter(|r| r.enabled)
        .map(|retailer| {
            let mut retailer = retailer.clone();
            let selected = filter.as_ref().is_none_or(|w| w.contains(&retailer.id));
            if let (Some(target), true) = (&target, selected) {
                retailer.target = Some(target.clone());
            }
            retailer
        })
        .collect())
}

pub(crate) fn settings_from(config: &AppConfig) -> CollectSettings {
    CollectSettings {
        inter_request_delay_ms: config.scraper_inter_request_delay_ms,
        max_concurrent_retailers: config.scraper_max_concurrent_retailers,
        webdriver: config.webdriver_url.as_ref().map(|url| WebDriverSettings {
            url: url.clone(),
            timeout_secs: config.scraper_request_timeout_secs,
        }),
    }
}

pub(crate) fn summary_lines(collection: &ProductCollection) -> Vec<String> {
    let mut lines: Vec<String> = collection
        .reports
        .iter()
        .map(|report| match &report.outcome {
            RetailerOutcome::Collected {
                products,
                dropped,
                failed,
            } if failed.is_empty() => {
                format!(
                    "{:<10} {products} products, {dropped} dropped",
                    report.retailer.as_str()
                )
            }
            RetailerOutcome::Collected {
                products,
                dropped,
                failed,
            } => {
                let failed: Vec<String> = failed.iter().map(ToString::to_string).collect();
                format!(
                    "{:<10} {products} products, {dropped} dropped, failed: {}",
                    report.retailer.as_str(),
                    failed.join(", ")
                )
            }
            RetailerOutcome::Unreachable { reason } => {
                format!("{:<10} unreachable: {reason}", report.retailer.as_str())
            }
            RetailerOutcome::Failed { reason } => {
                format!("{:<10} failed: {reason}", report.retailer.as_str())
            }
        })
        .collect();
    let discounted = collection
        .products
        .iter()
        .filter(|p| p.is_discounted())
        .count();
    lines.push(format!(
        "total      {} products, {discounted} discounted",
        collection.products.len()
    ));
    lines
}

pub(crate) async fn run_collect(config: &AppConfig, args: &CollectArgs) -> anyhow::Result<()> {
    let retailers = grocer_core::load_retailers(&config.retailers_path)?;
    let sites: Vec<Site> = configure(&retailers.retailers, args)?
        .iter()
        .map(Site::from_config)
        .collect();
    if sites.is_empty() {
        anyhow::bail!(
            "no enabled retailers in {}",
            config.retailers_path.display()
        );
    }

    let fetcher = HttpFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build HTTP fetcher: {e}"))?;
    let settings = settings_from(config);
    if settings.webdriver.is_none() {
        tracing::info!("GROCER_WEBDRIVER_URL not set; rendered retailers will fail");
    }

    let filter = args.filter();
    let collection = grocer_scraper::run(&sites, &fetcher, &settings, filter.as_ref()).await;

    let format = args.format.unwrap_or(config.output_format);
    let output = args.output.as_ref().unwrap_or(&config.output_path);
    grocer_export::save(output, format, &collection.products)?;

    for line in summary_lines(&collection) {
        println!("{line}");
    }
    println!("written to {} ({format})", output.display());
    Ok(())
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
