//! `grocer retailers`: what the retailers file configures.

use grocer_core::{AppConfig, RetailerConfig};
use grocer_scraper::capabilities_of;

pub(crate) fn describe(retailer: &RetailerConfig) -> String {
    let capabilities: Vec<String> = capabilities_of(retailer.id)
        .iter()
        .map(ToString::to_string)
        .collect();
    let state = if retailer.enabled { "enabled" } else { "disabled" };
    let mut line = format!(
        "{:<10} {:<9} {}",
        retailer.id.as_str(),
        state,
        capabilities.join(", ")
    );
    if let Some(base) = &retailer.base_url {
        line.push_str(&format!("  (base {base})"));
    }
    line
}

pub(crate) fn run_list_retailers(config: &AppConfig) -> anyhow::Result<()> {
    let file = grocer_core::load_retailers(&config.retailers_path)?;
    for retailer in &file.retailers {
        println!("{}", describe(retailer));
    }
    Ok(())
}
