use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Every retailer the collector knows how to traverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetailerId {
    Aldi,
    Deka,
    Dirk,
    Hoogvliet,
    Jumbo,
    Poiesz,
    Vomar,
}

impl RetailerId {
    pub const ALL: [RetailerId; 7] = [
        RetailerId::Aldi,
        RetailerId::Deka,
        RetailerId::Dirk,
        RetailerId::Hoogvliet,
        RetailerId::Jumbo,
        RetailerId::Poiesz,
        RetailerId::Vomar,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RetailerId::Aldi => "aldi",
            RetailerId::Deka => "deka",
            RetailerId::Dirk => "dirk",
            RetailerId::Hoogvliet => "hoogvliet",
            RetailerId::Jumbo => "jumbo",
            RetailerId::Poiesz => "poiesz",
            RetailerId::Vomar => "vomar",
        }
    }
}

impl std::fmt::Display for RetailerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetailerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RetailerId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| format!("unknown retailer \"{s}\""))
    }
}

/// Collection operations a retailer can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Full catalog traversal.
    Basic,
    /// A dedicated page listing discounted products.
    DiscountListing,
    /// A promotions feed where one offer may cover several products.
    OfferListing,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Basic => write!(f, "basic"),
            Capability::DiscountListing => write!(f, "discount-listing"),
            Capability::OfferListing => write!(f, "offer-listing"),
        }
    }
}

/// Where a traversal should jump to, from `retailers.yaml` or the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Keep filtering after the first match, limiting the run to the target.
    #[serde(default)]
    pub pin: bool,
}

/// A statically configured category for retailers whose tree cannot be
/// discovered online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerConfig {
    pub id: RetailerId,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Overrides the retailer's production host (used for mirrors and tests).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub target: Option<TargetConfig>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

impl RetailerConfig {
    /// A default-enabled entry with no overrides.
    #[must_use]
    pub fn new(id: RetailerId) -> Self {
        Self {
            id,
            enabled: true,
            base_url: None,
            target: None,
            categories: Vec::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RetailersFile {
    pub retailers: Vec<RetailerConfig>,
}

impl RetailersFile {
    /// Enabled retailers in file order.
    pub fn enabled(&self) -> impl Iterator<Item = &RetailerConfig> {
        self.retailers.iter().filter(|r| r.enabled)
    }
}

/// Load and validate the retailers configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_retailers(path: &Path) -> Result<RetailersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RetailersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let retailers_file: RetailersFile = serde_yaml::from_str(&content)?;

    validate_retailers(&retailers_file)?;

    Ok(retailers_file)
}

fn validate_retailers(retailers_file: &RetailersFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for retailer in &retailers_file.retailers {
        if !seen.insert(retailer.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate retailer id: '{}'",
                retailer.id
            )));
        }

        if let Some(target) = &retailer.target {
            if target.pin && target.category.is_none() && target.subcategory.is_none() {
                return Err(ConfigError::Validation(format!(
                    "retailer '{}' pins a target without naming a category or subcategory",
                    retailer.id
                )));
            }
        }

        for seed in &retailer.categories {
            if seed.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "retailer '{}' has a static category with an empty name",
                    retailer.id
                )));
            }
            if seed.subcategories.iter().any(|s| s.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "retailer '{}' category '{}' has an empty subcategory name",
                    retailer.id, seed.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "retailers_test.rs"]
mod tests;
