pub mod app_config;
pub mod config;
pub mod products;
pub mod retailers;

pub use app_config::{AppConfig, Environment, OutputFormat};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{Category, Product};
pub use retailers::{
    load_retailers, Capability, CategorySeed, RetailerConfig, RetailerId, RetailersFile,
    TargetConfig,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read retailers file {path}: {source}")]
    RetailersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse retailers file: {0}")]
    RetailersFileParse(#[from] serde_yaml::Error),

    #[error("invalid retailers configuration: {0}")]
    Validation(String),
}
