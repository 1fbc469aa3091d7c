mod collect;
mod retailers;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::collect::CollectArgs;

#[derive(Debug, Parser)]
#[command(name = "grocer")]
#[command(about = "Collects product catalogs from Dutch grocery retailers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Traverse retailer catalogs and write the merged product collection
    Collect(CollectArgs),
    /// List configured retailers and what they can collect
    Retailers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = grocer_core::load_app_config()?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::debug!(env = %config.env, "configuration loaded");

    match cli.command {
        Commands::Collect(args) => collect::run_collect(&config, &args).await,
        Commands::Retailers => retailers::run_list_retailers(&config),
    }
}
