//! Inventory View CLI
//!
//! Runs one dashboard variant against an inventory service.

use std::path::PathBuf;

use clap::Parser;
use inventory_view::{load_config, Config, Variant};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "inventory-view")]
#[command(about = "Inventory dashboard view controller and poller")]
#[command(version)]
struct Args {
    /// JSON configuration file; built-in defaults are used without one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Inventory service base URL, e.g. http://localhost:8080
    #[arg(long)]
    base_url: Option<String>,

    /// Dashboard variant
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// Port of the local dashboard
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

impl Args {
    /// Command-line values win over the file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(port) = self.dashboard_port {
            config.dashboard.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!("Parsed command line arguments: {:?}", args);

    let mut config = match &args.config {
        Some(path) => {
            tracing::debug!("Loading configuration from {:?}", path);
            load_config(path)?
        }
        None => Config::default(),
    };
    args.apply_overrides(&mut config);

    tracing::info!(
        "Starting {:?} inventory view against {}",
        config.variant,
        config.base_url
    );

    inventory_view::run(config).await?;
    Ok(())
}
