use core_config::tracing::{init_tracing, install_color_eyre};
use domain_catalog::Catalog;
use tracing::info;

mod config;
mod report;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let catalog = Catalog::from_config(&config.catalog).await?;
    info!(backend = %catalog.backend(), "Catalog connected");

    if config.seed_demo {
        report::seed_demo(&catalog).await?;
    }

    let report = report::build(&catalog, config.low_stock_take).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
