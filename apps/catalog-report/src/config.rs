use core_config::{FromEnv, env_parse};
use domain_catalog::CatalogConfig;

pub use core_config::Environment;

/// Report binary configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub environment: Environment,
    /// Load a small sample catalog before reporting (`CATALOG_SEED_DEMO`)
    pub seed_demo: bool,
    /// Row limit for the low-stock section (`REPORT_LOW_STOCK_TAKE`)
    pub low_stock_take: i64,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let catalog = CatalogConfig::from_env()?;

        Ok(Self {
            catalog,
            environment,
            seed_demo: env_parse("CATALOG_SEED_DEMO", false)?,
            low_stock_take: env_parse("REPORT_LOW_STOCK_TAKE", 10)?,
        })
    }
}
