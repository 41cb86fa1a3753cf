use core_config::{env_or_default, env_parse, ConfigError, FromEnv};
use database::mongodb::MongoConfig;
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::metrics::DEFAULT_LOW_STOCK_THRESHOLD;

/// Which repository implementation backs the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

/// Catalog configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub backend: StorageBackend,
    /// Present when `backend` is `Mongodb`
    pub mongo: Option<MongoConfig>,
    pub low_stock_threshold: i32,
}

impl CatalogConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            mongo: None,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    pub fn mongodb(mongo: MongoConfig) -> Self {
        Self {
            backend: StorageBackend::Mongodb,
            mongo: Some(mongo),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    pub fn with_low_stock_threshold(mut self, threshold: i32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl FromEnv for CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_backend = env_or_default("CATALOG_STORAGE", "memory");
        let backend =
            StorageBackend::from_str(raw_backend.trim()).map_err(|e| ConfigError::ParseError {
                key: "CATALOG_STORAGE".to_string(),
                details: format!("{} (expected 'memory' or 'mongodb')", e),
            })?;

        let mongo = match backend {
            StorageBackend::Mongodb => Some(MongoConfig::from_env()?),
            StorageBackend::Memory => None,
        };

        Ok(Self {
            backend,
            mongo,
            low_stock_threshold: env_parse(
                "CATALOG_LOW_STOCK_THRESHOLD",
                DEFAULT_LOW_STOCK_THRESHOLD,
            )?,
        })
    }
}
