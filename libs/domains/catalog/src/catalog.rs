use database::mongodb::{check_health_detailed, open_database, Database, HealthStatus};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::{CatalogConfig, StorageBackend};
use crate::error::{CatalogError, CatalogResult};
use crate::memory::InMemoryRepository;
use crate::metrics::{MetricsService, DEFAULT_LOW_STOCK_THRESHOLD};
use crate::models::{Category, Product};
use crate::mongodb::MongoRepository;
use crate::repository::{Repository, StockAggregates};
use crate::service::{CategoryService, ProductService};

enum Storage {
    Memory,
    Mongo(Database),
}

/// Fully wired catalog: both CRUD services and the metrics service over one backend
///
/// Stores are created once here and shared through `Arc`; cloning the
/// services is cheap and every clone sees the same data.
pub struct Catalog {
    pub products: ProductService,
    pub categories: CategoryService,
    pub metrics: MetricsService<dyn StockAggregates>,
    storage: Storage,
}

impl Catalog {
    /// Fresh in-memory catalog with the default low-stock threshold
    pub fn in_memory() -> Self {
        Self::in_memory_with_threshold(DEFAULT_LOW_STOCK_THRESHOLD)
    }

    pub fn in_memory_with_threshold(low_stock_threshold: i32) -> Self {
        let products = Arc::new(InMemoryRepository::<Product>::new());
        Self::assemble(
            products.clone(),
            products,
            Arc::new(InMemoryRepository::<Category>::new()),
            low_stock_threshold,
            Storage::Memory,
        )
    }

    /// MongoDB-backed catalog; ensures indexes before returning
    #[instrument(skip(db), fields(database = %db.name()))]
    pub async fn with_mongo(db: &Database, low_stock_threshold: i32) -> CatalogResult<Self> {
        let products = Arc::new(MongoRepository::<Product>::connect(db).await?);
        let categories = MongoRepository::<Category>::connect(db).await?;

        Ok(Self::assemble(
            products.clone(),
            products,
            Arc::new(categories),
            low_stock_threshold,
            Storage::Mongo(db.clone()),
        ))
    }

    /// Build the catalog selected by configuration
    #[instrument(skip(config), fields(backend = %config.backend))]
    pub async fn from_config(config: &CatalogConfig) -> CatalogResult<Self> {
        let catalog = match config.backend {
            StorageBackend::Memory => Self::in_memory_with_threshold(config.low_stock_threshold),
            StorageBackend::Mongodb => {
                let mongo = config.mongo.as_ref().ok_or_else(|| {
                    CatalogError::Configuration(
                        "mongodb backend selected without a MongoDB configuration".to_string(),
                    )
                })?;
                let db = open_database(mongo).await?;
                Self::with_mongo(&db, config.low_stock_threshold).await?
            }
        };

        info!("Catalog ready");
        Ok(catalog)
    }

    pub fn backend(&self) -> StorageBackend {
        match self.storage {
            Storage::Memory => StorageBackend::Memory,
            Storage::Mongo(_) => StorageBackend::Mongodb,
        }
    }

    /// Health of the configured backend; the in-memory store is always healthy
    pub async fn health(&self) -> HealthStatus {
        match self.storage {
            Storage::Memory => HealthStatus {
                healthy: true,
                message: None,
                response_time_ms: 0,
            },
            Storage::Mongo(ref db) => check_health_detailed(db.client()).await,
        }
    }

    fn assemble(
        products: Arc<dyn Repository<Product>>,
        stock: Arc<dyn StockAggregates>,
        categories: Arc<dyn Repository<Category>>,
        low_stock_threshold: i32,
        storage: Storage,
    ) -> Self {
        Self {
            products: ProductService::new(products),
            categories: CategoryService::new(categories),
            metrics: MetricsService::with_threshold(stock, low_stock_threshold),
            storage,
        }
    }
}
