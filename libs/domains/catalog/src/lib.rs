//! Catalog Domain
//!
//! Products and categories behind one repository contract, with two
//! interchangeable backends and a metrics engine that reuses the search
//! filter.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────┐
//! │           Catalog           │  ← wiring selected by CatalogConfig
//! └──────┬───────────────┬──────┘
//!        │               │
//! ┌──────▼──────┐ ┌──────▼──────┐
//! │  Services   │ │   Metrics   │  ← validation / aggregation
//! └──────┬──────┘ └──────┬──────┘
//!        │               │
//! ┌──────▼───────────────▼──────┐
//! │     Repository<E> trait     │  ← get/search/count/create/update/delete/scan
//! └──────┬───────────────┬──────┘
//!        │               │
//! ┌──────▼──────┐ ┌──────▼──────┐
//! │  In-memory  │ │   MongoDB   │
//! └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_catalog::{Catalog, CreateProduct, ListParams, ProductFilter};
//! use rust_decimal::Decimal;
//!
//! # async fn example() -> Result<(), domain_catalog::CatalogError> {
//! let catalog = Catalog::in_memory();
//!
//! catalog
//!     .products
//!     .create(CreateProduct {
//!         name: "Widget".to_string(),
//!         category: "Tools".to_string(),
//!         price: Decimal::new(1050, 2),
//!         quantity: 4,
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let params = ListParams::default().sort("price", "desc");
//! let page = catalog.products.list(ProductFilter::default(), &params).await?;
//! let overview = catalog.metrics.overview().await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod memory;
pub mod metrics;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use self::catalog::Catalog;
pub use self::clock::{Clock, SystemClock};
pub use self::config::{CatalogConfig, StorageBackend};
pub use self::entity::CatalogEntity;
pub use self::error::{CatalogError, CatalogResult, FieldError, ValidationErrors};
pub use self::ids::{IdGenerator, ObjectIdGenerator, UuidIdGenerator};
pub use self::memory::InMemoryRepository;
pub use self::metrics::{group_by_category, stock_value, CategoryStats, MetricsService, Overview};
pub use self::models::{
    Category, CreateCategory, CreateProduct, Product, UpdateCategory, UpdateProduct,
};
pub use self::mongodb::{MongoEntity, MongoRepository};
pub use self::query::{
    CategoryFilter, ListParams, Page, PageRequest, ProductFilter, Query, Sort, SortDirection,
    SortField,
};
pub use self::repository::{Repository, StockAggregates};
pub use self::service::{CatalogService, CategoryService, ProductService};
