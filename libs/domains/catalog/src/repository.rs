use async_trait::async_trait;

use crate::entity::CatalogEntity;
use crate::error::CatalogResult;
use crate::metrics::CategoryStats;
use crate::models::Product;
use crate::query::Query;

/// Repository trait for catalog persistence
///
/// Both backends implement the same semantics. Absence is never an error:
/// lookups return `None` and mutations on a missing id return `false`.
/// `Err` is reserved for infrastructure failures and duplicate ids.
#[async_trait]
pub trait Repository<E: CatalogEntity>: Send + Sync {
    /// Get an entity by ID
    async fn get_by_id(&self, id: &str) -> CatalogResult<Option<E>>;

    /// One page of matching entities in resolved sort order, ties by insertion order
    async fn search(&self, query: &Query<E::Filter>) -> CatalogResult<Vec<E>>;

    /// Number of entities matching the filter, ignoring paging and sort
    async fn count(&self, filter: &E::Filter) -> CatalogResult<u64>;

    /// Persist a new entity; fails with `Conflict` if the id is taken
    async fn create(&self, input: E::Create) -> CatalogResult<E>;

    /// Replace all mutable fields; `false` if the id does not exist
    async fn update(&self, id: &str, input: E::Update) -> CatalogResult<bool>;

    /// `true` iff an entity existed and was removed
    async fn delete(&self, id: &str) -> CatalogResult<bool>;

    /// Every matching entity in insertion order, unpaged
    async fn scan(&self, filter: &E::Filter) -> CatalogResult<Vec<E>>;
}

/// Grouped stock figures a backend computes without handing back every product
#[async_trait]
pub trait StockAggregates: Repository<Product> {
    /// One row per stored category: product count and summed `price * quantity`,
    /// in no particular order
    async fn category_totals(&self) -> CatalogResult<Vec<CategoryStats>>;
}
