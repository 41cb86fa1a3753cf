//! In-memory backend over a sharded concurrent map.
//!
//! Every mutation completes inside one synchronous section with no await
//! point, so dropping the future either leaves the map untouched or fully
//! applies the change. Reads work over a snapshot of matching entries.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::clock::{Clock, SystemClock};
use crate::entity::CatalogEntity;
use crate::error::{CatalogError, CatalogResult};
use crate::ids::{IdGenerator, UuidIdGenerator};
use crate::metrics::{group_by_category, CategoryStats};
use crate::models::Product;
use crate::query::{ProductFilter, Query, Sort};
use crate::repository::{Repository, StockAggregates};

#[derive(Debug, Clone)]
struct Stored<E> {
    /// Insertion order, used as the final tie-break
    seq: u64,
    entity: E,
}

/// Concurrent in-memory store for one entity kind
pub struct InMemoryRepository<E: CatalogEntity> {
    entries: DashMap<String, Stored<E>>,
    sequence: AtomicU64,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<E: CatalogEntity> InMemoryRepository<E> {
    /// Empty store with UUIDv7 ids and the system clock
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(UuidIdGenerator), Arc::new(SystemClock))
    }

    pub fn with_collaborators(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            sequence: AtomicU64::new(0),
            ids,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matching(&self, filter: &E::Filter) -> Vec<(u64, E)> {
        self.entries
            .iter()
            .filter(|entry| entry.entity.matches(filter))
            .map(|entry| (entry.seq, entry.entity.clone()))
            .collect()
    }
}

impl<E: CatalogEntity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_snapshot<E: CatalogEntity>(items: &mut [(u64, E)], sort: Sort) {
    items.sort_by(|(a_seq, a), (b_seq, b)| {
        let primary = a.compare_by(b, sort.field);
        let primary = if sort.is_descending() {
            primary.reverse()
        } else {
            primary
        };
        primary.then(a_seq.cmp(b_seq))
    });
}

#[async_trait]
impl<E: CatalogEntity> Repository<E> for InMemoryRepository<E> {
    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn get_by_id(&self, id: &str) -> CatalogResult<Option<E>> {
        Ok(self.entries.get(id).map(|entry| entry.entity.clone()))
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn search(&self, query: &Query<E::Filter>) -> CatalogResult<Vec<E>> {
        let mut items = self.matching(&query.filter);
        sort_snapshot(&mut items, query.sort);

        let skip = usize::try_from(query.page.skip()).unwrap_or(usize::MAX);
        let take = usize::try_from(query.page.page_size()).unwrap_or(usize::MAX);

        Ok(items
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(_, entity)| entity)
            .collect())
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn count(&self, filter: &E::Filter) -> CatalogResult<u64> {
        let count = self
            .entries
            .iter()
            .filter(|entry| entry.entity.matches(filter))
            .count();
        Ok(count as u64)
    }

    #[instrument(skip(self, input), fields(kind = E::KIND))]
    async fn create(&self, input: E::Create) -> CatalogResult<E> {
        let entity = E::build(input, self.ids.as_ref(), self.clock.as_ref());

        match self.entries.entry(entity.id().to_string()) {
            Entry::Occupied(_) => Err(CatalogError::Conflict(entity.id().to_string())),
            Entry::Vacant(slot) => {
                let seq = self.sequence.fetch_add(1, AtomicOrdering::SeqCst);
                slot.insert(Stored {
                    seq,
                    entity: entity.clone(),
                });
                info!(id = %entity.id(), "Entity created");
                Ok(entity)
            }
        }
    }

    #[instrument(skip(self, input), fields(kind = E::KIND))]
    async fn update(&self, id: &str, input: E::Update) -> CatalogResult<bool> {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                entry.entity.apply_update(input);
                info!(id, "Entity updated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn delete(&self, id: &str) -> CatalogResult<bool> {
        let removed = self.entries.remove(id).is_some();
        if removed {
            info!(id, "Entity deleted");
        }
        Ok(removed)
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn scan(&self, filter: &E::Filter) -> CatalogResult<Vec<E>> {
        let mut items = self.matching(filter);
        items.sort_by_key(|(seq, _)| *seq);
        Ok(items.into_iter().map(|(_, entity)| entity).collect())
    }
}

#[async_trait]
impl StockAggregates for InMemoryRepository<Product> {
    #[instrument(skip(self), fields(kind = Product::KIND))]
    async fn category_totals(&self) -> CatalogResult<Vec<CategoryStats>> {
        let products = self.scan(&ProductFilter::default()).await?;
        group_by_category(&products)
    }
}
