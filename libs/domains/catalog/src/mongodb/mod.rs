//! MongoDB backend.
//!
//! Search and count translate the normalized query into a native filter, a
//! `{ <sortKey>: ±1, seq: 1 }` sort and skip/limit. Insertion order comes from
//! a `counters` collection incremented atomically per entity collection.

mod decimal;
mod documents;

pub use decimal::{from_decimal128, to_decimal128};
pub use documents::{
    category_totals_pipeline, category_totals_row, CategoryDocument, ProductDocument, SEQ_FIELD,
};

use async_trait::async_trait;
use database::mongodb::{ensure_indexes, IndexReport};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::clock::{Clock, SystemClock};
use crate::entity::CatalogEntity;
use crate::error::{CatalogError, CatalogResult};
use crate::ids::{IdGenerator, ObjectIdGenerator};
use crate::metrics::CategoryStats;
use crate::models::Product;
use crate::query::{Query, SortField};
use crate::repository::{Repository, StockAggregates};

/// Collection shared by every entity kind for sequence allocation
pub const COUNTERS_COLLECTION: &str = "counters";

const DUPLICATE_KEY: i32 = 11000;

/// Mapping between an entity and its stored document
pub trait MongoEntity: CatalogEntity {
    type Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static;

    const COLLECTION: &'static str;

    fn indexes() -> Vec<IndexModel>;

    fn to_document(&self, seq: i64) -> CatalogResult<Self::Document>;

    fn from_document(document: Self::Document) -> CatalogResult<Self>;

    /// Native form of the search predicate
    fn filter_document(filter: &Self::Filter) -> CatalogResult<Document>;

    /// `$set` body for an update
    fn set_document(update: &Self::Update) -> CatalogResult<Document>;

    fn sort_key(field: SortField) -> &'static str;
}

/// Whether a driver error is a unique index violation
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// MongoDB implementation of the Repository trait
pub struct MongoRepository<E: MongoEntity> {
    collection: Collection<E::Document>,
    counters: Collection<Document>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<E: MongoEntity> MongoRepository<E> {
    /// Create a repository with ObjectId ids and the system clock
    pub fn new(db: &Database) -> Self {
        Self::with_collaborators(db, Arc::new(ObjectIdGenerator), Arc::new(SystemClock))
    }

    pub fn with_collaborators(
        db: &Database,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collection: db.collection::<E::Document>(E::COLLECTION),
            counters: db.collection::<Document>(COUNTERS_COLLECTION),
            ids,
            clock,
        }
    }

    /// Create a repository and ensure its indexes
    pub async fn connect(db: &Database) -> CatalogResult<Self> {
        let repository = Self::new(db);
        repository.init_indexes().await?;
        Ok(repository)
    }

    /// Ensure indexes; existing or conflicting definitions are kept
    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    pub async fn init_indexes(&self) -> CatalogResult<IndexReport> {
        let report = ensure_indexes(&self.collection, E::indexes()).await?;
        info!(
            ensured = report.ensured.len(),
            already_satisfied = report.already_satisfied.len(),
            "Indexes initialized"
        );
        Ok(report)
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<E::Document> {
        &self.collection
    }

    async fn next_seq(&self) -> CatalogResult<i64> {
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": E::COLLECTION },
                doc! { "$inc": { "seq": 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| CatalogError::Database("sequence counter was not returned".to_string()))?;

        counter
            .get_i64(SEQ_FIELD)
            .map_err(|err| CatalogError::Serialization(err.to_string()))
    }

    async fn find_all(&self, filter: Document, options: FindOptions) -> CatalogResult<Vec<E>> {
        let cursor = self.collection.find(filter).with_options(options).await?;
        let documents: Vec<E::Document> = cursor.try_collect().await?;
        documents.into_iter().map(E::from_document).collect()
    }
}

#[async_trait]
impl<E: MongoEntity> Repository<E> for MongoRepository<E> {
    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn get_by_id(&self, id: &str) -> CatalogResult<Option<E>> {
        let document = self.collection.find_one(doc! { "_id": id }).await?;
        document.map(E::from_document).transpose()
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn search(&self, query: &Query<E::Filter>) -> CatalogResult<Vec<E>> {
        let direction = if query.sort.is_descending() { -1 } else { 1 };
        let mut sort = Document::new();
        sort.insert(E::sort_key(query.sort.field), direction);
        sort.insert(SEQ_FIELD, 1);

        let limit = i64::try_from(query.page.page_size()).unwrap_or(i64::MAX);
        let options = FindOptions::builder()
            .sort(sort)
            .skip(query.page.skip())
            .limit(limit)
            .build();

        self.find_all(E::filter_document(&query.filter)?, options).await
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn count(&self, filter: &E::Filter) -> CatalogResult<u64> {
        let count = self
            .collection
            .count_documents(E::filter_document(filter)?)
            .await?;
        Ok(count)
    }

    #[instrument(skip(self, input), fields(kind = E::KIND))]
    async fn create(&self, input: E::Create) -> CatalogResult<E> {
        let entity = E::build(input, self.ids.as_ref(), self.clock.as_ref());
        let seq = self.next_seq().await?;

        match self.collection.insert_one(entity.to_document(seq)?).await {
            Ok(_) => {
                info!(id = %entity.id(), seq, "Entity created");
                Ok(entity)
            }
            Err(err) if is_duplicate_key(&err) => Err(CatalogError::Conflict(entity.id().to_string())),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self, input), fields(kind = E::KIND))]
    async fn update(&self, id: &str, input: E::Update) -> CatalogResult<bool> {
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": E::set_document(&input)? })
            .await?;

        let found = result.matched_count > 0;
        if found {
            info!(id, "Entity updated");
        }
        Ok(found)
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn delete(&self, id: &str) -> CatalogResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;

        let removed = result.deleted_count > 0;
        if removed {
            info!(id, "Entity deleted");
        }
        Ok(removed)
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn scan(&self, filter: &E::Filter) -> CatalogResult<Vec<E>> {
        let options = FindOptions::builder().sort(doc! { "seq": 1 }).build();
        self.find_all(E::filter_document(filter)?, options).await
    }
}

#[async_trait]
impl StockAggregates for MongoRepository<Product> {
    #[instrument(skip(self), fields(collection = Product::COLLECTION))]
    async fn category_totals(&self) -> CatalogResult<Vec<CategoryStats>> {
        let cursor = self.collection.aggregate(category_totals_pipeline()).await?;
        let rows: Vec<Document> = cursor.try_collect().await?;
        rows.iter().map(category_totals_row).collect()
    }
}
