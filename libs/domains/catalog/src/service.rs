//! CRUD service - validation in front of a repository

use std::marker::PhantomData;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::entity::CatalogEntity;
use crate::error::CatalogResult;
use crate::models::{Category, Product};
use crate::query::{ListParams, Page};
use crate::repository::Repository;

/// Catalog service providing the caller-facing operations for one entity kind
///
/// Input records are validated before they reach the repository, so a
/// rejected payload never mutates storage.
pub struct CatalogService<E: CatalogEntity, R: Repository<E> + ?Sized> {
    repository: Arc<R>,
    _entity: PhantomData<fn() -> E>,
}

pub type ProductService = CatalogService<Product, dyn Repository<Product>>;
pub type CategoryService = CatalogService<Category, dyn Repository<Category>>;

impl<E: CatalogEntity, R: Repository<E> + ?Sized> Clone for CatalogService<E, R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            _entity: PhantomData,
        }
    }
}

impl<E: CatalogEntity, R: Repository<E> + ?Sized> CatalogService<E, R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            _entity: PhantomData,
        }
    }

    /// Get the underlying repository
    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    pub async fn get(&self, id: &str) -> CatalogResult<Option<E>> {
        self.repository.get_by_id(id).await
    }

    /// Normalize raw parameters, then fetch one page and the unpaged total
    #[instrument(skip(self), fields(kind = E::KIND))]
    pub async fn list(&self, filter: E::Filter, params: &ListParams) -> CatalogResult<Page<E>> {
        let query = E::query(filter, params);
        let items = self.repository.search(&query).await?;
        let total = self.repository.count(&query.filter).await?;
        Ok(Page::new(items, total, query.page))
    }

    #[instrument(skip(self, input), fields(kind = E::KIND))]
    pub async fn create(&self, input: E::Create) -> CatalogResult<E> {
        input.validate()?;
        self.repository.create(input).await
    }

    #[instrument(skip(self, input), fields(kind = E::KIND))]
    pub async fn update(&self, id: &str, input: E::Update) -> CatalogResult<bool> {
        input.validate()?;
        self.repository.update(id, input).await
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    pub async fn delete(&self, id: &str) -> CatalogResult<bool> {
        self.repository.delete(id).await
    }
}
