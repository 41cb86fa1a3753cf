//! Aggregation engine for dashboard metrics.
//!
//! Counts and low-stock lists go through the repository's `count`/`search`
//! with a [`ProductFilter`], so low-stock means exactly what a search with
//! `quantityBelow` returns. Stock values come from
//! [`StockAggregates::category_totals`] and are summed as exact decimals.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{CatalogError, CatalogResult};
use crate::models::Product;
use crate::query::{PageRequest, ProductFilter, Query, Sort, SortDirection, SortField};
use crate::repository::{Repository, StockAggregates};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;
pub const DEFAULT_LOW_STOCK_TAKE: i64 = 10;
pub const MAX_LOW_STOCK_TAKE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_products: u64,
    pub total_stock_value: Decimal,
    pub low_stock_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    /// Raw stored label; uncategorized products group under ""
    pub category: String,
    pub count: u64,
    pub stock_value: Decimal,
}

/// Sum of `price * quantity`, failing instead of wrapping
pub fn stock_value<'a>(products: impl IntoIterator<Item = &'a Product>) -> CatalogResult<Decimal> {
    products.into_iter().try_fold(Decimal::ZERO, |total, product| {
        product
            .stock_value()
            .and_then(|value| total.checked_add(value))
            .ok_or(CatalogError::Overflow)
    })
}

/// Per-category count and stock value, ordered by category
pub fn group_by_category(products: &[Product]) -> CatalogResult<Vec<CategoryStats>> {
    let mut groups: BTreeMap<&str, Vec<&Product>> = BTreeMap::new();
    for product in products {
        groups.entry(product.category.as_str()).or_default().push(product);
    }

    groups
        .into_iter()
        .map(|(category, members)| -> CatalogResult<CategoryStats> {
            Ok(CategoryStats {
                category: category.to_string(),
                count: members.len() as u64,
                stock_value: stock_value(members)?,
            })
        })
        .collect()
}

/// Metrics over the product collection
pub struct MetricsService<R: StockAggregates + ?Sized> {
    repository: Arc<R>,
    low_stock_threshold: i32,
}

impl<R: StockAggregates + ?Sized> Clone for MetricsService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            low_stock_threshold: self.low_stock_threshold,
        }
    }
}

impl<R: StockAggregates + ?Sized> MetricsService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_threshold(repository, DEFAULT_LOW_STOCK_THRESHOLD)
    }

    pub fn with_threshold(repository: Arc<R>, low_stock_threshold: i32) -> Self {
        Self {
            repository,
            low_stock_threshold,
        }
    }

    pub fn low_stock_threshold(&self) -> i32 {
        self.low_stock_threshold
    }

    #[instrument(skip(self))]
    pub async fn overview(&self) -> CatalogResult<Overview> {
        let total_products = self.repository.count(&ProductFilter::default()).await?;
        let total_stock_value = self
            .repository
            .category_totals()
            .await?
            .iter()
            .try_fold(Decimal::ZERO, |total, stats| total.checked_add(stats.stock_value))
            .ok_or(CatalogError::Overflow)?;
        let low_stock_count = self
            .repository
            .count(&ProductFilter::default().quantity_below(self.low_stock_threshold))
            .await?;

        Ok(Overview {
            total_products,
            total_stock_value,
            low_stock_count,
        })
    }

    /// Per-category counts and stock values, largest groups first
    #[instrument(skip(self))]
    pub async fn by_category(&self) -> CatalogResult<Vec<CategoryStats>> {
        let mut stats = self.repository.category_totals().await?;
        stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        Ok(stats)
    }

    /// Products below `threshold`, lowest quantity first
    ///
    /// `threshold` defaults to the configured one. `take` defaults to 10 when
    /// missing or not positive and is capped at 100.
    #[instrument(skip(self))]
    pub async fn low_stock(
        &self,
        threshold: Option<i32>,
        take: Option<i64>,
    ) -> CatalogResult<Vec<Product>> {
        let threshold = threshold.unwrap_or(self.low_stock_threshold);
        let take = take
            .filter(|take| *take >= 1)
            .unwrap_or(DEFAULT_LOW_STOCK_TAKE)
            .min(MAX_LOW_STOCK_TAKE);

        let query = Query {
            filter: ProductFilter::default().quantity_below(threshold),
            sort: Sort::new(SortField::Quantity, SortDirection::Asc),
            page: PageRequest::new(Some(1), Some(take)),
        };
        self.repository.search(&query).await
    }
}
