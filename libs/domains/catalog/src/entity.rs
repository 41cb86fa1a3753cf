use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt::Debug;
use validator::Validate;

use crate::clock::{to_millis, Clock};
use crate::ids::IdGenerator;
use crate::models::{Category, CreateCategory, CreateProduct, Product, UpdateCategory, UpdateProduct};
use crate::query::{
    contains_ignore_case, CategoryFilter, ListParams, ProductFilter, Query, QueryFilter, SortField,
};

/// Behavior every catalog entity shares, independent of the storage backend
pub trait CatalogEntity: Clone + Debug + Send + Sync + 'static {
    type Create: Validate + Debug + Send + Sync;
    type Update: Validate + Clone + Debug + Send + Sync;
    type Filter: QueryFilter + Default + Clone + Debug + Send + Sync;

    /// Human-readable entity name used in logs
    const KIND: &'static str;

    /// Sort keys this entity supports; anything else resolves to `name`
    const SORT_FIELDS: &'static [SortField];

    /// Materialize a new entity, assigning id and timestamp when absent
    fn build(input: Self::Create, ids: &dyn IdGenerator, clock: &dyn Clock) -> Self;

    fn id(&self) -> &str;

    fn apply_update(&mut self, update: Self::Update);

    /// In-memory form of the search predicate
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Compare on one sort key, ascending
    fn compare_by(&self, other: &Self, field: SortField) -> Ordering;

    /// Build a normalized query against this entity's sort keys
    fn query(filter: Self::Filter, params: &ListParams) -> Query<Self::Filter> {
        Query::new(filter, params, Self::SORT_FIELDS)
    }
}

/// Resolve caller-supplied identity, falling back to the collaborators
fn assign_identity(
    id: Option<String>,
    created_at_utc: Option<DateTime<Utc>>,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
) -> (String, DateTime<Utc>) {
    let id = id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| ids.next_id());
    let created_at_utc = to_millis(created_at_utc.unwrap_or_else(|| clock.now()));
    (id, created_at_utc)
}

fn name_or_description(name: &str, description: Option<&str>, needle: &str) -> bool {
    contains_ignore_case(name, needle)
        || description.is_some_and(|description| contains_ignore_case(description, needle))
}

impl CatalogEntity for Product {
    type Create = CreateProduct;
    type Update = UpdateProduct;
    type Filter = ProductFilter;

    const KIND: &'static str = "product";

    const SORT_FIELDS: &'static [SortField] = &[
        SortField::Name,
        SortField::Category,
        SortField::Price,
        SortField::Quantity,
        SortField::CreatedAtUtc,
    ];

    fn build(mut input: CreateProduct, ids: &dyn IdGenerator, clock: &dyn Clock) -> Self {
        let (id, created_at_utc) =
            assign_identity(input.id.take(), input.created_at_utc.take(), ids, clock);
        Product::from_create(input, id, created_at_utc)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_update(&mut self, update: UpdateProduct) {
        Product::apply_update(self, update)
    }

    fn matches(&self, filter: &ProductFilter) -> bool {
        if let Some(ref needle) = filter.name {
            if !name_or_description(&self.name, self.description.as_deref(), needle) {
                return false;
            }
        }
        if let Some(ref category) = filter.category {
            if !contains_ignore_case(&self.category, category) {
                return false;
            }
        }
        if filter.min_price.is_some_and(|min| self.price < min) {
            return false;
        }
        if filter.max_price.is_some_and(|max| self.price > max) {
            return false;
        }
        if filter.quantity_below.is_some_and(|below| self.quantity >= below) {
            return false;
        }
        true
    }

    fn compare_by(&self, other: &Self, field: SortField) -> Ordering {
        match field {
            SortField::Name => self.name.cmp(&other.name),
            SortField::Category => self.category.cmp(&other.category),
            SortField::Price => self.price.cmp(&other.price),
            SortField::Quantity => self.quantity.cmp(&other.quantity),
            SortField::CreatedAtUtc => self.created_at_utc.cmp(&other.created_at_utc),
        }
    }
}

impl CatalogEntity for Category {
    type Create = CreateCategory;
    type Update = UpdateCategory;
    type Filter = CategoryFilter;

    const KIND: &'static str = "category";

    const SORT_FIELDS: &'static [SortField] = &[SortField::Name, SortField::CreatedAtUtc];

    fn build(mut input: CreateCategory, ids: &dyn IdGenerator, clock: &dyn Clock) -> Self {
        let (id, created_at_utc) =
            assign_identity(input.id.take(), input.created_at_utc.take(), ids, clock);
        Category::from_create(input, id, created_at_utc)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_update(&mut self, update: UpdateCategory) {
        Category::apply_update(self, update)
    }

    fn matches(&self, filter: &CategoryFilter) -> bool {
        filter.name.as_deref().map_or(true, |needle| {
            name_or_description(&self.name, self.description.as_deref(), needle)
        })
    }

    fn compare_by(&self, other: &Self, field: SortField) -> Ordering {
        match field {
            SortField::CreatedAtUtc => self.created_at_utc.cmp(&other.created_at_utc),
            _ => self.name.cmp(&other.name),
        }
    }
}
