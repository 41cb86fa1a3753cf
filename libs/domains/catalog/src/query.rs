//! Query model: filter, sort and page request.
//!
//! Raw caller input is normalized here and never rejected. Out-of-range
//! paging is clamped, unknown sort keys fall back to `name`, and inverted
//! price bounds are swapped.

use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Raw paging and sort parameters as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_dir: Option<String>,
}

impl ListParams {
    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort(mut self, sort_by: impl Into<String>, sort_dir: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_dir = Some(sort_dir.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInt {
    Int(i64),
    Text(String),
    #[allow(dead_code)]
    Other(IgnoredAny),
}

/// Accept integers or numeric strings; anything else reads as absent
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawInt>::deserialize(deserializer)? {
        Some(RawInt::Int(value)) => Some(value),
        Some(RawInt::Text(text)) => text.trim().parse().ok(),
        Some(RawInt::Other(_)) | None => None,
    })
}

/// Normalized page request; `page >= 1`, `1 <= page_size <= 100`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = match page {
            Some(page) if page >= 1 => page as u64,
            _ => 1,
        };
        let page_size = match page_size {
            Some(size) if size >= 1 => (size as u64).min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, page_size }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of matching entities to skip, capped at `i64::MAX` so every
    /// backend can encode it
    pub fn skip(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Field a search may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum SortField {
    Name,
    Category,
    Price,
    Quantity,
    CreatedAtUtc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Resolved sort order; ties always fall back to insertion order ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Match raw sort parameters against the fields an entity supports.
    ///
    /// Unknown, unsupported or empty fields resolve to `name`; unknown
    /// directions resolve to ascending.
    pub fn resolve(sort_by: Option<&str>, sort_dir: Option<&str>, allowed: &[SortField]) -> Self {
        let field = sort_by
            .and_then(|raw| SortField::from_str(raw.trim()).ok())
            .filter(|field| allowed.contains(field))
            .unwrap_or(SortField::Name);
        let direction = sort_dir
            .and_then(|raw| SortDirection::from_str(raw.trim()).ok())
            .unwrap_or_default();
        Self { field, direction }
    }

    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Desc
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new(SortField::Name, SortDirection::Asc)
    }
}

/// Filter normalization shared by both entity filters
pub trait QueryFilter {
    /// Blank text becomes absent and numeric bounds are made consistent
    fn normalize(self) -> Self;
}

/// Product search filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Case-insensitive substring of name or description
    #[serde(default)]
    pub name: Option<String>,
    /// Case-insensitive substring of the category label
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    /// Matches `quantity < quantity_below`
    #[serde(default)]
    pub quantity_below: Option<i32>,
}

impl ProductFilter {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn price_between(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn quantity_below(mut self, threshold: i32) -> Self {
        self.quantity_below = Some(threshold);
        self
    }
}

impl QueryFilter for ProductFilter {
    fn normalize(self) -> Self {
        let clamp = |bound: Option<Decimal>| bound.map(|value| value.max(Decimal::ZERO));
        let (mut min_price, mut max_price) = (clamp(self.min_price), clamp(self.max_price));
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                (min_price, max_price) = (Some(max), Some(min));
            }
        }

        Self {
            name: non_blank(self.name),
            category: non_blank(self.category),
            min_price,
            max_price,
            quantity_below: self.quantity_below,
        }
    }
}

/// Category search filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFilter {
    /// Case-insensitive substring of name or description
    #[serde(default)]
    pub name: Option<String>,
}

impl CategoryFilter {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl QueryFilter for CategoryFilter {
    fn normalize(self) -> Self {
        Self {
            name: non_blank(self.name),
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Case-insensitive substring test used by the in-memory predicate
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A normalized search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<F> {
    pub filter: F,
    pub sort: Sort,
    pub page: PageRequest,
}

impl<F: QueryFilter> Query<F> {
    /// Build from raw input, resolving sort keys against `allowed`
    pub fn new(filter: F, params: &ListParams, allowed: &[SortField]) -> Self {
        Self {
            filter: filter.normalize(),
            sort: Sort::resolve(params.sort_by.as_deref(), params.sort_dir.as_deref(), allowed),
            page: PageRequest::new(params.page, params.page_size),
        }
    }
}

/// One page of search results plus the unpaged total
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            page_size: request.page_size(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[SortField] = &[
        SortField::Name,
        SortField::Category,
        SortField::Price,
        SortField::Quantity,
        SortField::CreatedAtUtc,
    ];

    #[test]
    fn test_page_request_defaults_and_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, page_size: 20 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, page_size: 20 });
        assert_eq!(PageRequest::new(Some(-4), Some(-1)), PageRequest { page: 1, page_size: 20 });
        assert_eq!(PageRequest::new(Some(3), Some(500)), PageRequest { page: 3, page_size: 100 });
        assert_eq!(PageRequest::new(Some(2), Some(1)).page_size(), 1);
    }

    #[test]
    fn test_skip() {
        assert_eq!(PageRequest::new(Some(1), Some(20)).skip(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(25)).skip(), 50);
        let far = PageRequest::new(Some(i64::MAX), Some(100));
        assert_eq!(far.skip(), i64::MAX as u64);
        assert!(i64::try_from(far.skip()).is_ok());
    }

    #[test]
    fn test_sort_resolution_is_case_insensitive() {
        let sort = Sort::resolve(Some("CREATEDATUTC"), Some("DeSc"), ALL);
        assert_eq!(sort, Sort::new(SortField::CreatedAtUtc, SortDirection::Desc));

        let sort = Sort::resolve(Some("price"), Some("asc"), ALL);
        assert_eq!(sort, Sort::new(SortField::Price, SortDirection::Asc));
    }

    #[test]
    fn test_bogus_sort_falls_back_to_name_asc() {
        assert_eq!(Sort::resolve(Some("bogus"), Some("XYZ"), ALL), Sort::default());
        assert_eq!(Sort::resolve(Some(""), None, ALL), Sort::default());
        assert_eq!(Sort::resolve(None, None, ALL), Sort::default());
    }

    #[test]
    fn test_unsupported_sort_field_falls_back_to_name() {
        let allowed = &[SortField::Name, SortField::CreatedAtUtc];
        let sort = Sort::resolve(Some("price"), Some("desc"), allowed);
        assert_eq!(sort, Sort::new(SortField::Name, SortDirection::Desc));
    }

    #[test]
    fn test_list_params_accept_numbers_and_strings() {
        let params: ListParams =
            serde_json::from_str(r#"{"page":"2","pageSize":50,"sortBy":"price"}"#).unwrap();
        assert_eq!(params.page, Some(2));
        assert_eq!(params.page_size, Some(50));
        assert_eq!(params.sort_by.as_deref(), Some("price"));
    }

    #[test]
    fn test_list_params_ignore_garbage() {
        let params: ListParams =
            serde_json::from_str(r#"{"page":"abc","pageSize":true,"sortDir":null}"#).unwrap();
        assert_eq!(params.page, None);
        assert_eq!(params.page_size, None);
        assert_eq!(params.sort_dir, None);
    }

    #[test]
    fn test_product_filter_normalization() {
        let filter = ProductFilter {
            name: Some("   ".to_string()),
            category: Some(" tools ".to_string()),
            min_price: Some(Decimal::from(50)),
            max_price: Some(Decimal::from(-3)),
            quantity_below: Some(5),
        }
        .normalize();

        assert_eq!(filter.name, None);
        assert_eq!(filter.category.as_deref(), Some("tools"));
        assert_eq!(filter.min_price, Some(Decimal::ZERO));
        assert_eq!(filter.max_price, Some(Decimal::from(50)));
        assert_eq!(filter.quantity_below, Some(5));
    }

    #[test]
    fn test_query_new_normalizes_everything() {
        let params = ListParams::default().page(0).page_size(1000).sort("Quantity", "DESC");
        let query = Query::new(CategoryFilter::default().name(""), &params, ALL);

        assert_eq!(query.filter.name, None);
        assert_eq!(query.page.page(), 1);
        assert_eq!(query.page.page_size(), 100);
        assert_eq!(query.sort, Sort::new(SortField::Quantity, SortDirection::Desc));
    }

    #[test]
    fn test_total_pages() {
        let request = PageRequest::new(Some(1), Some(20));
        assert_eq!(Page::<u8>::new(vec![], 0, request).total_pages(), 0);
        assert_eq!(Page::<u8>::new(vec![], 20, request).total_pages(), 1);
        assert_eq!(Page::<u8>::new(vec![], 41, request).total_pages(), 3);
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Blue Widget", "wIdG"));
        assert!(!contains_ignore_case("Gadget", "widget"));
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page::new(vec![1, 2], 2, PageRequest::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 20);
        assert_eq!(json["total"], 2);
    }
}
