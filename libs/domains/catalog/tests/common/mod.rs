//! Behavioral checks shared by every backend.
//!
//! Each check receives a fresh, empty product repository and seeds it itself,
//! so the in-memory and MongoDB suites run exactly the same assertions.

#![allow(dead_code)]

use domain_catalog::{
    CatalogEntity, CatalogError, CreateProduct, ListParams, MetricsService, Product,
    ProductFilter, Repository, StockAggregates, UpdateProduct,
};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use test_utils::assertions::{assert_some, assert_sorted_by};
use test_utils::TestDataBuilder;

pub type ProductRepo = Arc<dyn StockAggregates>;

const NAMES: [&str; 5] = ["Alpha", "beta", "Gamma", "alpha", "Delta"];
const CATEGORIES: [&str; 4] = ["Tools", "Garden", "", "power tools"];
const PRICES: [&str; 4] = ["1.50", "10", "2.25", "10.00"];

pub fn product(name: &str, category: &str, price: &str, quantity: i32) -> CreateProduct {
    CreateProduct {
        name: name.to_string(),
        category: category.to_string(),
        price: Decimal::from_str(price).unwrap(),
        quantity,
        ..Default::default()
    }
}

/// Create `count` products with plenty of ties on every sort key.
/// Returns ids in insertion order.
pub async fn seed(repo: &ProductRepo, count: usize) -> Vec<String> {
    let builder = TestDataBuilder::new(7);
    let mut ids = Vec::with_capacity(count);

    for i in 0..count {
        let mut input = product(
            NAMES[i % NAMES.len()],
            CATEGORIES[i % CATEGORIES.len()],
            PRICES[i % PRICES.len()],
            builder.quantity(i as u64, 15),
        );
        if i % 3 == 0 {
            input.description = Some(format!("Blue steel #{}", i));
        }
        ids.push(repo.create(input).await.unwrap().id);
    }
    ids
}

async fn collect_pages(repo: &ProductRepo, filter: &ProductFilter, page_size: i64) -> Vec<Product> {
    let mut all = Vec::new();
    for page in 1.. {
        let params = ListParams::default().page(page).page_size(page_size);
        let items = repo
            .search(&Product::query(filter.clone(), &params))
            .await
            .unwrap();
        assert!(items.len() as i64 <= page_size);
        if items.is_empty() {
            break;
        }
        all.extend(items);
    }
    all
}

pub async fn paging_covers_count(repo: ProductRepo) {
    seed(&repo, 23).await;

    let filters = [
        ProductFilter::default(),
        ProductFilter::default().category("tools"),
        ProductFilter::default().name("blue"),
        ProductFilter::default().quantity_below(8),
    ];

    for filter in filters {
        let total = repo.count(&filter).await.unwrap();
        for page_size in [1, 5, 7, 20, 100] {
            let all = collect_pages(&repo, &filter, page_size).await;
            assert_eq!(all.len() as u64, total, "page size {} / {:?}", page_size, filter);

            let unique: HashSet<&str> = all.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(unique.len(), all.len(), "duplicate across pages");
        }
    }
}

pub async fn sort_respects_order_and_ties(repo: ProductRepo) {
    let ids = seed(&repo, 23).await;
    let position: HashMap<String, usize> =
        ids.into_iter().enumerate().map(|(i, id)| (id, i)).collect();

    for field in Product::SORT_FIELDS {
        for dir in ["asc", "desc"] {
            let params = ListParams::default()
                .page_size(100)
                .sort(field.to_string(), dir);
            let items = repo
                .search(&Product::query(ProductFilter::default(), &params))
                .await
                .unwrap();
            assert_eq!(items.len(), 23);

            for pair in items.windows(2) {
                let ordering = pair[0].compare_by(&pair[1], *field);
                let ordering = if dir == "desc" { ordering.reverse() } else { ordering };
                match ordering {
                    Ordering::Less => {}
                    Ordering::Equal => assert!(
                        position[&pair[0].id] < position[&pair[1].id],
                        "tie on {} {} not in insertion order",
                        field,
                        dir
                    ),
                    Ordering::Greater => panic!("{} {} out of order", field, dir),
                }
            }
        }
    }
}

/// Pages far past the end are empty rather than an error
pub async fn far_page_is_empty(repo: ProductRepo) {
    seed(&repo, 3).await;

    for page_size in [1, 20, 100] {
        let params = ListParams::default().page(i64::MAX).page_size(page_size);
        let items = repo
            .search(&Product::query(ProductFilter::default(), &params))
            .await
            .unwrap();
        assert!(items.is_empty(), "page size {}", page_size);
    }
    assert_eq!(repo.count(&ProductFilter::default()).await.unwrap(), 3);
}

pub async fn bogus_sort_matches_default(repo: ProductRepo) {
    seed(&repo, 12).await;

    let bogus = ListParams::default().page_size(100).sort("bogus", "XYZ");
    let default = ListParams::default().page_size(100).sort("name", "asc");

    let a = repo
        .search(&Product::query(ProductFilter::default(), &bogus))
        .await
        .unwrap();
    let b = repo
        .search(&Product::query(ProductFilter::default(), &default))
        .await
        .unwrap();
    assert_eq!(a, b);
}

pub async fn create_then_get_round_trips(repo: ProductRepo) {
    let mut input = product("Lamp", "Home", "19.99", 4);
    input.description = Some("Warm light".to_string());

    let created = repo.create(input.clone()).await.unwrap();
    let stored = assert_some(repo.get_by_id(&created.id).await.unwrap(), "created product");

    assert_eq!(stored, created);
    assert_eq!(stored.name, input.name);
    assert_eq!(stored.description, input.description);
    assert_eq!(stored.category, input.category);
    assert_eq!(stored.price, input.price);
    assert_eq!(stored.price.to_string(), "19.99");
    assert_eq!(stored.quantity, input.quantity);
    assert!(!stored.id.is_empty());
}

pub async fn caller_identity_is_kept(repo: ProductRepo) {
    let created_at = chrono::DateTime::parse_from_rfc3339("2023-04-05T06:07:08.123456Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let mut input = product("Kept", "Home", "1", 1);
    input.id = Some("custom-id".to_string());
    input.created_at_utc = Some(created_at);

    let created = repo.create(input.clone()).await.unwrap();
    assert_eq!(created.id, "custom-id");
    assert_eq!(created.created_at_utc.timestamp_millis(), created_at.timestamp_millis());

    let stored = assert_some(repo.get_by_id("custom-id").await.unwrap(), "custom id");
    assert_eq!(stored, created);

    input.name = "Second".to_string();
    let err = repo.create(input).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(ref id) if id == "custom-id"));
    let still = assert_some(repo.get_by_id("custom-id").await.unwrap(), "original");
    assert_eq!(still.name, "Kept");
}

pub async fn update_and_delete_semantics(repo: ProductRepo) {
    let created = repo.create(product("Hammer", "Tools", "9.5", 3)).await.unwrap();

    let replacement = UpdateProduct {
        name: "Claw Hammer".to_string(),
        description: Some("Steel".to_string()),
        category: "Hand Tools".to_string(),
        price: Decimal::from_str("11.25").unwrap(),
        quantity: 8,
    };
    assert!(repo.update(&created.id, replacement.clone()).await.unwrap());

    let stored = assert_some(repo.get_by_id(&created.id).await.unwrap(), "updated");
    assert_eq!(UpdateProduct::from(stored.clone()), replacement);
    assert_eq!(stored.id, created.id);
    assert_eq!(stored.created_at_utc, created.created_at_utc);

    // Identical replacement still reports the entity as found
    assert!(repo.update(&created.id, replacement.clone()).await.unwrap());

    assert!(!repo.update("missing", replacement).await.unwrap());
    assert_eq!(repo.count(&ProductFilter::default()).await.unwrap(), 1);

    assert!(repo.delete(&created.id).await.unwrap());
    assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
    assert!(!repo.delete(&created.id).await.unwrap());
}

pub async fn filters_match_expected_members(repo: ProductRepo) {
    let mut lamp = product("Desk Lamp", "Home", "25", 2);
    lamp.description = Some("Adjustable arm".to_string());
    repo.create(lamp).await.unwrap();
    repo.create(product("a.b widget", "Power Tools", "5", 20)).await.unwrap();
    repo.create(product("axb gizmo", "garden", "0", 9)).await.unwrap();
    repo.create(product("Drill", "TOOLS", "89.99", 10)).await.unwrap();

    let names = |items: Vec<Product>| {
        let mut names: Vec<String> = items.into_iter().map(|p| p.name).collect();
        names.sort();
        names
    };
    let scan = |filter: ProductFilter| {
        let repo = repo.clone();
        async move {
            let params = ListParams::default().page_size(100);
            names(repo.search(&Product::query(filter, &params)).await.unwrap())
        }
    };

    assert_eq!(scan(ProductFilter::default().name("ARM")).await, vec!["Desk Lamp"]);
    assert_eq!(scan(ProductFilter::default().name("a.b")).await, vec!["a.b widget"]);
    assert_eq!(
        scan(ProductFilter::default().category("tools")).await,
        vec!["Drill", "a.b widget"]
    );
    assert_eq!(
        scan(ProductFilter::default().name("   ")).await.len(),
        4,
        "blank name filter is absent"
    );

    let range = ProductFilter::default()
        .price_between(Some(Decimal::from(90)), Some(Decimal::from(5)));
    assert_eq!(scan(range).await, vec!["Desk Lamp", "Drill", "a.b widget"]);

    let negative = ProductFilter::default().price_between(Some(Decimal::from(-10)), None);
    assert_eq!(scan(negative).await.len(), 4);

    assert_eq!(
        scan(ProductFilter::default().quantity_below(10)).await,
        vec!["Desk Lamp", "axb gizmo"]
    );
}

pub async fn overview_matches_paged_sum(repo: ProductRepo) {
    seed(&repo, 31).await;

    let pages = collect_pages(&repo, &ProductFilter::default(), 7).await;
    let expected = pages
        .iter()
        .map(|p| p.price * Decimal::from(p.quantity))
        .fold(Decimal::ZERO, |total, value| total + value);
    let expected_low = pages.iter().filter(|p| p.quantity < 10).count() as u64;

    let metrics = MetricsService::new(repo.clone());
    let overview = metrics.overview().await.unwrap();

    assert_eq!(overview.total_products, 31);
    assert_eq!(overview.total_stock_value, expected);
    assert_eq!(overview.low_stock_count, expected_low);

    let by_category = metrics.by_category().await.unwrap();
    let grouped_total: u64 = by_category.iter().map(|s| s.count).sum();
    let grouped_value = by_category
        .iter()
        .fold(Decimal::ZERO, |total, s| total + s.stock_value);
    assert_eq!(grouped_total, 31);
    assert_eq!(grouped_value, expected);
    assert!(by_category.iter().any(|s| s.category.is_empty()));

    let low = metrics.low_stock(None, Some(100)).await.unwrap();
    assert_eq!(low.len() as u64, expected_low);
    assert_sorted_by(&low, |p| p.quantity, false, "low stock");
}

pub async fn two_product_overview(repo: ProductRepo) {
    repo.create(product("Widget", "", "10", 5)).await.unwrap();
    repo.create(product("Gadget", "", "20", 2)).await.unwrap();

    let metrics = MetricsService::new(repo);
    let overview = metrics.overview().await.unwrap();
    assert_eq!(overview.total_products, 2);
    assert_eq!(overview.total_stock_value, Decimal::from(90));
    assert_eq!(overview.low_stock_count, 2);

    let by_category = metrics.by_category().await.unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].category, "");
    assert_eq!(by_category[0].count, 2);
    assert_eq!(by_category[0].stock_value, Decimal::from(90));
}

pub async fn concurrent_mutations_stay_consistent(repo: ProductRepo) {
    let mut tasks = Vec::new();
    for writer in 0..8 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for i in 0..10 {
                let input = product(&format!("w{}-{}", writer, i), "Load", "1", i);
                ids.push(repo.create(input).await.unwrap().id);
            }
            ids
        }));
    }

    let mut ids = HashSet::new();
    for task in tasks {
        ids.extend(task.await.unwrap());
    }
    assert_eq!(ids.len(), 80);
    assert_eq!(repo.count(&ProductFilter::default()).await.unwrap(), 80);

    let target = repo.create(product("contended", "Load", "1", 0)).await.unwrap();
    let mut writers = Vec::new();
    for writer in 1..=8 {
        let repo = repo.clone();
        let id = target.id.clone();
        writers.push(tokio::spawn(async move {
            let update = UpdateProduct {
                name: format!("writer-{}", writer),
                description: None,
                category: "Load".to_string(),
                price: Decimal::from(writer),
                quantity: writer,
            };
            repo.update(&id, update).await.unwrap()
        }));
    }
    for writer in writers {
        assert!(writer.await.unwrap());
    }

    let last = assert_some(repo.get_by_id(&target.id).await.unwrap(), "contended");
    assert_eq!(last.name, format!("writer-{}", last.quantity));
    assert_eq!(last.price, Decimal::from(last.quantity));
}
