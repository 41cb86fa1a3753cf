use domain_catalog::{
    Catalog, CatalogResult, CategoryStats, CreateCategory, CreateProduct, Overview, Product,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

/// Dashboard snapshot printed by the binary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub backend: String,
    pub healthy: bool,
    pub overview: Overview,
    pub categories: Vec<CategoryStats>,
    pub low_stock: Vec<Product>,
}

#[instrument(skip(catalog))]
pub async fn build(catalog: &Catalog, low_stock_take: i64) -> CatalogResult<Report> {
    let health = catalog.health().await;

    Ok(Report {
        backend: catalog.backend().to_string(),
        healthy: health.healthy,
        overview: catalog.metrics.overview().await?,
        categories: catalog.metrics.by_category().await?,
        low_stock: catalog.metrics.low_stock(None, Some(low_stock_take)).await?,
    })
}

const DEMO_PRODUCTS: &[(&str, &str, i64, u32, i32)] = &[
    ("Claw hammer", "Tools", 1499, 2, 42),
    ("Tape measure", "Tools", 899, 2, 6),
    ("Pruning shears", "Garden", 2450, 2, 3),
    ("Seed tray", "Garden", 350, 2, 120),
    ("Work gloves", "", 1200, 2, 9),
];

/// Load a handful of products and their categories
#[instrument(skip(catalog))]
pub async fn seed_demo(catalog: &Catalog) -> CatalogResult<()> {
    for name in ["Tools", "Garden"] {
        catalog
            .categories
            .create(CreateCategory {
                name: name.to_string(),
                ..Default::default()
            })
            .await?;
    }

    for (name, category, price, scale, quantity) in DEMO_PRODUCTS {
        catalog
            .products
            .create(CreateProduct {
                name: name.to_string(),
                category: category.to_string(),
                price: Decimal::new(*price, *scale),
                quantity: *quantity,
                ..Default::default()
            })
            .await?;
    }

    info!(products = DEMO_PRODUCTS.len(), "Demo catalog seeded");
    Ok(())
}
