use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Decimal128, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::decimal::{from_decimal128, to_decimal128};
use super::MongoEntity;
use crate::error::{CatalogError, CatalogResult};
use crate::metrics::CategoryStats;
use crate::models::{Category, Product, UpdateCategory, UpdateProduct};
use crate::query::{CategoryFilter, ProductFilter, SortField};

/// Field holding the per-collection insertion sequence
pub const SEQ_FIELD: &str = "seq";

/// Stored form of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal128,
    pub quantity: i32,
    pub created_at_utc: BsonDateTime,
    pub seq: i64,
}

/// Stored form of a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at_utc: BsonDateTime,
    pub seq: i64,
}

fn to_bson_datetime(timestamp: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(timestamp.timestamp_millis())
}

fn from_bson_datetime(timestamp: BsonDateTime) -> CatalogResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(timestamp.timestamp_millis())
        .single()
        .ok_or_else(|| {
            CatalogError::Serialization(format!("timestamp out of range: {}", timestamp))
        })
}

fn index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

/// Case-insensitive literal substring match
fn contains(text: &str) -> Document {
    doc! { "$regex": regex::escape(text), "$options": "i" }
}

fn name_or_description(text: &str) -> Bson {
    Bson::Array(vec![
        Bson::Document(doc! { "name": contains(text) }),
        Bson::Document(doc! { "description": contains(text) }),
    ])
}

/// `$group` stage producing one row per category with its count and stock value
pub fn category_totals_pipeline() -> Vec<Document> {
    vec![doc! {
        "$group": {
            "_id": "$category",
            "count": { "$sum": 1 },
            "stockValue": { "$sum": { "$multiply": ["$price", "$quantity"] } },
        }
    }]
}

/// Decode one row of [`category_totals_pipeline`]
pub fn category_totals_row(row: &Document) -> CatalogResult<CategoryStats> {
    let unexpected = |field: &str, value: Option<&Bson>| {
        CatalogError::Serialization(format!("unexpected {} in category totals: {:?}", field, value))
    };

    let category = match row.get("_id") {
        Some(Bson::String(category)) => category.clone(),
        None | Some(Bson::Null) => String::new(),
        other => return Err(unexpected("_id", other)),
    };

    let count = match row.get("count") {
        Some(Bson::Int32(count)) => u64::try_from(*count).ok(),
        Some(Bson::Int64(count)) => u64::try_from(*count).ok(),
        _ => None,
    }
    .ok_or_else(|| unexpected("count", row.get("count")))?;

    // A sum past the Decimal range cannot be represented exactly
    let stock_value = match row.get("stockValue") {
        Some(Bson::Decimal128(value)) => {
            from_decimal128(*value).map_err(|_| CatalogError::Overflow)?
        }
        Some(Bson::Int32(value)) => Decimal::from(*value),
        Some(Bson::Int64(value)) => Decimal::from(*value),
        other => return Err(unexpected("stockValue", other)),
    };

    Ok(CategoryStats {
        category,
        count,
        stock_value,
    })
}

impl MongoEntity for Product {
    type Document = ProductDocument;

    const COLLECTION: &'static str = "products";

    fn indexes() -> Vec<IndexModel> {
        vec![
            index(doc! { "name": 1 }, "idx_name"),
            index(doc! { "category": 1 }, "idx_category"),
            index(doc! { "createdAtUtc": -1 }, "idx_created_at"),
            index(doc! { "quantity": 1 }, "idx_quantity"),
            index(doc! { "seq": 1 }, "idx_seq"),
        ]
    }

    fn to_document(&self, seq: i64) -> CatalogResult<ProductDocument> {
        Ok(ProductDocument {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            price: to_decimal128(self.price)?,
            quantity: self.quantity,
            created_at_utc: to_bson_datetime(self.created_at_utc),
            seq,
        })
    }

    fn from_document(document: ProductDocument) -> CatalogResult<Self> {
        Ok(Product {
            id: document.id,
            name: document.name,
            description: document.description,
            category: document.category,
            price: from_decimal128(document.price)?,
            quantity: document.quantity,
            created_at_utc: from_bson_datetime(document.created_at_utc)?,
        })
    }

    fn filter_document(filter: &ProductFilter) -> CatalogResult<Document> {
        let mut document = doc! {};

        if let Some(ref text) = filter.name {
            document.insert("$or", name_or_description(text));
        }

        if let Some(ref category) = filter.category {
            document.insert("category", contains(category));
        }

        if filter.min_price.is_some() || filter.max_price.is_some() {
            let mut price = doc! {};
            if let Some(min) = filter.min_price {
                price.insert("$gte", to_decimal128(min)?);
            }
            if let Some(max) = filter.max_price {
                price.insert("$lte", to_decimal128(max)?);
            }
            document.insert("price", price);
        }

        if let Some(below) = filter.quantity_below {
            document.insert("quantity", doc! { "$lt": below });
        }

        Ok(document)
    }

    fn set_document(update: &UpdateProduct) -> CatalogResult<Document> {
        Ok(doc! {
            "name": &update.name,
            "description": update.description.clone(),
            "category": &update.category,
            "price": to_decimal128(update.price)?,
            "quantity": update.quantity,
        })
    }

    fn sort_key(field: SortField) -> &'static str {
        match field {
            SortField::Name => "name",
            SortField::Category => "category",
            SortField::Price => "price",
            SortField::Quantity => "quantity",
            SortField::CreatedAtUtc => "createdAtUtc",
        }
    }
}

impl MongoEntity for Category {
    type Document = CategoryDocument;

    const COLLECTION: &'static str = "categories";

    fn indexes() -> Vec<IndexModel> {
        vec![
            index(doc! { "name": 1 }, "idx_name"),
            index(doc! { "createdAtUtc": -1 }, "idx_created_at"),
            index(doc! { "seq": 1 }, "idx_seq"),
        ]
    }

    fn to_document(&self, seq: i64) -> CatalogResult<CategoryDocument> {
        Ok(CategoryDocument {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            created_at_utc: to_bson_datetime(self.created_at_utc),
            seq,
        })
    }

    fn from_document(document: CategoryDocument) -> CatalogResult<Self> {
        Ok(Category {
            id: document.id,
            name: document.name,
            description: document.description,
            created_at_utc: from_bson_datetime(document.created_at_utc)?,
        })
    }

    fn filter_document(filter: &CategoryFilter) -> CatalogResult<Document> {
        Ok(match filter.name {
            Some(ref text) => doc! { "$or": name_or_description(text) },
            None => doc! {},
        })
    }

    fn set_document(update: &UpdateCategory) -> CatalogResult<Document> {
        Ok(doc! {
            "name": &update.name,
            "description": update.description.clone(),
        })
    }

    fn sort_key(field: SortField) -> &'static str {
        match field {
            SortField::CreatedAtUtc => "createdAtUtc",
            _ => "name",
        }
    }
}
