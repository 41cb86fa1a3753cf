use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be empty")));
    }
    Ok(())
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(
            ValidationError::new("negative").with_message(Cow::Borrowed("must not be negative"))
        );
    }
    Ok(())
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier, never changes after creation
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text category label (not a reference to a Category id)
    pub category: String,
    /// Unit price, exact decimal
    pub price: Decimal,
    /// Units in stock
    pub quantity: i32,
    /// Set once at creation, millisecond precision
    pub created_at_utc: DateTime<Utc>,
}

/// DTO for creating a new product
///
/// `id` and `created_at_utc` are normally left empty and assigned by the store.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 120, message = "must be at most 120 characters")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub category: String,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: i32,
    #[serde(default)]
    pub created_at_utc: Option<DateTime<Utc>>,
}

/// DTO for updating a product; replaces every mutable field
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 120, message = "must be at most 120 characters")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub category: String,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: i32,
}

impl Product {
    /// Build a product from its create DTO and the identity assigned by the store
    pub fn from_create(input: CreateProduct, id: String, created_at_utc: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            category: input.category,
            price: input.price,
            quantity: input.quantity,
            created_at_utc,
        }
    }

    /// Replace all mutable fields; `id` and `created_at_utc` are untouched
    pub fn apply_update(&mut self, update: UpdateProduct) {
        self.name = update.name;
        self.description = update.description;
        self.category = update.category;
        self.price = update.price;
        self.quantity = update.quantity;
    }

    /// `price * quantity`, or `None` on decimal overflow
    pub fn stock_value(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

impl From<Product> for UpdateProduct {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            quantity: product.quantity,
        }
    }
}

/// Category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

/// DTO for creating a new category
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 200, message = "must be at most 200 characters")
    )]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at_utc: Option<DateTime<Utc>>,
}

/// DTO for updating a category
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 200, message = "must be at most 200 characters")
    )]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Category {
    pub fn from_create(input: CreateCategory, id: String, created_at_utc: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            created_at_utc,
        }
    }

    pub fn apply_update(&mut self, update: UpdateCategory) {
        self.name = update.name;
        self.description = update.description;
    }
}
