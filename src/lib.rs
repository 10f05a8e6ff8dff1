//! OpenSASE Storefront
//!
//! Self-hosted storefront backend: catalog browsing, per-user carts and
//! transactional checkout.
//!
//! ## Features
//! - Bearer-token accounts (register, login, logout)
//! - Product catalog with categories, images and inventory variants
//! - Shopping cart with configurable add policy
//! - Checkout that decrements stock atomically under row locks

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod services;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::value_objects::UserId;

// =============================================================================
// Core Types
// =============================================================================

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub price: i32,
    pub intro: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: i64,
    #[serde(skip_serializing)]
    pub product_id: i64,
    pub url: String,
}

/// A stock-keeping unit: one color/size variant of a product.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Inventory {
    pub id: i64,
    #[serde(skip_serializing)]
    pub product_id: i64,
    pub color: String,
    pub size: String,
    pub quantity: i32,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: i64,
    pub user_id: UserId,
    pub inventory_id: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product joined with its category, images and inventory variants.
#[derive(Clone, Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Category,
    pub images: Vec<ProductImage>,
    pub inventories: Vec<Inventory>,
}

/// Inventory unit enriched with product, category and first image for display.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryView {
    pub id: i64,
    pub color: String,
    pub size: String,
    pub inventory_quantity: i32,
    pub name: String,
    pub price: i32,
    pub category: String,
    pub image: Option<String>,
}

/// One row of a user's cart: every line for the same inventory, summed.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartEntry {
    pub id: i64,
    pub cart_ids: Vec<i64>,
    pub quantity: i64,
    pub color: String,
    pub size: String,
    pub inventory_quantity: i32,
    pub name: String,
    pub price: i32,
    pub category: String,
    pub image: Option<String>,
}

// =============================================================================
// Error Types
// =============================================================================

/// Field name → human readable messages, ordered for stable responses.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("email already exist")]
    DuplicateEmail,

    #[error("Credentials do not match records")]
    InvalidCredentials,

    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("category name error.")]
    CategoryMismatch,

    #[error("{0} not found.")]
    NotFound(&'static str),

    #[error("The inventory does not have enough quantity.")]
    QuantityExceedsStock { requested: i32, available: i32 },

    #[error("The quantity is too low.")]
    QuantityTooLow,

    #[error("inventory {inventory_id} has {available} left, {requested} requested")]
    InsufficientStock {
        inventory_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EcommerceError {
    /// Validation failure over several fields. The headline message is the
    /// first field's first message, suffixed with how many others failed.
    pub fn validation(errors: FieldErrors) -> Self {
        let total: usize = errors.values().map(Vec::len).sum();
        let first = errors
            .values()
            .flat_map(|messages| messages.iter())
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());
        let message = match total.saturating_sub(1) {
            0 => first,
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        };
        Self::Validation { message, errors }
    }

    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        Self::validation(errors)
    }

    /// A request that needed a body arrived without one.
    pub fn body_required() -> Self {
        Self::Validation {
            message: "The request body is required.".to_string(),
            errors: FieldErrors::new(),
        }
    }
}

impl From<validator::ValidationErrors> for EcommerceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let errors = err
            .field_errors()
            .into_iter()
            .map(|(field, failures)| {
                let messages = failures
                    .iter()
                    .map(|failure| match &failure.message {
                        Some(message) => message.to_string(),
                        None => format!("The {field} field is invalid."),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self::validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_counts_remaining_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("email".into(), vec!["The email field is required.".into()]);
        errors.insert(
            "name".into(),
            vec!["The name field is required.".into(), "The name is too long.".into()],
        );
        let err = EcommerceError::validation(errors);
        assert_eq!(err.to_string(), "The email field is required. (and 2 more errors)");
    }

    #[test]
    fn test_single_field_validation_keeps_message() {
        let err = EcommerceError::validation_field("0.quantity", "The 0.quantity field is required.");
        assert_eq!(err.to_string(), "The 0.quantity field is required.");
        match err {
            EcommerceError::Validation { errors, .. } => assert!(errors.contains_key("0.quantity")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_body_required_message() {
        assert_eq!(EcommerceError::body_required().to_string(), "The request body is required.");
    }

    #[test]
    fn test_user_serialization_hides_password() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(1),
            name: "allen".into(),
            email: "allen@example.com".into(),
            password: "$argon2id$secret".into(),
            phone: Some("0912345678".into()),
            address: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["id"], 1);
        assert_eq!(json["email"], "allen@example.com");
    }
}
