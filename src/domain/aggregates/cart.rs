//! Cart rules: add policy, request parsing and quantity checks

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::domain::value_objects::{Quantity, QuantityError};
use crate::{EcommerceError, FieldErrors};

/// What "add to cart" does with lines the user already holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartAddPolicy {
    /// Insert new lines next to existing ones, duplicates per inventory allowed.
    #[default]
    Append,
    /// Drop every existing line of the user, then insert.
    ReplaceAll,
}

impl FromStr for CartAddPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "replace_all" | "replace-all" | "replace" => Ok(Self::ReplaceAll),
            other => Err(format!("unknown cart add policy `{other}` (expected `append` or `replace_all`)")),
        }
    }
}

impl fmt::Display for CartAddPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Append => write!(f, "append"), Self::ReplaceAll => write!(f, "replace_all") }
    }
}

/// A validated "add to cart" item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewCartItem {
    pub inventory_id: i64,
    pub quantity: Quantity,
}

#[derive(Debug, Deserialize)]
struct RawCartItem {
    inventory_id: Option<Value>,
    #[serde(alias = "amount")]
    quantity: Option<Value>,
}

/// Parse the body of `POST /carts`: a non-empty JSON array of
/// `{inventory_id, quantity}` objects. `amount` is accepted for `quantity`.
pub fn parse_cart_items(body: &[u8]) -> Result<Vec<NewCartItem>, EcommerceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(EcommerceError::body_required());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| EcommerceError::validation_field("body", "The request body must be valid JSON."))?;
    let items = match value {
        Value::Array(items) if items.is_empty() => return Err(EcommerceError::body_required()),
        Value::Object(map) if map.is_empty() => return Err(EcommerceError::body_required()),
        Value::Array(items) => items,
        _ => return Err(EcommerceError::validation_field("body", "The request body must be a list of cart items.")),
    };

    let mut errors = FieldErrors::new();
    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let raw: RawCartItem = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(_) => {
                push(&mut errors, index.to_string(), format!("The {index} item must be an object."));
                continue;
            }
        };
        let inventory_id = required_integer(&mut errors, index, "inventory_id", raw.inventory_id);
        let quantity = required_integer(&mut errors, index, "quantity", raw.quantity).and_then(|value| {
            match Quantity::new(value) {
                Ok(quantity) => Some(quantity),
                Err(QuantityError::TooLow) => {
                    push(&mut errors, format!("{index}.quantity"), format!("The {index}.quantity must be at least 1."));
                    None
                }
                Err(QuantityError::TooHigh) => {
                    push(&mut errors, format!("{index}.quantity"), format!("The {index}.quantity is too large."));
                    None
                }
            }
        });
        if let (Some(inventory_id), Some(quantity)) = (inventory_id, quantity) {
            parsed.push(NewCartItem { inventory_id, quantity });
        }
    }

    if errors.is_empty() { Ok(parsed) } else { Err(EcommerceError::validation(errors)) }
}

fn required_integer(errors: &mut FieldErrors, index: usize, field: &str, value: Option<Value>) -> Option<i64> {
    let key = format!("{index}.{field}");
    match value {
        None | Some(Value::Null) => {
            push(errors, key.clone(), format!("The {key} field is required."));
            None
        }
        Some(value) => {
            let number = value.as_i64().or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()));
            if number.is_none() {
                push(errors, key.clone(), format!("The {key} must be an integer."));
            }
            number
        }
    }
}

fn push(errors: &mut FieldErrors, key: String, message: String) {
    errors.entry(key).or_default().push(message);
}

/// Check a new requested quantity against the stock currently on hand.
/// Over-stock is reported before too-low.
pub fn check_requested_quantity(requested: i64, available: i32) -> Result<Quantity, EcommerceError> {
    if requested > i64::from(available) {
        return Err(EcommerceError::QuantityExceedsStock {
            requested: i32::try_from(requested).unwrap_or(i32::MAX),
            available,
        });
    }
    Quantity::new(requested).map_err(|_| EcommerceError::QuantityTooLow)
}
