//! Checkout plan: what a user's cart asks of each inventory unit

use std::collections::{BTreeMap, HashMap};

use crate::{CartLine, EcommerceError};

/// Requested quantity per inventory id, in ascending id order so rows are
/// always locked in the same sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckoutPlan {
    requested: BTreeMap<i64, i64>,
}

/// One stock decrement to apply inside the checkout transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StockDecrement {
    pub inventory_id: i64,
    pub quantity: i64,
    pub remaining: i64,
}

impl CheckoutPlan {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let mut requested = BTreeMap::new();
        for line in lines {
            *requested.entry(line.inventory_id).or_insert(0) += i64::from(line.quantity);
        }
        Self { requested }
    }

    pub fn is_empty(&self) -> bool { self.requested.is_empty() }

    pub fn inventory_ids(&self) -> Vec<i64> { self.requested.keys().copied().collect() }

    pub fn total_units(&self) -> i64 { self.requested.values().sum() }

    /// Match the plan against locked stock levels. Fails on the first unit
    /// that is missing or short; nothing is decremented in that case.
    pub fn reserve(&self, stock: &HashMap<i64, i32>) -> Result<Vec<StockDecrement>, EcommerceError> {
        self.requested
            .iter()
            .map(|(&inventory_id, &quantity)| {
                let available = stock.get(&inventory_id).copied().map(i64::from).unwrap_or(0);
                if available < quantity {
                    return Err(EcommerceError::InsufficientStock { inventory_id, requested: quantity, available });
                }
                Ok(StockDecrement { inventory_id, quantity, remaining: available - quantity })
            })
            .collect()
    }
}
