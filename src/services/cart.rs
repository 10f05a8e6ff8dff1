//! Cart operations and checkout.
//!
//! Every call is scoped to an explicit [`UserId`]; a user can only see or
//! change their own cart lines.

use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::domain::aggregates::{check_requested_quantity, CartAddPolicy, CheckoutPlan, NewCartItem};
use crate::domain::events::{CartEvent, EventPublisher};
use crate::domain::value_objects::UserId;
use crate::{CartEntry, CartLine, EcommerceError, InventoryView, Result};

/// Joins an inventory unit with its product, category and first image.
pub(crate) const INVENTORY_VIEW_SELECT: &str = "\
    SELECT i.id, i.color, i.size, i.quantity AS inventory_quantity, \
           p.name, p.price, c.name AS category, \
           (SELECT url FROM product_images pi WHERE pi.product_id = p.id ORDER BY pi.id LIMIT 1) AS image \
    FROM inventories i \
    JOIN products p ON p.id = i.product_id \
    JOIN categories c ON c.id = p.category_id";

/// Outcome of a successful checkout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub lines: usize,
    pub units: i64,
}

pub struct CartService<'a> {
    pool: &'a PgPool,
    policy: CartAddPolicy,
    events: &'a EventPublisher,
}

impl<'a> CartService<'a> {
    pub fn new(pool: &'a PgPool, policy: CartAddPolicy, events: &'a EventPublisher) -> Self {
        Self { pool, policy, events }
    }

    /// Insert one line per item, after dropping the user's existing lines
    /// when the policy is `ReplaceAll`. Runs as one transaction.
    #[tracing::instrument(skip(self, items), fields(items = items.len(), policy = %self.policy))]
    pub async fn add_items(&self, user_id: UserId, items: &[NewCartItem]) -> Result<Vec<CartLine>> {
        if items.is_empty() {
            return Err(EcommerceError::body_required());
        }

        let mut tx = self.pool.begin().await?;
        let replaced = self.policy == CartAddPolicy::ReplaceAll;
        if replaced {
            sqlx::query("DELETE FROM carts WHERE user_id = $1").bind(user_id).execute(&mut *tx).await?;
        }

        let now = Utc::now();
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let line: CartLine = sqlx::query_as(
                "INSERT INTO carts (user_id, inventory_id, quantity, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $4) RETURNING *",
            )
            .bind(user_id)
            .bind(item.inventory_id)
            .bind(item.quantity.value())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(missing_inventory)?;
            lines.push(line);
        }
        tx.commit().await?;

        let inventory_ids = lines.iter().map(|l| l.inventory_id).collect();
        self.events.publish(CartEvent::ItemsAdded { user_id, inventory_ids, replaced }).await;
        Ok(lines)
    }

    /// Delete one of the user's lines. A missing line is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, cart_id: i64) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM carts WHERE id = $1 AND user_id = $2")
            .bind(cart_id)
            .bind(user_id)
            .execute(self.pool)
            .await?
            .rows_affected()
            > 0;
        if removed {
            self.events.publish(CartEvent::LineRemoved { user_id, cart_id }).await;
        }
        Ok(removed)
    }

    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?
            .rows_affected();
        self.events.publish(CartEvent::Cleared { user_id, removed }).await;
        Ok(removed)
    }

    /// Change a line's quantity, bounded by 1 and the inventory on hand.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(&self, user_id: UserId, cart_id: i64, quantity: i64) -> Result<CartLine> {
        let mut tx = self.pool.begin().await?;
        let available: Option<(i32,)> = sqlx::query_as(
            "SELECT i.quantity FROM carts c JOIN inventories i ON i.id = c.inventory_id \
             WHERE c.id = $1 AND c.user_id = $2 FOR UPDATE OF c",
        )
        .bind(cart_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (available,) = available.ok_or(EcommerceError::NotFound("cart item"))?;
        let quantity = check_requested_quantity(quantity, available)?;

        let line: CartLine = sqlx::query_as("UPDATE carts SET quantity = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(cart_id)
            .bind(quantity.value())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        self.events.publish(CartEvent::QuantityChanged { user_id, cart_id, quantity: line.quantity }).await;
        Ok(line)
    }

    /// Convert the user's cart into stock decrements and empty it, atomically.
    ///
    /// Cart lines and inventory rows are locked for the whole transaction
    /// (inventory in ascending id order). If any unit is short the
    /// transaction rolls back and the cart is left as it was. Other users'
    /// lines are never touched.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId) -> Result<CheckoutReceipt> {
        let mut tx = self.pool.begin().await?;

        let lines: Vec<CartLine> = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1 ORDER BY id FOR UPDATE")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;
        let plan = CheckoutPlan::from_lines(&lines);
        if plan.is_empty() {
            tx.commit().await?;
            return Ok(CheckoutReceipt { lines: 0, units: 0 });
        }

        let stock: Vec<(i64, i32)> =
            sqlx::query_as("SELECT id, quantity FROM inventories WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(plan.inventory_ids())
                .fetch_all(&mut *tx)
                .await?;
        let stock: HashMap<i64, i32> = stock.into_iter().collect();

        let decrements = match plan.reserve(&stock) {
            Ok(decrements) => decrements,
            Err(e) => {
                tx.rollback().await?;
                tracing::warn!(%user_id, "checkout rejected: {}", e);
                return Err(e);
            }
        };

        for decrement in &decrements {
            let updated = sqlx::query(
                "UPDATE inventories SET quantity = quantity - $2, updated_at = NOW() WHERE id = $1 AND quantity >= $2",
            )
            .bind(decrement.inventory_id)
            .bind(decrement.quantity)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            if updated != 1 {
                tx.rollback().await?;
                return Err(EcommerceError::InsufficientStock {
                    inventory_id: decrement.inventory_id,
                    requested: decrement.quantity,
                    available: stock.get(&decrement.inventory_id).copied().map(i64::from).unwrap_or(0),
                });
            }
            tracing::debug!(
                inventory_id = decrement.inventory_id,
                quantity = decrement.quantity,
                remaining = decrement.remaining,
                "stock decremented"
            );
        }

        // Only the lines locked above; lines added meanwhile stay in the cart.
        let line_ids: Vec<i64> = lines.iter().map(|l| l.id).collect();
        sqlx::query("DELETE FROM carts WHERE id = ANY($1)").bind(&line_ids).execute(&mut *tx).await?;
        tx.commit().await?;

        let receipt = CheckoutReceipt { lines: lines.len(), units: plan.total_units() };
        tracing::info!(%user_id, lines = receipt.lines, units = receipt.units, "checkout complete");
        self.events
            .publish(CartEvent::CheckedOut { user_id, lines: receipt.lines, units: receipt.units, at: Utc::now() })
            .await;
        Ok(receipt)
    }

    /// Put one unit of an inventory in the cart and return it enriched for display.
    #[tracing::instrument(skip(self))]
    pub async fn add_returning_inventory(&self, user_id: UserId, inventory_id: i64) -> Result<InventoryView> {
        let view: InventoryView = sqlx::query_as(&format!("{INVENTORY_VIEW_SELECT} WHERE i.id = $1"))
            .bind(inventory_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(EcommerceError::NotFound("inventory"))?;

        sqlx::query("INSERT INTO carts (user_id, inventory_id, quantity) VALUES ($1, $2, 1)")
            .bind(user_id)
            .bind(inventory_id)
            .execute(self.pool)
            .await
            .map_err(missing_inventory)?;

        self.events
            .publish(CartEvent::ItemsAdded { user_id, inventory_ids: vec![inventory_id], replaced: false })
            .await;
        Ok(view)
    }

    /// The user's cart, one row per inventory unit.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartEntry>> {
        let entries = sqlx::query_as(
            "SELECT i.id, array_agg(ct.id ORDER BY ct.id) AS cart_ids, SUM(ct.quantity) AS quantity, \
                    i.color, i.size, i.quantity AS inventory_quantity, \
                    p.name, p.price, c.name AS category, \
                    (SELECT url FROM product_images pi WHERE pi.product_id = p.id ORDER BY pi.id LIMIT 1) AS image \
             FROM carts ct \
             JOIN inventories i ON i.id = ct.inventory_id \
             JOIN products p ON p.id = i.product_id \
             JOIN categories c ON c.id = p.category_id \
             WHERE ct.user_id = $1 \
             GROUP BY i.id, p.id, c.id \
             ORDER BY MIN(ct.id)",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }
}

fn missing_inventory(err: sqlx::Error) -> EcommerceError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => EcommerceError::NotFound("inventory"),
        other => EcommerceError::Database(other),
    }
}
