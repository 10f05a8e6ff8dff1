//! Read-only catalog queries.

use sqlx::PgPool;

use crate::domain::aggregates::{assemble_details, contains_pattern, ensure_category};
use crate::services::cart::INVENTORY_VIEW_SELECT;
use crate::{Category, EcommerceError, Inventory, InventoryView, Product, ProductDetail, ProductImage, Result};

const RECOMMENDED: i64 = 5;

pub struct CatalogService<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products, optionally restricted to a category name and/or a
    /// case-insensitive name substring. An unknown category is an error.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, category: Option<&str>, find: Option<&str>) -> Result<Vec<ProductDetail>> {
        if let Some(name) = category {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
                .bind(name)
                .fetch_optional(self.pool)
                .await?;
            if exists.is_none() {
                return Err(EcommerceError::CategoryMismatch);
            }
        }

        let products: Vec<Product> = sqlx::query_as(
            "SELECT p.* FROM products p JOIN categories c ON c.id = p.category_id \
             WHERE ($1::text IS NULL OR c.name = $1) \
               AND ($2::text IS NULL OR p.name ILIKE $2) \
             ORDER BY p.id",
        )
        .bind(category)
        .bind(find.map(contains_pattern))
        .fetch_all(self.pool)
        .await?;
        self.with_children(products).await
    }

    /// One product. When a category name is given it must match the product's.
    pub async fn show_product(&self, id: i64, category: Option<&str>) -> Result<ProductDetail> {
        let product: Product = sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(EcommerceError::NotFound("product"))?;
        let detail = self
            .with_children(vec![product])
            .await?
            .pop()
            .ok_or(EcommerceError::NotFound("product"))?;
        ensure_category(&detail.category, category)?;
        Ok(detail)
    }

    /// Five products in random order.
    pub async fn recommend(&self) -> Result<Vec<ProductDetail>> {
        let products: Vec<Product> = sqlx::query_as("SELECT * FROM products ORDER BY random() LIMIT $1")
            .bind(RECOMMENDED)
            .fetch_all(self.pool)
            .await?;
        self.with_children(products).await
    }

    /// Enriched inventory units for the given ids, in id order. Unknown ids are skipped.
    pub async fn inventories(&self, ids: &[i64]) -> Result<Vec<InventoryView>> {
        let views = sqlx::query_as(&format!("{INVENTORY_VIEW_SELECT} WHERE i.id = ANY($1) ORDER BY i.id"))
            .bind(ids)
            .fetch_all(self.pool)
            .await?;
        Ok(views)
    }

    async fn with_children(&self, products: Vec<Product>) -> Result<Vec<ProductDetail>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let product_ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let category_ids: Vec<i64> = products.iter().map(|p| p.category_id).collect();

        let categories: Vec<Category> = sqlx::query_as("SELECT id, name FROM categories WHERE id = ANY($1)")
            .bind(&category_ids)
            .fetch_all(self.pool)
            .await?;
        let images: Vec<ProductImage> =
            sqlx::query_as("SELECT id, product_id, url FROM product_images WHERE product_id = ANY($1) ORDER BY id")
                .bind(&product_ids)
                .fetch_all(self.pool)
                .await?;
        let inventories: Vec<Inventory> = sqlx::query_as(
            "SELECT id, product_id, color, size, quantity FROM inventories WHERE product_id = ANY($1) ORDER BY id",
        )
        .bind(&product_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(assemble_details(products, categories, images, inventories))
    }
}
