use anyhow::{Context, Result};
use rand::Rng;
use sqlx::PgPool;

use crate::services::auth::hash_password;

const CATEGORIES: [&str; 4] = ["Tops", "Jackets", "Vests", "Shirts"];
const PRODUCTS_PER_CATEGORY: usize = 5;
const IMAGES_PER_PRODUCT: usize = 5;
const VARIANTS: [(&str, &str); 5] = [("black", "L"), ("black", "M"), ("black", "XL"), ("white", "M"), ("gray", "M")];

#[derive(Clone, Debug)]
pub struct DemoProduct {
    pub category: &'static str,
    pub name: String,
    pub price: i32,
    pub image_urls: Vec<String>,
    pub variants: Vec<(&'static str, &'static str, i32)>,
}

/// Demo catalog: five products per category, each with five images and the
/// five standard color/size variants holding 0..=9 units.
pub fn demo_catalog() -> Vec<DemoProduct> {
    let mut rng = rand::rng();
    CATEGORIES
        .iter()
        .flat_map(|&category| (1..=PRODUCTS_PER_CATEGORY).map(move |n| (category, n)))
        .map(|(category, n)| DemoProduct {
            category,
            name: format!("{category} #{n}"),
            price: rng.random_range(5..=30) * 100,
            image_urls: (1..=IMAGES_PER_PRODUCT)
                .map(|i| format!("https://via.placeholder.com/640x480.png?text={}-{n}-{i}", category.to_lowercase()))
                .collect(),
            variants: VARIANTS.iter().map(|&(color, size)| (color, size, rng.random_range(0..10))).collect(),
        })
        .collect()
}

/// Insert the demo catalog and a `root@example.com` account unless the
/// catalog already has categories.
pub async fn seed_demo_data(pool: &PgPool) -> Result<()> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories").fetch_one(pool).await?;
    if existing > 0 {
        tracing::info!("catalog already populated, skipping demo seed");
        return Ok(());
    }

    let catalog = demo_catalog();
    let root_password = hash_password("password").map_err(|e| anyhow::anyhow!("failed to hash seed password: {e}"))?;

    let mut tx = pool.begin().await?;
    for name in CATEGORIES {
        sqlx::query("INSERT INTO categories (name) VALUES ($1)").bind(name).execute(&mut *tx).await?;
    }
    for product in &catalog {
        let (product_id,): (i64,) = sqlx::query_as(
            "INSERT INTO products (category_id, name, price, status) \
             SELECT id, $2, $3, 'listed' FROM categories WHERE name = $1 RETURNING id",
        )
        .bind(product.category)
        .bind(&product.name)
        .bind(product.price)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to seed product {}", product.name))?;

        for url in &product.image_urls {
            sqlx::query("INSERT INTO product_images (product_id, url) VALUES ($1, $2)")
                .bind(product_id).bind(url).execute(&mut *tx).await?;
        }
        for (color, size, quantity) in &product.variants {
            sqlx::query("INSERT INTO inventories (product_id, color, size, quantity) VALUES ($1, $2, $3, $4)")
                .bind(product_id).bind(color).bind(size).bind(quantity).execute(&mut *tx).await?;
        }
    }
    sqlx::query("INSERT INTO users (name, email, password) VALUES ('root', 'root@example.com', $1) ON CONFLICT (email) DO NOTHING")
        .bind(&root_password)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(products = catalog.len(), "seeded demo catalog");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_shape() {
        let catalog = demo_catalog();
        assert_eq!(catalog.len(), CATEGORIES.len() * PRODUCTS_PER_CATEGORY);
        for product in &catalog {
            assert_eq!(product.image_urls.len(), IMAGES_PER_PRODUCT);
            assert_eq!(product.variants.len(), VARIANTS.len());
            assert!(product.price >= 500 && product.price <= 3000);
            assert!(product.variants.iter().all(|&(_, _, q)| (0..10).contains(&q)));
        }
    }
}
