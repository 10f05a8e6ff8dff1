//! Fixtures shared by the database-backed tests.

#![allow(dead_code)]

use sqlx::PgPool;

use opensase_storefront::domain::value_objects::UserId;

pub async fn category(pool: &PgPool, name: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("insert category");
    id
}

pub async fn product(pool: &PgPool, category_id: i64, name: &str, images: usize) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO products (category_id, name, price) VALUES ($1, $2, 1300) RETURNING id")
        .bind(category_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("insert product");
    for n in 0..images {
        sqlx::query("INSERT INTO product_images (product_id, url) VALUES ($1, $2)")
            .bind(id)
            .bind(format!("https://img.example.com/{id}/{n}.png"))
            .execute(pool)
            .await
            .expect("insert image");
    }
    id
}

pub async fn inventory(pool: &PgPool, product_id: i64, quantity: i32) -> i64 {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO inventories (product_id, color, size, quantity) VALUES ($1, 'black', 'M', $2) RETURNING id")
            .bind(product_id)
            .bind(quantity)
            .fetch_one(pool)
            .await
            .expect("insert inventory");
    id
}

pub async fn user(pool: &PgPool, email: &str) -> UserId {
    let (id,): (UserId,) = sqlx::query_as("INSERT INTO users (name, email, password) VALUES ('tester', $1, 'x') RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("insert user");
    id
}

pub async fn cart_line(pool: &PgPool, user_id: UserId, inventory_id: i64, quantity: i32) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO carts (user_id, inventory_id, quantity) VALUES ($1, $2, $3) RETURNING id")
        .bind(user_id)
        .bind(inventory_id)
        .bind(quantity)
        .fetch_one(pool)
        .await
        .expect("insert cart line");
    id
}

pub async fn stock(pool: &PgPool, inventory_id: i64) -> i32 {
    let (quantity,): (i32,) = sqlx::query_as("SELECT quantity FROM inventories WHERE id = $1")
        .bind(inventory_id)
        .fetch_one(pool)
        .await
        .expect("read stock");
    quantity
}

pub async fn line_quantities(pool: &PgPool, user_id: UserId) -> Vec<(i64, i32)> {
    sqlx::query_as("SELECT inventory_id, quantity FROM carts WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .expect("read cart")
}

/// One category, one product and `count` inventory units each holding `quantity`.
pub async fn catalog_with_inventories(pool: &PgPool, count: usize, quantity: i32) -> Vec<i64> {
    let category_id = category(pool, "Tops").await;
    let product_id = product(pool, category_id, "Logo tee", 2).await;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(inventory(pool, product_id, quantity).await);
    }
    ids
}
