//! Product catalog rules

use std::collections::HashMap;

use crate::{Category, EcommerceError, Inventory, Product, ProductDetail, ProductImage};

/// A product looked up under a category name must actually belong to it.
pub fn ensure_category(category: &Category, requested: Option<&str>) -> Result<(), EcommerceError> {
    match requested {
        Some(name) if name != category.name => Err(EcommerceError::CategoryMismatch),
        _ => Ok(()),
    }
}

/// Case-insensitive substring pattern for `ILIKE`, with LIKE wildcards escaped.
pub fn contains_pattern(find: &str) -> String {
    let mut pattern = String::with_capacity(find.len() + 2);
    pattern.push('%');
    for c in find.chars() {
        if matches!(c, '%' | '_' | '\\') { pattern.push('\\'); }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Stitch separately loaded rows into product details, keeping product order.
/// Products whose category is missing are skipped.
pub fn assemble_details(
    products: Vec<Product>,
    categories: Vec<Category>,
    images: Vec<ProductImage>,
    inventories: Vec<Inventory>,
) -> Vec<ProductDetail> {
    let categories: HashMap<i64, Category> = categories.into_iter().map(|c| (c.id, c)).collect();
    let mut images_by_product: HashMap<i64, Vec<ProductImage>> = HashMap::new();
    for image in images {
        images_by_product.entry(image.product_id).or_default().push(image);
    }
    let mut inventories_by_product: HashMap<i64, Vec<Inventory>> = HashMap::new();
    for inventory in inventories {
        inventories_by_product.entry(inventory.product_id).or_default().push(inventory);
    }

    products
        .into_iter()
        .filter_map(|product| {
            let category = categories.get(&product.category_id)?.clone();
            let images = images_by_product.remove(&product.id).unwrap_or_default();
            let inventories = inventories_by_product.remove(&product.id).unwrap_or_default();
            Some(ProductDetail { product, category, images, inventories })
        })
        .collect()
}
