//! Public catalog endpoints.

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::{EcommerceError, InventoryView, ProductDetail};

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub find: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductDetail>>, EcommerceError> {
    let products = state
        .catalog()
        .list_products(non_blank(&query.category), non_blank(&query.find))
        .await?;
    Ok(Json(products))
}

pub async fn show(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductDetail>, EcommerceError> {
    let Path(id) = path?;
    Ok(Json(state.catalog().show_product(id, non_blank(&query.category)).await?))
}

pub async fn recommend(State(state): State<AppState>) -> Result<Json<Vec<ProductDetail>>, EcommerceError> {
    Ok(Json(state.catalog().recommend().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    pub id: Option<String>,
}

/// Parse `?id=1,2,3`. Blank entries are ignored; an empty list counts as missing.
pub fn parse_id_list(raw: Option<&str>) -> Result<Vec<i64>, EcommerceError> {
    let required = || EcommerceError::validation_field("id", "inventories id is required");
    let ids = raw
        .ok_or_else(required)?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| EcommerceError::validation_field("id", "The id must be a comma separated list of integers."))?;
    if ids.is_empty() {
        return Err(required());
    }
    Ok(ids)
}

pub async fn inventories(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<Vec<InventoryView>>, EcommerceError> {
    let ids = parse_id_list(query.id.as_deref())?;
    Ok(Json(state.catalog().inventories(&ids).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list(Some("1,2, 3")).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list(Some("4,,")).unwrap(), vec![4]);
        assert_eq!(parse_id_list(None).unwrap_err().to_string(), "inventories id is required");
        assert_eq!(parse_id_list(Some(" , ")).unwrap_err().to_string(), "inventories id is required");
        assert!(matches!(parse_id_list(Some("1,two")), Err(EcommerceError::Validation { .. })));
    }

    #[test]
    fn test_non_blank_query_values() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&Some(" Tops ".into())), Some("Tops"));
        assert_eq!(non_blank(&None), None);
    }
}
