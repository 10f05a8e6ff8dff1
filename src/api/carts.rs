//! `/carts` endpoints. All of them require a bearer token.

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{AppState, CurrentUser};
use crate::domain::aggregates::parse_cart_items;
use crate::{CartEntry, EcommerceError, InventoryView};

pub async fn index(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<CartEntry>>, EcommerceError> {
    Ok(Json(state.carts().list(user.id()).await?))
}

/// Body is a JSON array of `{inventory_id, quantity}`; read raw so that an
/// empty body gets the dedicated message instead of an extractor rejection.
pub async fn store(State(state): State<AppState>, user: CurrentUser, body: Bytes) -> Result<StatusCode, EcommerceError> {
    let items = parse_cart_items(&body)?;
    state.carts().add_items(user.id(), &items).await?;
    Ok(StatusCode::CREATED)
}

pub async fn store_returning_inventory(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<InventoryView>, EcommerceError> {
    let Path(inventory_id) = path?;
    Ok(Json(state.carts().add_returning_inventory(user.id(), inventory_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    #[serde(alias = "amount")]
    pub quantity: Option<i64>,
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<StatusCode, EcommerceError> {
    let Path(cart_id) = path?;
    let Json(request) = payload?;
    let quantity = request
        .quantity
        .ok_or_else(|| EcommerceError::validation_field("quantity", "The quantity field is required."))?;
    state.carts().update_quantity(user.id(), cart_id, quantity).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, EcommerceError> {
    let Path(cart_id) = path?;
    state.carts().remove_item(user.id(), cart_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn destroy_all(State(state): State<AppState>, user: CurrentUser) -> Result<StatusCode, EcommerceError> {
    state.carts().clear(user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn checkout(State(state): State<AppState>, user: CurrentUser) -> Result<StatusCode, EcommerceError> {
    state.carts().checkout(user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
