//! Account endpoints and the bearer-token extractor.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AppState;
use crate::domain::value_objects::UserId;
use crate::services::NewUser;
use crate::{EcommerceError, User};

/// The authenticated caller, resolved once per request from `Authorization: Bearer …`.
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> UserId { self.0.id }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(EcommerceError::Unauthenticated)?;
        let user = state.auth().current_user(token).await?;
        Ok(Self(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") { return None; }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "The name field is required."),
        length(min = 1, max = 100, message = "The name must be between 1 and 100 characters.")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "The password field is required."),
        must_match(other = "password_confirmation", message = "The password confirmation does not match.")
    )]
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: UserId,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), EcommerceError> {
    let Json(request) = payload?;
    request.validate()?;
    let new_user = NewUser {
        name: request.name.unwrap_or_default(),
        email: request.email.unwrap_or_default(),
        password: request.password.unwrap_or_default(),
        phone: request.phone,
        address: request.address,
    };
    let id = state.auth().register(new_user).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { id })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, EcommerceError> {
    let Json(request) = payload?;
    request.validate()?;
    let (user, token) = state
        .auth()
        .login(request.email.as_deref().unwrap_or_default(), request.password.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(LoginResponse { user, token }))
}

pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> Result<StatusCode, EcommerceError> {
    state.auth().logout(user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn show(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
