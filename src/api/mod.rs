//! HTTP surface: shared state, router and handlers.

pub mod auth;
pub mod carts;
pub mod error;
pub mod products;

use axum::{
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::domain::events::EventPublisher;
use crate::services::{AuthService, CartService, CatalogService};

pub use auth::CurrentUser;
pub use error::ErrorResponse;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, events: EventPublisher) -> Self {
        Self { db, config: Arc::new(config), events }
    }

    pub fn auth(&self) -> AuthService<'_> { AuthService::new(&self.db, self.config.token_ttl) }

    pub fn carts(&self) -> CartService<'_> { CartService::new(&self.db, self.config.cart_add_policy, &self.events) }

    pub fn catalog(&self) -> CatalogService<'_> { CatalogService::new(&self.db) }
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::show))
        .route("/carts", get(carts::index).post(carts::store).delete(carts::destroy_all))
        .route("/carts/checkout", post(carts::checkout))
        .route(
            "/carts/:id",
            post(carts::store_returning_inventory).put(carts::update).delete(carts::destroy),
        )
        .route("/products", get(products::index))
        .route("/products/recommend", get(products::recommend))
        .route("/products/:id", get(products::show))
        .route("/inventories", get(products::inventories))
}

/// Full application router; every route is served both at the root and under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-storefront"})) }))
        .merge(routes())
        .nest("/api", routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // The pool never connects: every request below is answered before any query runs.
    fn app() -> Router {
        let db = PgPoolOptions::new().connect_lazy("postgres://storefront@localhost/unused").unwrap();
        let config = Config::from_lookup(|key| (key == "DATABASE_URL").then(|| "postgres://storefront@localhost/unused".to_string())).unwrap();
        router(AppState::new(db, config, EventPublisher::default()))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_cart_routes_require_token() {
        for (method, uri) in [
            (Method::GET, "/carts"),
            (Method::POST, "/carts"),
            (Method::DELETE, "/carts"),
            (Method::POST, "/carts/checkout"),
            (Method::PUT, "/carts/1"),
            (Method::DELETE, "/api/carts/1"),
            (Method::GET, "/user"),
            (Method::POST, "/logout"),
        ] {
            let (status, body) = send(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["message"], "Unauthenticated.");
        }
    }

    #[tokio::test]
    async fn test_malformed_token_is_unauthenticated() {
        let request = Request::builder()
            .uri("/carts")
            .header(header::AUTHORIZATION, "Bearer not-a-token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_inventories_require_ids() {
        let (status, body) = send(Request::builder().uri("/inventories").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "inventories id is required");

        let (status, body) = send(Request::builder().uri("/api/inventories?id=1,x").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["id"].is_array());
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_error() {
        for uri in ["/products/abc", "/api/products/1.5"] {
            let response = app().oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["message"], "The id must be an integer.");
            assert_eq!(body["errors"]["id"][0], "The id must be an integer.");
        }
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (status, body) = send(json_request(Method::POST, "/register", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"][0], "The name field is required.");
        assert_eq!(body["errors"]["email"][0], "The email field is required.");
        assert_eq!(body["errors"]["password"][0], "The password field is required.");

        let (status, body) = send(json_request(
            Method::POST,
            "/api/register",
            serde_json::json!({"name": "allen", "email": "allen@example.com", "password": "a", "password_confirmation": "b"}),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "The password confirmation does not match.");
    }

    #[tokio::test]
    async fn test_register_rejects_blank_name() {
        let (status, body) = send(json_request(
            Method::POST,
            "/register",
            serde_json::json!({"name": "   ", "email": "allen@example.com", "password": "a", "password_confirmation": "a"}),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"][0], "The name field is required.");
    }

    #[tokio::test]
    async fn test_register_rejects_non_json() {
        let request = Request::builder().method(Method::POST).uri("/register").body(Body::from("name=allen")).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["body"].is_array());
    }

    #[tokio::test]
    async fn test_login_validation() {
        let (status, body) = send(json_request(Method::POST, "/login", serde_json::json!({"email": "nope"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["email"].is_array());
        assert!(body["errors"]["password"].is_array());
    }
}
