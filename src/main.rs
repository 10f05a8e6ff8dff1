//! OpenSASE Storefront - catalog, carts and checkout over HTTP

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_storefront::{api, config::Config, db, domain::events::EventPublisher};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;
    if config.seed_demo_data {
        db::seed_demo_data(&pool).await?;
    }

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("NATS unavailable at {}, cart events will only be logged: {}", url, e);
                None
            }
        },
        None => None,
    };

    let addr = config.bind_address();
    tracing::info!(policy = %config.cart_add_policy, "cart add policy");
    let state = api::AppState::new(pool, config, EventPublisher::new(nats));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("🚀 OpenSASE Storefront listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
