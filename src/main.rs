//! ShopSquare Storefront - customer and seller storefront service

use anyhow::Result;
use shopsquare_storefront::config::Config;
use shopsquare_storefront::domain::events::NatsSink;
use shopsquare_storefront::routes::{router, AppState};
use shopsquare_storefront::session::Session;
use shopsquare_storefront::store::{HttpStorefront, MemoryStore, Storefront};
use shopsquare_storefront::Marketplace;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let store: Arc<dyn Storefront> = match &config.api_url {
        Some(url) => {
            tracing::info!(api = %url, "using marketplace backend");
            Arc::new(HttpStorefront::new(url.as_str(), config.api_timeout)?)
        }
        None => {
            tracing::warn!("STOREFRONT_API_URL not set; serving the in-memory demo catalog");
            Arc::new(MemoryStore::demo().await)
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "NATS unavailable; events will not be published");
                None
            }
        },
        None => None,
    };

    let session = Arc::new(Session::load(&config.session_path).await);
    let marketplace = Marketplace::new(store, Arc::new(NatsSink::new(nats)));
    let app = router(AppState { marketplace, session });

    tracing::info!("🚀 ShopSquare Storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
