use std::net::SocketAddr;
use std::sync::Arc;

use tourbook_api::{app, AppState};
use tourbook_core::DraftStore;
use tourbook_order::MockSupplier;
use tourbook_store::{app_config::Config, MemoryDraftStore, RedisDraftStore, SupplierHttpClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tourbook_api=debug,tourbook_order=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Tourbook API on port {}", config.server.port);

    let store: Arc<dyn DraftStore> = match &config.redis {
        Some(redis) => Arc::new(RedisDraftStore::new(&redis.url, redis.draft_ttl_seconds)?),
        None => {
            tracing::warn!("No Redis configured, drafts are kept in process memory");
            Arc::new(MemoryDraftStore::new())
        }
    };

    let app_state = if config.supplier.mock {
        tracing::warn!("Serving bookings from the mock supplier");
        let mock = Arc::new(MockSupplier::new());
        AppState::new(
            store,
            mock.clone(),
            mock.clone(),
            mock,
            config.business_rules.clone(),
            config.timeouts.clone(),
        )
    } else {
        let client = Arc::new(SupplierHttpClient::new(
            &config.supplier.base_url,
            config.supplier.api_key.clone(),
        ));
        AppState::new(
            store,
            client.clone(),
            client.clone(),
            client,
            config.business_rules.clone(),
            config.timeouts.clone(),
        )
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
