//! Entry point: load config, wire dependencies, and run the server.

use std::sync::Arc;

use lemon_api::auth::Credentials;
use lemon_api::config::Config;
use lemon_api::db::{self, AccountStore, MemoryAccountStore, PgAccountStore};
use lemon_api::{cors_layer, create_app, AppState};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // missing token settings stop the process here, before anything listens
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let credentials =
        Credentials::from_config(&config).map_err(|e| anyhow::anyhow!("credentials: {}", e))?;

    let store: Arc<dyn AccountStore> = if config.uses_memory_store() {
        tracing::warn!("using in-memory account store; data is lost on exit");
        Arc::new(MemoryAccountStore::new())
    } else {
        let pool = db::create_pool(&config.database_url).await?;
        db::run_migrations(&pool).await?;
        Arc::new(PgAccountStore::new(pool))
    };

    let state = AppState::new(store, credentials);
    let app = create_app(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.cors_allow_origins)),
    );

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
