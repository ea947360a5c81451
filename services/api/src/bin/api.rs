//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{MemoryStore, PgStore},
    config::{Config, Storage},
    error::ApiError,
    web::{build_router, state::AppState},
};
use progress_core::ports::{BadgeCatalog, LearnerStore, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Storage & Run Migrations ---
    let (learners, badges): (Arc<dyn LearnerStore>, Arc<dyn BadgeCatalog>) = match &config.storage
    {
        Storage::Postgres(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(database_url)
                .await?;
            let store = Arc::new(PgStore::new(db_pool));
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");
            let learners: Arc<dyn LearnerStore> = store.clone();
            let badges: Arc<dyn BadgeCatalog> = store;
            (learners, badges)
        }
        Storage::Memory => {
            warn!("Using in-memory storage; all progress is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            let learners: Arc<dyn LearnerStore> = store.clone();
            let badges: Arc<dyn BadgeCatalog> = store;
            (learners, badges)
        }
    };

    // --- 3. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        learners,
        badges,
        Arc::new(SystemClock),
    ));
    let app = build_router(app_state)?;

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
