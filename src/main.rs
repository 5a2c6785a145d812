//! VeriChain Product Authenticity Server
//!
//! Verifies physical products on every scan, flags anomalous movement in
//! real time, and drives the downstream consequences: durable scan/alert
//! records, live dashboard fan-out, and user rewards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        VERICHAIN                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────┐  ┌──────────────────────┐ │
//! │  │  API      │  │  Scan        │  │  Broadcast Hub       │ │
//! │  │  Gateway  │  │  Processor   │  │  (WebSocket fan-out) │ │
//! │  │  (Axum)   │  │  + Rewards   │  │                      │ │
//! │  └─────┬─────┘  └──────┬───────┘  └──────────┬───────────┘ │
//! │        └───────────────┼─────────────────────┘              │
//! │                        ▼                                    │
//! │                 ┌─────────────┐                             │
//! │                 │ PostgreSQL  │                             │
//! │                 └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod error;
mod handlers;
mod hub;
mod models;
mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;

use hub::Hub;
use services::classifier::ThresholdModel;
use services::verification::ScanProcessor;
use services::vision::VisionGateway;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "verichain=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("VeriChain server starting...");
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .expect("Failed to create database pool");

    // Run migrations and seed the badge catalog
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .expect("Failed to run migrations");
    db::seed_badges(&pool).await
        .expect("Failed to seed badge catalog");

    // Load the anomaly model once; refuse to start without it
    let classifier = Arc::new(
        ThresholdModel::load(&config.model_path)
            .expect("Failed to load anomaly model"),
    );

    let hub = Arc::new(Hub::new());
    let processor = ScanProcessor::new(pool.clone(), classifier, hub.clone());
    let vision = VisionGateway::new(config.vision_url.clone());

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
        hub,
        processor,
        vision,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub hub: Arc<Hub>,
    pub processor: ScanProcessor,
    pub vision: VisionGateway,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))

        // Scan verification (the core pipeline)
        .route("/api/v1/scans/verify", post(handlers::scans::verify))
        .route("/api/v1/scans/verify/image", post(handlers::scans::verify_image))

        // Products & provenance
        .route("/api/v1/products", get(handlers::products::list))
        .route("/api/v1/products", post(handlers::products::create))
        .route("/api/v1/products/:sku", get(handlers::products::get))
        .route("/api/v1/products/:sku/journey", get(handlers::products::journey))

        // Suppliers
        .route("/api/v1/suppliers", get(handlers::suppliers::list))
        .route("/api/v1/suppliers", post(handlers::suppliers::create))

        // Users & rewards
        .route("/api/v1/users", post(handlers::users::create))
        .route("/api/v1/users/:customer_code/profile", get(handlers::users::profile))

        // Alerts (dashboard workflow)
        .route("/api/v1/alerts", get(handlers::alerts::list))
        .route("/api/v1/alerts/:id", get(handlers::alerts::get))
        .route("/api/v1/alerts/:id/status", put(handlers::alerts::update_status))

        // Live dashboard feed
        .route("/ws/alerts", get(hub::websocket_handler))

        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
