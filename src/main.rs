//! FraudShield API Server
//!
//! Scores card transactions for fraud risk and runs an OTP step-up
//! challenge for risky ones.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      FRAUDSHIELD API                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │  │  API      │──▶│  Scorer      │──▶│  Risk tiers         │  │
//! │  │  (Axum)   │   │  (model +    │   │  LOW / MEDIUM / HIGH│  │
//! │  │           │   │   scaler)    │   └─────────────────────┘  │
//! │  │           │   └──────────────┘                            │
//! │  │           │──▶┌──────────────┐                            │
//! │  └─────┬─────┘   │  OTP engine  │                            │
//! │        │         └──────┬───────┘                            │
//! │        └────────────────┼────────────────────────────────────│
//! │                         ▼                                    │
//! │                ┌─────────────────┐                           │
//! │                │ PostgreSQL /    │                           │
//! │                │ in-memory store │                           │
//! │                └─────────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod otp;
mod scoring;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use config::{Config, StoreBackend};
use otp::OtpEngine;
use scoring::Scorer;
use store::{MemoryStore, PgStore, TransactionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    init_tracing(&config);

    tracing::info!("FraudShield API starting ({})...", config.environment);

    // Model artifacts are loaded once and shared read-only
    let scorer = Scorer::load(&config.model_path, &config.scaler_path)
        .with_context(|| format!("loading model {} / scaler {}", config.model_path, config.scaler_path))?;
    tracing::info!("Model loaded: {}", scorer.describe());

    let store: Arc<dyn TransactionStore> = match config.store_backend {
        StoreBackend::Postgres => {
            tracing::info!("Database: {}", config.database_host());

            let pool = db::create_pool(&config.database_url, config.database_max_connections)
                .await
                .context("Failed to create database pool")?;

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;

            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    if config.echo_otp && config.is_production() {
        tracing::warn!("OTP_ECHO is enabled in production: one-time codes are returned to API callers");
    }

    // Build application state
    let state = AppState::new(store, scorer, config.clone());

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fraudshield_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TransactionStore>,
    pub scorer: Scorer,
    pub otp: OtpEngine,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn TransactionStore>, scorer: Scorer, config: Config) -> Self {
        Self {
            otp: OtpEngine::new(store.clone()),
            store,
            scorer,
            config,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let cors_permissive = state.config.cors_permissive;

    let app = Router::new()
        .route("/health", get(handlers::health::check))

        // Scoring
        .route("/check-transaction", post(handlers::transactions::check))
        .route("/initiate-transaction", post(handlers::transactions::initiate))

        // Step-up verification
        .route("/verify-otp", post(handlers::otp::verify))

        // Reads
        .route("/transactions", get(handlers::transactions::list))
        .route("/fraud-cases", get(handlers::transactions::fraud_cases))

        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let app = if cors_permissive {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
    } else {
        app
    };

    app.with_state(state)
}
