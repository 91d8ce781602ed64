mod admin;
mod auth;
mod chat;
mod config;
mod db;
mod discussions;
mod errors;
mod models;
mod profiles;
mod referrals;
mod resume;
mod routes;
mod state;
mod validation;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing or invalid env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_PKG_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Alumnet API v{}", env!("CARGO_PKG_VERSION"));

    // Redis is optional: without it the referral limiter counts in process.
    let redis = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("Invalid REDIS_URL")?;
            info!("Redis client initialized for referral rate limiting");
            Some(client)
        }
        None => {
            warn!("REDIS_URL not set; referral rate limits are per process");
            None
        }
    };

    let state = match &config.storage {
        StorageBackend::Postgres { database_url } => {
            let db = create_pool(database_url).await?;
            info!("PostgreSQL pool ready, migrations applied");
            AppState::postgres(config.clone(), db, redis)
        }
        StorageBackend::Memory => {
            warn!("STORAGE_BACKEND=memory; data will not survive a restart");
            AppState::in_memory(config.clone(), redis)
        }
    };
    info!(
        "Resume scorer: {:?}, referral limit: {}/day",
        config.resume_scorer, config.referral_daily_limit
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
