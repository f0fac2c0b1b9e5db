use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod activities;
pub mod auth;
pub mod context;
pub mod db;
pub mod health;
pub mod messaging;
pub mod metrics;
pub mod moderation;
pub mod notifications;
pub mod routes;
pub mod store;
pub mod utils;

use godo_config::{Config, StorageBackend};
use godo_redis::RedisClient;

use context::AppContext;
use messaging::{ChannelHub, ChatBroadcaster, LocalBroadcaster, RedisBroadcaster, TypingSweepTask};
use store::{MemoryStore, PgStore, Store};

/// The HTTP and WebSocket application over a ready context
pub fn app(app_context: Arc<AppContext>) -> Router {
    routes::create_router(app_context)
}

/// Connects the configured store, broadcaster and push notifier
pub async fn build_context(config: Arc<Config>) -> Result<AppContext> {
    let store: Arc<dyn Store> = match config.storage_backend {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(&config)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            tracing::info!("Applying database migrations...");
            db::run_migrations(&pool)
                .await
                .context("Failed to apply database migrations")?;
            tracing::info!("Database migrations applied successfully");

            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let hub = ChannelHub::new(config.chat.broadcast_buffer);
    let broadcaster: Arc<dyn ChatBroadcaster> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Connecting to Redis...");
            let client = tokio::time::timeout(Duration::from_secs(10), RedisClient::connect(url))
                .await
                .map_err(|_| anyhow::anyhow!("Redis connection timed out after 10 seconds"))?
                .context("Failed to connect to Redis")?;
            tracing::info!("Connected to Redis");
            Arc::new(RedisBroadcaster::start(
                client,
                hub,
                config.redis_channels.clone(),
            ))
        }
        None => {
            tracing::info!("REDIS_URL not set; chat events stay within this process");
            Arc::new(LocalBroadcaster::new(hub))
        }
    };

    let notifier = notifications::notifier_from_config(&config.push)
        .context("Failed to initialize push notifier")?;

    AppContext::new(config, store, broadcaster, notifier)
}

pub async fn run() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("=== GoDo Server Starting ===");
    tracing::info!("Port: {}", config.port);

    let app_context = Arc::new(build_context(config.clone()).await?);

    let sweeper = TypingSweepTask::new(
        app_context.store.clone(),
        config.chat.typing_indicator_ttl_secs,
        Duration::from_secs(config.chat.typing_sweep_interval_secs),
    );
    let sweeper = tokio::spawn(sweeper.run());

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("GoDo server listening on {}", config.bind_address);

    axum::serve(listener, app(app_context))
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received. Shutting down...");
        })
        .await
        .context("Failed to start server")?;

    sweeper.abort();
    Ok(())
}
