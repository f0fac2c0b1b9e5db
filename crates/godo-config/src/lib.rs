// ============================================================================
// GoDo Config - Centralized configuration management
// ============================================================================
//
// Loads the server configuration from environment variables (and an optional
// `.env` file) with sensible defaults for everything except DATABASE_URL.
//
// ============================================================================

mod chat;
mod constants;
mod database;
mod logging;
mod push;
mod redis;

pub use chat::ChatConfig;
pub use constants::{
    LAST_MESSAGE_PREVIEW_CHARS, MAX_CONVERSATION_PARTICIPANTS, MAX_MESSAGE_LENGTH,
    SECONDS_PER_HOUR,
};
pub use database::{DbConfig, StorageBackend};
pub use logging::LoggingConfig;
pub use push::PushConfig;
pub use redis::RedisChannels;

use anyhow::Result;
use constants::*;

/// Main configuration structure for the GoDo server
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,

    /// Without Redis, chat fan-out stays inside this process (single worker only)
    pub redis_url: Option<String>,

    /// HMAC secret for HS256 tokens
    pub jwt_secret: Option<String>,

    /// RSA public key for RS256 verification (PEM or path to a PEM file)
    pub jwt_public_key: Option<String>,

    pub jwt_issuer: String,
    pub access_token_ttl_hours: i64,

    pub port: u16,
    pub bind_address: String,
    pub rust_log: String,
    pub storage_backend: StorageBackend,

    // Sub-configurations
    pub db: DbConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
    pub push: PushConfig,
    pub redis_channels: RedisChannels,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let storage_backend = StorageBackend::from_env()?;
        let database_url = match storage_backend {
            StorageBackend::Postgres => std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            StorageBackend::Memory => std::env::var("DATABASE_URL").unwrap_or_default(),
        };

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let config = Self {
            database_url,
            redis_url: std::env::var("REDIS_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),

            jwt_secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            jwt_public_key: Self::load_jwt_public_key(),

            jwt_issuer: std::env::var("JWT_ISSUER")
                .unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string()),
            access_token_ttl_hours: std::env::var("ACCESS_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_HOURS),

            port,
            bind_address: format!("0.0.0.0:{}", port),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            storage_backend,

            db: DbConfig::from_env(),
            chat: ChatConfig::from_env(),
            logging: LoggingConfig::from_env(),
            push: PushConfig::from_env(),
            redis_channels: RedisChannels::from_env(),
        };

        if config.jwt_secret.is_none() && config.jwt_public_key.is_none() {
            anyhow::bail!("Either JWT_SECRET or JWT_PUBLIC_KEY must be set");
        }

        Ok(config)
    }

    /// In-memory configuration with defaults, signing tokens with `jwt_secret`
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: String::new(),
            redis_url: None,
            jwt_secret: Some(jwt_secret.into()),
            jwt_public_key: None,
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            access_token_ttl_hours: DEFAULT_ACCESS_TOKEN_TTL_HOURS,
            port: 0,
            bind_address: "127.0.0.1:0".to_string(),
            rust_log: "info".to_string(),
            storage_backend: StorageBackend::Memory,
            db: DbConfig::default(),
            chat: ChatConfig::default(),
            logging: LoggingConfig::default(),
            push: PushConfig::default(),
            redis_channels: RedisChannels::default(),
        }
    }

    fn load_jwt_public_key() -> Option<String> {
        std::env::var("JWT_PUBLIC_KEY").ok().map(|key| {
            if key.starts_with("-----BEGIN") || !key.contains(std::path::MAIN_SEPARATOR) {
                key
            } else {
                std::fs::read_to_string(&key).unwrap_or_else(|e| {
                    tracing::warn!(
                        error = %e,
                        path = %key,
                        "Failed to read JWT_PUBLIC_KEY from file, using as-is"
                    );
                    key
                })
            }
        })
    }
}
