// ============================================================================
// Logging Configuration
// ============================================================================

const DEV_HASH_SALT: &str = "godo-dev-salt";

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log raw user ids instead of salted hashes
    pub enable_user_identifiers: bool,
    pub hash_salt: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_user_identifiers: false,
            hash_salt: DEV_HASH_SALT.to_string(),
        }
    }
}

impl LoggingConfig {
    pub(crate) fn from_env() -> Self {
        let hash_salt = std::env::var("LOG_HASH_SALT").unwrap_or_default();
        let hash_salt = if hash_salt.is_empty() {
            tracing::warn!("LOG_HASH_SALT is not set, falling back to the development salt");
            DEV_HASH_SALT.to_string()
        } else {
            hash_salt
        };

        Self {
            enable_user_identifiers: std::env::var("LOG_USER_IDENTIFIERS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            hash_salt,
        }
    }
}
