use sha2::{Digest, Sha256};
use uuid::Uuid;

use godo_config::LoggingConfig;

/// Creates a truncated, salted hash of an identifier for safe logging.
pub fn log_safe_id(id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(id.as_bytes());
    let hash = hasher.finalize();

    // First 4 bytes as hex
    hash[..4]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

/// User id as it should appear in info-level logs
pub fn loggable_user(user_id: &Uuid, logging: &LoggingConfig) -> String {
    if logging.enable_user_identifiers {
        user_id.to_string()
    } else {
        log_safe_id(&user_id.to_string(), &logging.hash_salt)
    }
}

/// First `max_chars` characters of `text`, on a char boundary
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
