use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One moderator-managed pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedWord {
    pub pattern: String,
    /// `false` means a literal, case-insensitive substring
    pub is_regex: bool,
}

impl BannedWord {
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            is_regex: false,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            is_regex: true,
        }
    }
}

/// Source of the active banned-word set.
///
/// Consulted on every filter call; implementations must not cache in a way
/// that hides moderator changes from the next call.
#[async_trait]
pub trait BannedWordStore: Send + Sync {
    /// Active entries in a stable order
    async fn active_entries(&self) -> anyhow::Result<Vec<BannedWord>>;
}

/// Fixed banned-word list
#[derive(Debug, Clone, Default)]
pub struct StaticBannedWords(pub Vec<BannedWord>);

#[async_trait]
impl BannedWordStore for StaticBannedWords {
    async fn active_entries(&self) -> anyhow::Result<Vec<BannedWord>> {
        Ok(self.0.clone())
    }
}
