// ============================================================================
// Redis Configuration
// ============================================================================

/// Redis channel names configuration
#[derive(Clone, Debug)]
pub struct RedisChannels {
    /// Per-conversation chat channel prefix: "chat:{conversation_id}"
    pub chat_prefix: String,
}

impl Default for RedisChannels {
    fn default() -> Self {
        Self {
            chat_prefix: "chat:".to_string(),
        }
    }
}

impl RedisChannels {
    pub(crate) fn from_env() -> Self {
        Self {
            chat_prefix: std::env::var("REDIS_CHANNEL_CHAT_PREFIX")
                .unwrap_or_else(|_| Self::default().chat_prefix),
        }
    }

    /// Channel name for one conversation
    pub fn chat_channel(&self, conversation_id: impl std::fmt::Display) -> String {
        format!("{}{}", self.chat_prefix, conversation_id)
    }

    /// Pattern matching every conversation channel (for PSUBSCRIBE)
    pub fn chat_pattern(&self) -> String {
        format!("{}*", self.chat_prefix)
    }
}
