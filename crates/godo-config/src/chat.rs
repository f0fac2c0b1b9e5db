// ============================================================================
// Chat Configuration
// ============================================================================

use crate::constants::*;

/// Real-time chat tuning knobs
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Typing indicators older than this are reaped by the sweep task
    pub typing_indicator_ttl_secs: i64,
    pub typing_sweep_interval_secs: u64,
    pub max_message_length: usize,
    pub max_conversation_participants: usize,
    /// Per-conversation in-process broadcast buffer (events)
    pub broadcast_buffer: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_indicator_ttl_secs: DEFAULT_TYPING_INDICATOR_TTL_SECS,
            typing_sweep_interval_secs: DEFAULT_TYPING_SWEEP_INTERVAL_SECS,
            max_message_length: MAX_MESSAGE_LENGTH,
            max_conversation_participants: MAX_CONVERSATION_PARTICIPANTS,
            broadcast_buffer: DEFAULT_BROADCAST_BUFFER,
        }
    }
}

impl ChatConfig {
    pub(crate) fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            typing_indicator_ttl_secs: std::env::var("TYPING_INDICATOR_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.typing_indicator_ttl_secs),
            typing_sweep_interval_secs: std::env::var("TYPING_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.typing_sweep_interval_secs),
            max_message_length: std::env::var("MAX_MESSAGE_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_message_length),
            max_conversation_participants: std::env::var("MAX_CONVERSATION_PARTICIPANTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_conversation_participants),
            broadcast_buffer: std::env::var("BROADCAST_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.broadcast_buffer),
        }
    }
}
