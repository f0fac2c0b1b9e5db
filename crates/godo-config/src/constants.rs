// ============================================================================
// Configuration Constants
// ============================================================================

pub(crate) const DEFAULT_PORT: u16 = 8080;

pub(crate) const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;
pub(crate) const DEFAULT_JWT_ISSUER: &str = "godo";

// Chat
pub(crate) const DEFAULT_TYPING_INDICATOR_TTL_SECS: i64 = 10;
pub(crate) const DEFAULT_TYPING_SWEEP_INTERVAL_SECS: u64 = 5;
pub(crate) const DEFAULT_BROADCAST_BUFFER: usize = 256;

/// Maximum length (in characters) of a chat message sent over HTTP
pub const MAX_MESSAGE_LENGTH: usize = 2000;
/// Maximum number of participant ids accepted by conversation creation
pub const MAX_CONVERSATION_PARTICIPANTS: usize = 10;
/// Number of characters kept in a conversation list "last message" preview
pub const LAST_MESSAGE_PREVIEW_CHARS: usize = 100;

pub const SECONDS_PER_HOUR: i64 = 3600;
