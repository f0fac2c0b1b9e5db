// ============================================================================
// Chat Wire Events
// ============================================================================
//
// JSON text frames tagged by "type". The same ServerEvent values travel
// between workers inside a ChatEnvelope.
//
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Message;

/// Frames a joined client may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    ChatMessage {
        #[serde(default)]
        content: String,
    },
    Typing {
        #[serde(default)]
        is_typing: bool,
    },
    Read,
}

impl ClientEvent {
    /// `None` for anything undecodable
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Frames the server pushes to joined clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    ChatMessage {
        message: MessagePayload,
    },
    Typing {
        user_id: Uuid,
        user_name: String,
        is_typing: bool,
    },
    Read {
        user_id: Uuid,
    },
}

impl ServerEvent {
    /// Typing echoes are never delivered to their own sender
    pub fn excludes_origin(&self) -> bool {
        matches!(self, ServerEvent::Typing { .. })
    }
}

/// Client-facing view of a stored message. Never carries the unfiltered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
    pub is_filtered: bool,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MessagePayload {
    pub fn from_message(message: &Message, sender_name: impl Into<String>) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            sender_name: sender_name.into(),
            content: message.content.clone(),
            is_filtered: message.is_filtered,
            is_read: message.is_read,
            read_at: message.read_at,
            created_at: message.created_at,
        }
    }
}

/// A server event addressed to one conversation's broadcast group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub conversation_id: Uuid,
    /// User whose action produced the event
    pub origin_user_id: Uuid,
    pub event: ServerEvent,
}

impl ChatEnvelope {
    pub fn new(conversation_id: Uuid, origin_user_id: Uuid, event: ServerEvent) -> Self {
        Self {
            conversation_id,
            origin_user_id,
            event,
        }
    }

    /// Whether a member connected as `user_id` should receive this envelope
    pub fn is_for(&self, user_id: Uuid) -> bool {
        !(self.event.excludes_origin() && self.origin_user_id == user_id)
    }
}
