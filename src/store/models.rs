// ============================================================================
// Chat Data Model
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    /// Device token for push notifications
    #[serde(skip_serializing)]
    pub fcm_token: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            display_name: display_name.map(str::to_string),
            is_active: true,
            fcm_token: None,
        }
    }

    /// Name shown to other users: display name, else the local part of the email
    pub fn public_name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    Activity,
    Direct,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Activity => "activity",
            ConversationType::Direct => "direct",
        }
    }
}

impl FromStr for ConversationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activity" => Ok(ConversationType::Activity),
            "direct" => Ok(ConversationType::Direct),
            other => anyhow::bail!("Unknown conversation type '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: Uuid,
    pub conversation_type: ConversationType,
    pub activity_id: Option<Uuid>,
    /// Unique, unordered
    pub participant_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Advances on every stored message
    pub last_message_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: &Uuid) -> bool {
        self.participant_ids.contains(user_id)
    }
}

/// A stored chat message.
///
/// `original_content` is only set when the filter altered the text and must
/// never leave the server in a client payload.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub is_filtered: bool,
    pub original_content: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Message about to be persisted
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub is_filtered: bool,
    pub original_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TypingIndicator {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub is_typing: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_name_prefers_display_name() {
        let user = User::new("ayse@example.com", Some("Ayşe"));
        assert_eq!(user.public_name(), "Ayşe");
    }

    #[test]
    fn test_public_name_falls_back_to_email_prefix() {
        let user = User::new("mehmet.k@example.com", Some("  "));
        assert_eq!(user.public_name(), "mehmet.k");
    }

    #[test]
    fn test_conversation_type_round_trips_through_text() {
        for kind in [ConversationType::Activity, ConversationType::Direct] {
            assert_eq!(kind.as_str().parse::<ConversationType>().unwrap(), kind);
        }
        assert!("group".parse::<ConversationType>().is_err());
    }
}
