// ============================================================================
// Message Persistence
// ============================================================================
//
// filter -> store -> (audit). The stored message is the only thing callers
// may broadcast; a failed insert leaves nothing to broadcast.
//
// ============================================================================

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use godo_moderation::ContentFilter;

use crate::metrics;
use crate::moderation::{AuditEntry, ModerationAction};
use crate::store::{Message, NewMessage, Store};

#[derive(Clone)]
pub struct MessagePersistence {
    store: Arc<dyn Store>,
    filter: ContentFilter,
}

impl MessagePersistence {
    pub fn new(store: Arc<dyn Store>, filter: ContentFilter) -> Self {
        Self { store, filter }
    }

    /// Filters and stores one message. No retries: store errors propagate.
    pub async fn send(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        raw_content: &str,
    ) -> Result<Message> {
        let result = self.filter.filter(Some(raw_content)).await;

        let new_message = if result.is_clean {
            NewMessage {
                conversation_id,
                sender_id,
                content: raw_content.to_string(),
                is_filtered: false,
                original_content: None,
            }
        } else {
            NewMessage {
                conversation_id,
                sender_id,
                content: result.filtered_text.clone(),
                is_filtered: true,
                original_content: Some(raw_content.to_string()),
            }
        };

        let message = self.store.insert_message(new_message).await?;
        metrics::MESSAGES_SENT_TOTAL.inc();

        if message.is_filtered {
            metrics::MESSAGES_FILTERED_TOTAL.inc();

            let kinds: Vec<&str> = result.violations.iter().map(|v| v.kind.as_str()).collect();
            let entry = AuditEntry {
                id: Uuid::new_v4(),
                moderator_id: None,
                target_user_id: sender_id,
                action: ModerationAction::ContentFiltered,
                reason: format!("message {}: {}", message.id, kinds.join(", ")),
                created_at: Utc::now(),
            };
            if let Err(e) = self.store.append_audit(&entry).await {
                tracing::warn!(
                    error = %e,
                    message_id = %message.id,
                    "Failed to record content filter audit entry"
                );
            }
        }

        Ok(message)
    }
}
