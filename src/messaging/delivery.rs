// ============================================================================
// Chat Delivery
// ============================================================================
//
// The three chat actions shared by the real-time channel and the HTTP API:
// post a message, mark a conversation read, and signal typing. Each one
// writes first and broadcasts second.
//
// ============================================================================

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

use godo_config::LAST_MESSAGE_PREVIEW_CHARS;

use super::events::{ChatEnvelope, MessagePayload, ServerEvent};
use crate::context::AppContext;
use crate::notifications::{notify_users, PushNotification};
use crate::store::{Conversation, User};
use crate::utils::preview;

/// Persists `content` and broadcasts the stored form to the whole group,
/// sender included. Nothing is broadcast if persistence fails.
pub async fn post_message(
    ctx: &AppContext,
    conversation: &Conversation,
    sender: &User,
    content: &str,
) -> Result<MessagePayload> {
    let message = ctx
        .persistence
        .send(conversation.id, sender.id, content)
        .await?;
    let payload = MessagePayload::from_message(&message, sender.public_name());

    publish(
        ctx,
        ChatEnvelope::new(
            conversation.id,
            sender.id,
            ServerEvent::ChatMessage {
                message: payload.clone(),
            },
        ),
    )
    .await;

    push_to_other_participants(ctx, conversation, sender, &payload).await;

    Ok(payload)
}

/// Marks everything `reader` has not read yet, then broadcasts a receipt.
/// Returns how many messages changed.
pub async fn mark_read(ctx: &AppContext, conversation_id: Uuid, reader_id: Uuid) -> Result<u64> {
    let updated = ctx.store.mark_read(conversation_id, reader_id).await?;

    publish(
        ctx,
        ChatEnvelope::new(
            conversation_id,
            reader_id,
            ServerEvent::Read { user_id: reader_id },
        ),
    )
    .await;

    Ok(updated)
}

/// Records and broadcasts a typing change to everyone but `user`
pub async fn set_typing(ctx: &AppContext, conversation_id: Uuid, user: &User, is_typing: bool) {
    if let Err(e) = ctx
        .store
        .upsert_typing(conversation_id, user.id, is_typing)
        .await
    {
        tracing::warn!(
            error = %e,
            conversation_id = %conversation_id,
            "Failed to record typing indicator"
        );
    }

    publish(
        ctx,
        ChatEnvelope::new(
            conversation_id,
            user.id,
            ServerEvent::Typing {
                user_id: user.id,
                user_name: user.public_name(),
                is_typing,
            },
        ),
    )
    .await;
}

async fn publish(ctx: &AppContext, envelope: ChatEnvelope) {
    let conversation_id = envelope.conversation_id;
    if let Err(e) = ctx.broadcaster.publish(envelope).await {
        tracing::warn!(
            error = %e,
            conversation_id = %conversation_id,
            "Failed to broadcast chat event"
        );
    }
}

async fn push_to_other_participants(
    ctx: &AppContext,
    conversation: &Conversation,
    sender: &User,
    payload: &MessagePayload,
) {
    let others: Vec<Uuid> = conversation
        .participant_ids
        .iter()
        .copied()
        .filter(|id| *id != sender.id)
        .collect();
    if others.is_empty() {
        return;
    }

    match ctx.store.active_users(&others).await {
        Ok(recipients) => notify_users(
            ctx.notifier.clone(),
            recipients,
            PushNotification::new(
                payload.sender_name.clone(),
                preview(&payload.content, LAST_MESSAGE_PREVIEW_CHARS),
                json!({
                    "type": "chat_message",
                    "conversation_id": conversation.id,
                    "message_id": payload.id,
                }),
            ),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load push recipients");
        }
    }
}
