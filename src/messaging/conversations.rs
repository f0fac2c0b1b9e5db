// ============================================================================
// Conversation Workflows
// ============================================================================
//
// Request-level operations behind the conversations HTTP API. Every lookup is
// scoped to the caller: a conversation the caller is not in answers exactly
// like one that does not exist.
//
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use godo_config::LAST_MESSAGE_PREVIEW_CHARS;
use godo_error::{AppError, AppResult};

use super::delivery;
use super::events::MessagePayload;
use crate::context::AppContext;
use crate::store::{Conversation, ConversationType, Message, User};
use crate::utils::preview;

pub const CONVERSATION_NOT_FOUND: &str = "Sohbet bulunamadı.";
pub const BLOCKED_PARTICIPANT: &str = "Engellenmiş kullanıcılarla sohbet başlatamazsınız.";
const SELF_CONVERSATION: &str = "Kendinizle sohbet başlatamazsınız.";
const USER_NOT_FOUND: &str = "Kullanıcı bulunamadı.";

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub participant_ids: Vec<Uuid>,
    pub activity_id: Option<Uuid>,
    #[serde(default)]
    pub initial_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: Uuid,
    pub name: String,
}

impl From<&User> for ParticipantView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.public_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: MessagePayload,
    pub is_mine: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessagePreview {
    pub content: String,
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub conversation_type: ConversationType,
    pub participants: Vec<ParticipantView>,
    pub activity_title: Option<String>,
    pub last_message: Option<LastMessagePreview>,
    pub unread_count: i64,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub id: Uuid,
    pub conversation_type: ConversationType,
    pub participants: Vec<ParticipantView>,
    pub activity_title: Option<String>,
    pub messages: Vec<MessageView>,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Caller's conversations, most recently active first
pub async fn list_conversations(
    ctx: &AppContext,
    user: &User,
) -> AppResult<Vec<ConversationSummary>> {
    let conversations = ctx.store.conversations_for_user(user.id).await?;
    let mut summaries = Vec::with_capacity(conversations.len());

    for conversation in conversations {
        let participants = participants_of(ctx, &conversation).await?;
        let names: HashMap<Uuid, String> = participants
            .iter()
            .map(|p| (p.id, p.name.clone()))
            .collect();

        let last_message = match ctx.store.last_message(conversation.id).await? {
            Some(message) => Some(LastMessagePreview {
                content: preview(&message.content, LAST_MESSAGE_PREVIEW_CHARS),
                sender_name: sender_name(ctx, &names, message.sender_id).await?,
                created_at: message.created_at,
            }),
            None => None,
        };

        summaries.push(ConversationSummary {
            id: conversation.id,
            conversation_type: conversation.conversation_type,
            activity_title: activity_title(ctx, &conversation).await?,
            unread_count: ctx.store.unread_count(conversation.id, user.id).await?,
            last_message,
            participants,
            last_message_at: conversation.last_message_at,
            created_at: conversation.created_at,
        });
    }

    Ok(summaries)
}

/// Creates a conversation, or returns the existing direct one for the pair.
/// The flag is `true` when a new conversation was created.
pub async fn create_conversation(
    ctx: &AppContext,
    creator: &User,
    request: CreateConversationRequest,
) -> AppResult<(ConversationDetail, bool)> {
    let max = ctx.config.chat.max_conversation_participants;
    if request.participant_ids.is_empty() || request.participant_ids.len() > max {
        return Err(AppError::validation(format!(
            "Katılımcı sayısı 1 ile {} arasında olmalıdır.",
            max
        )));
    }

    let initial_message = request
        .initial_message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    if let Some(message) = &initial_message {
        if message.chars().count() > ctx.config.chat.max_message_length {
            return Err(AppError::validation(format!(
                "Mesaj en fazla {} karakter olabilir.",
                ctx.config.chat.max_message_length
            )));
        }
    }

    if ctx
        .store
        .any_block_between(creator.id, &request.participant_ids)
        .await?
    {
        return Err(AppError::validation(BLOCKED_PARTICIPANT));
    }

    let mut others: Vec<Uuid> = Vec::with_capacity(request.participant_ids.len());
    for id in &request.participant_ids {
        if *id != creator.id && !others.contains(id) {
            others.push(*id);
        }
    }

    if others.is_empty() {
        return Err(AppError::validation(SELF_CONVERSATION));
    }

    if request.activity_id.is_none() && others.len() == 1 {
        if let Some(existing) = ctx
            .store
            .find_direct_conversation(creator.id, others[0])
            .await?
        {
            tracing::debug!(conversation_id = %existing.id, "Reusing direct conversation");
            return Ok((detail(ctx, &existing, creator).await?, false));
        }
    }

    if let Some(activity_id) = request.activity_id {
        if ctx.store.get_activity(activity_id).await?.is_none() {
            return Err(AppError::not_found("Aktivite bulunamadı."));
        }
    }

    let active: Vec<Uuid> = ctx
        .store
        .active_users(&others)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();
    if active.is_empty() {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }

    let conversation = if request.activity_id.is_none() && others.len() == 1 {
        let (conversation, created) = ctx
            .store
            .find_or_create_direct(creator.id, active[0])
            .await?;
        // Another create for the same pair won the race
        if !created {
            tracing::debug!(conversation_id = %conversation.id, "Reusing direct conversation");
            return Ok((detail(ctx, &conversation, creator).await?, false));
        }
        conversation
    } else {
        let mut participant_ids = vec![creator.id];
        participant_ids.extend(active);

        let conversation_type = if request.activity_id.is_some() {
            ConversationType::Activity
        } else {
            ConversationType::Direct
        };
        ctx.store
            .create_conversation(conversation_type, request.activity_id, &participant_ids)
            .await?
    };

    tracing::info!(
        conversation_id = %conversation.id,
        conversation_type = conversation.conversation_type.as_str(),
        participants = conversation.participant_ids.len(),
        "Conversation created"
    );

    if let Some(message) = initial_message {
        delivery::post_message(ctx, &conversation, creator, &message).await?;
    }

    // Re-read so last_message_at reflects the initial message
    let conversation = ctx
        .store
        .get_conversation(conversation.id)
        .await?
        .unwrap_or(conversation);

    Ok((detail(ctx, &conversation, creator).await?, true))
}

/// Conversation with its messages. Viewing marks incoming messages read.
pub async fn conversation_detail(
    ctx: &AppContext,
    user: &User,
    conversation_id: Uuid,
) -> AppResult<ConversationDetail> {
    let conversation = conversation_for(ctx, user, conversation_id).await?;
    let marked = delivery::mark_read(ctx, conversation.id, user.id).await?;
    tracing::debug!(conversation_id = %conversation.id, marked = marked, "Conversation viewed");

    detail(ctx, &conversation, user).await
}

pub async fn send_message(
    ctx: &AppContext,
    user: &User,
    conversation_id: Uuid,
    content: &str,
) -> AppResult<MessageView> {
    let conversation = conversation_for(ctx, user, conversation_id).await?;

    let content = content.trim();
    let length = content.chars().count();
    if content.is_empty() || length > ctx.config.chat.max_message_length {
        return Err(AppError::validation(format!(
            "Mesaj 1 ile {} karakter arasında olmalıdır.",
            ctx.config.chat.max_message_length
        )));
    }

    let message = delivery::post_message(ctx, &conversation, user, content).await?;
    Ok(MessageView {
        message,
        is_mine: true,
    })
}

pub async fn mark_read(ctx: &AppContext, user: &User, conversation_id: Uuid) -> AppResult<u64> {
    let conversation = conversation_for(ctx, user, conversation_id).await?;
    Ok(delivery::mark_read(ctx, conversation.id, user.id).await?)
}

/// The conversation, if `user` takes part in it
async fn conversation_for(
    ctx: &AppContext,
    user: &User,
    conversation_id: Uuid,
) -> AppResult<Conversation> {
    match ctx.store.get_conversation(conversation_id).await? {
        Some(conversation) if conversation.has_participant(&user.id) => Ok(conversation),
        _ => Err(AppError::not_found(CONVERSATION_NOT_FOUND)),
    }
}

async fn detail(
    ctx: &AppContext,
    conversation: &Conversation,
    viewer: &User,
) -> AppResult<ConversationDetail> {
    let participants = participants_of(ctx, conversation).await?;
    let names: HashMap<Uuid, String> = participants
        .iter()
        .map(|p| (p.id, p.name.clone()))
        .collect();

    let stored: Vec<Message> = ctx.store.messages_for_conversation(conversation.id).await?;
    let mut messages = Vec::with_capacity(stored.len());
    for message in &stored {
        let name = sender_name(ctx, &names, message.sender_id).await?;
        messages.push(MessageView {
            message: MessagePayload::from_message(message, name),
            is_mine: message.sender_id == viewer.id,
        });
    }

    Ok(ConversationDetail {
        id: conversation.id,
        conversation_type: conversation.conversation_type,
        activity_title: activity_title(ctx, conversation).await?,
        participants,
        messages,
        last_message_at: conversation.last_message_at,
        created_at: conversation.created_at,
    })
}

async fn participants_of(
    ctx: &AppContext,
    conversation: &Conversation,
) -> AppResult<Vec<ParticipantView>> {
    let mut participants = Vec::with_capacity(conversation.participant_ids.len());
    for id in &conversation.participant_ids {
        if let Some(user) = ctx.store.get_user(*id).await? {
            participants.push(ParticipantView::from(&user));
        }
    }
    Ok(participants)
}

async fn sender_name(
    ctx: &AppContext,
    known: &HashMap<Uuid, String>,
    sender_id: Uuid,
) -> AppResult<String> {
    if let Some(name) = known.get(&sender_id) {
        return Ok(name.clone());
    }
    Ok(ctx
        .store
        .get_user(sender_id)
        .await?
        .map(|u| u.public_name())
        .unwrap_or_default())
}

async fn activity_title(ctx: &AppContext, conversation: &Conversation) -> AppResult<Option<String>> {
    match conversation.activity_id {
        Some(activity_id) => Ok(ctx
            .store
            .get_activity(activity_id)
            .await?
            .map(|a| a.title)),
        None => Ok(None),
    }
}
