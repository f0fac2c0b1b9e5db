// ============================================================================
// Storage
// ============================================================================
//
// Trait-based storage interfaces, one per aggregate, combined as `Store`.
//
// Implementations:
// - postgres.rs: PgStore (sqlx, production)
// - memory.rs: MemoryStore (tokio RwLock, local development and tests)
//
// ============================================================================

mod memory;
pub mod models;
mod postgres;

pub use memory::MemoryStore;
pub use models::{Conversation, ConversationType, Message, NewMessage, TypingIndicator, User};
pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use godo_moderation::{BannedWord, BannedWordStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::activities::{Activity, Participation};
use crate::moderation::{AuditEntry, Block, Report, ReportTarget};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Users among `ids` that exist and are active
    async fn active_users(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    async fn upsert_user(&self, user: &User) -> Result<()>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(
        &self,
        conversation_type: ConversationType,
        activity_id: Option<Uuid>,
        participant_ids: &[Uuid],
    ) -> Result<Conversation>;

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Existing direct conversation with exactly `a` and `b` as participants
    async fn find_direct_conversation(&self, a: Uuid, b: Uuid) -> Result<Option<Conversation>>;

    /// Returns the direct conversation of `a` and `b`, creating it when absent.
    /// Concurrent calls for the same pair yield one conversation. The flag is
    /// `true` when this call created it.
    async fn find_or_create_direct(&self, a: Uuid, b: Uuid) -> Result<(Conversation, bool)>;

    /// Conversations `user_id` takes part in, most recent activity first
    async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Stores the message and advances the conversation's `last_message_at`
    async fn insert_message(&self, message: NewMessage) -> Result<Message>;

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>>;

    /// Ascending by creation time
    async fn messages_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>>;

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<Message>>;

    async fn unread_count(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<i64>;

    /// Marks every unread message not sent by `reader_id` as read.
    /// Returns the number of messages updated.
    async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait TypingStore: Send + Sync {
    /// Last write wins
    async fn upsert_typing(&self, conversation_id: Uuid, user_id: Uuid, is_typing: bool)
        -> Result<()>;

    /// Deletes indicators not updated since `cutoff`, returns how many
    async fn delete_typing_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert_activity(&self, activity: &Activity) -> Result<()>;

    async fn get_activity(&self, id: Uuid) -> Result<Option<Activity>>;

    async fn find_participation(
        &self,
        activity_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participation>>;

    async fn get_participation(&self, id: Uuid) -> Result<Option<Participation>>;

    async fn participations_for_activity(&self, activity_id: Uuid) -> Result<Vec<Participation>>;

    /// Returns `false` when the user already applied to the activity
    async fn insert_participation(&self, participation: &Participation) -> Result<bool>;

    /// Persists a responded participation together with its activity
    async fn save_response(&self, participation: &Participation, activity: &Activity)
        -> Result<()>;
}

#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Whether `user_id` blocked, or was blocked by, anyone in `others`
    async fn any_block_between(&self, user_id: Uuid, others: &[Uuid]) -> Result<bool>;

    /// Returns `false` when the block already existed
    async fn insert_block(&self, block: &Block) -> Result<bool>;

    /// Returns `false` when there was nothing to delete
    async fn delete_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn find_pending_report(
        &self,
        reporter_id: Uuid,
        target: ReportTarget,
    ) -> Result<Option<Report>>;

    async fn insert_report(&self, report: &Report) -> Result<()>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append_audit(&self, entry: &AuditEntry) -> Result<()>;
}

/// Everything the server needs from persistence
#[async_trait]
pub trait Store:
    UserStore
    + ConversationStore
    + MessageStore
    + TypingStore
    + ActivityStore
    + BlockStore
    + ReportStore
    + AuditLog
    + BannedWordStore
{
    async fn health_check(&self) -> Result<()>;
}

/// Exposes a `Store`'s banned-word table to the content filter
pub struct StoreBannedWords(pub Arc<dyn Store>);

#[async_trait]
impl BannedWordStore for StoreBannedWords {
    async fn active_entries(&self) -> Result<Vec<BannedWord>> {
        self.0.active_entries().await
    }
}
