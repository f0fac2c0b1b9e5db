use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use godo_moderation::{BannedWord, BannedWordStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::*;
use crate::moderation::ReportStatus;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    conversations: HashMap<Uuid, Conversation>,
    /// Insertion order is creation order
    messages: Vec<Message>,
    typing: HashMap<(Uuid, Uuid), TypingIndicator>,
    activities: HashMap<Uuid, Activity>,
    participations: Vec<Participation>,
    blocks: Vec<Block>,
    reports: Vec<Report>,
    audit: Vec<AuditEntry>,
    banned_words: Vec<BannedWord>,
}

impl State {
    fn direct_conversation(&self, a: Uuid, b: Uuid) -> Option<&Conversation> {
        self.conversations.values().find(|c| {
            c.conversation_type == ConversationType::Direct
                && c.participant_ids.len() == 2
                && c.has_participant(&a)
                && c.has_participant(&b)
        })
    }
}

/// In-process store for local development and tests.
///
/// Banned-word lookups and message inserts can be made to fail on demand.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_banned_words: AtomicBool,
    fail_message_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_banned_word(&self, word: BannedWord) {
        self.state.write().await.banned_words.push(word);
    }

    pub fn set_banned_word_failure(&self, fail: bool) {
        self.fail_banned_words.store(fail, Ordering::SeqCst);
    }

    pub fn set_message_insert_failure(&self, fail: bool) {
        self.fail_message_insert.store(fail, Ordering::SeqCst);
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.read().await.audit.clone()
    }

    pub async fn reports(&self) -> Vec<Report> {
        self.state.read().await.reports.clone()
    }

    pub async fn typing_indicators(&self) -> Vec<TypingIndicator> {
        self.state.read().await.typing.values().cloned().collect()
    }

    pub async fn message_count(&self, conversation_id: Uuid) -> usize {
        self.state
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn active_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .filter(|u| u.is_active)
            .cloned()
            .collect())
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        self.state.write().await.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create_conversation(
        &self,
        conversation_type: ConversationType,
        activity_id: Option<Uuid>,
        participant_ids: &[Uuid],
    ) -> Result<Conversation> {
        let mut participants: Vec<Uuid> = Vec::with_capacity(participant_ids.len());
        for id in participant_ids {
            if !participants.contains(id) {
                participants.push(*id);
            }
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            conversation_type,
            activity_id,
            participant_ids: participants,
            created_at: now,
            last_message_at: now,
        };
        self.state
            .write()
            .await
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.state.read().await.conversations.get(&id).cloned())
    }

    async fn find_direct_conversation(&self, a: Uuid, b: Uuid) -> Result<Option<Conversation>> {
        Ok(self.state.read().await.direct_conversation(a, b).cloned())
    }

    async fn find_or_create_direct(&self, a: Uuid, b: Uuid) -> Result<(Conversation, bool)> {
        // One write guard across lookup and insert
        let mut state = self.state.write().await;
        if let Some(existing) = state.direct_conversation(a, b) {
            return Ok((existing.clone(), false));
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            conversation_type: ConversationType::Direct,
            activity_id: None,
            participant_ids: vec![a, b],
            created_at: now,
            last_message_at: now,
        };
        state
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok((conversation, true))
    }

    async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.has_participant(&user_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(conversations)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: NewMessage) -> Result<Message> {
        if self.fail_message_insert.load(Ordering::SeqCst) {
            anyhow::bail!("message insert failed (injected)");
        }

        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| anyhow::anyhow!("conversation {} not found", message.conversation_id))?;

        let now = Utc::now();
        if now > conversation.last_message_at {
            conversation.last_message_at = now;
        }

        let stored = Message {
            id: Uuid::new_v4(),
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            is_filtered: message.is_filtered,
            original_content: message.original_content,
            is_read: false,
            read_at: None,
            created_at: now,
        };
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
        Ok(self
            .state
            .read()
            .await
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn messages_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        Ok(self
            .state
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<Message>> {
        Ok(self
            .state
            .read()
            .await
            .messages
            .iter()
            .rev()
            .find(|m| m.conversation_id == conversation_id)
            .cloned())
    }

    async fn unread_count(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<i64> {
        Ok(self
            .state
            .read()
            .await
            .messages
            .iter()
            .filter(|m| {
                m.conversation_id == conversation_id && !m.is_read && m.sender_id != reader_id
            })
            .count() as i64)
    }

    async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for message in state.messages.iter_mut().filter(|m| {
            m.conversation_id == conversation_id && !m.is_read && m.sender_id != reader_id
        }) {
            message.is_read = true;
            message.read_at = Some(now);
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl TypingStore for MemoryStore {
    async fn upsert_typing(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        is_typing: bool,
    ) -> Result<()> {
        self.state.write().await.typing.insert(
            (conversation_id, user_id),
            TypingIndicator {
                conversation_id,
                user_id,
                is_typing,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_typing_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.typing.len();
        state.typing.retain(|_, t| t.updated_at >= cutoff);
        Ok((before - state.typing.len()) as u64)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn insert_activity(&self, activity: &Activity) -> Result<()> {
        self.state
            .write()
            .await
            .activities
            .insert(activity.id, activity.clone());
        Ok(())
    }

    async fn get_activity(&self, id: Uuid) -> Result<Option<Activity>> {
        Ok(self.state.read().await.activities.get(&id).cloned())
    }

    async fn find_participation(
        &self,
        activity_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participation>> {
        Ok(self
            .state
            .read()
            .await
            .participations
            .iter()
            .find(|p| p.activity_id == activity_id && p.user_id == user_id)
            .cloned())
    }

    async fn get_participation(&self, id: Uuid) -> Result<Option<Participation>> {
        Ok(self
            .state
            .read()
            .await
            .participations
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn participations_for_activity(&self, activity_id: Uuid) -> Result<Vec<Participation>> {
        let state = self.state.read().await;
        let mut found: Vec<Participation> = state
            .participations
            .iter()
            .filter(|p| p.activity_id == activity_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(found)
    }

    async fn insert_participation(&self, participation: &Participation) -> Result<bool> {
        let mut state = self.state.write().await;
        if state
            .participations
            .iter()
            .any(|p| p.activity_id == participation.activity_id && p.user_id == participation.user_id)
        {
            return Ok(false);
        }
        state.participations.push(participation.clone());
        Ok(true)
    }

    async fn save_response(
        &self,
        participation: &Participation,
        activity: &Activity,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .participations
            .iter_mut()
            .find(|p| p.id == participation.id)
        {
            *existing = participation.clone();
        }
        state.activities.insert(activity.id, activity.clone());
        Ok(())
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn any_block_between(&self, user_id: Uuid, others: &[Uuid]) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.blocks.iter().any(|b| {
            (b.blocker_id == user_id && others.contains(&b.blocked_id))
                || (b.blocked_id == user_id && others.contains(&b.blocker_id))
        }))
    }

    async fn insert_block(&self, block: &Block) -> Result<bool> {
        let mut state = self.state.write().await;
        if state
            .blocks
            .iter()
            .any(|b| b.blocker_id == block.blocker_id && b.blocked_id == block.blocked_id)
        {
            return Ok(false);
        }
        state.blocks.push(block.clone());
        Ok(true)
    }

    async fn delete_block(&self, blocker_id: Uuid, blocked_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.blocks.len();
        state
            .blocks
            .retain(|b| !(b.blocker_id == blocker_id && b.blocked_id == blocked_id));
        Ok(state.blocks.len() < before)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn find_pending_report(
        &self,
        reporter_id: Uuid,
        target: ReportTarget,
    ) -> Result<Option<Report>> {
        Ok(self
            .state
            .read()
            .await
            .reports
            .iter()
            .find(|r| {
                r.reporter_id == reporter_id
                    && r.target == target
                    && r.status == ReportStatus::Pending
            })
            .cloned())
    }

    async fn insert_report(&self, report: &Report) -> Result<()> {
        self.state.write().await.reports.push(report.clone());
        Ok(())
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        self.state.write().await.audit.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl BannedWordStore for MemoryStore {
    async fn active_entries(&self) -> Result<Vec<BannedWord>> {
        if self.fail_banned_words.load(Ordering::SeqCst) {
            anyhow::bail!("banned word lookup failed (injected)");
        }
        Ok(self.state.read().await.banned_words.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, Uuid, Uuid, Conversation) {
        let store = MemoryStore::new();
        let a = User::new("a@example.com", Some("A"));
        let b = User::new("b@example.com", Some("B"));
        store.upsert_user(&a).await.unwrap();
        store.upsert_user(&b).await.unwrap();
        let conversation = store
            .create_conversation(ConversationType::Direct, None, &[a.id, b.id])
            .await
            .unwrap();
        (store, a.id, b.id, conversation)
    }

    fn new_message(conversation_id: Uuid, sender_id: Uuid, content: &str) -> NewMessage {
        NewMessage {
            conversation_id,
            sender_id,
            content: content.to_string(),
            is_filtered: false,
            original_content: None,
        }
    }

    #[tokio::test]
    async fn test_insert_advances_last_message_at() {
        let (store, a, _, conversation) = seeded().await;
        let message = store
            .insert_message(new_message(conversation.id, a, "selam"))
            .await
            .unwrap();

        let reloaded = store.get_conversation(conversation.id).await.unwrap().unwrap();
        assert!(reloaded.last_message_at >= conversation.last_message_at);
        assert_eq!(reloaded.last_message_at, message.created_at.max(conversation.last_message_at));
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let (store, a, b, conversation) = seeded().await;
        store
            .insert_message(new_message(conversation.id, a, "1"))
            .await
            .unwrap();
        store
            .insert_message(new_message(conversation.id, a, "2"))
            .await
            .unwrap();
        store
            .insert_message(new_message(conversation.id, b, "3"))
            .await
            .unwrap();

        assert_eq!(store.mark_read(conversation.id, b).await.unwrap(), 2);
        assert_eq!(store.mark_read(conversation.id, b).await.unwrap(), 0);
        assert_eq!(store.unread_count(conversation.id, b).await.unwrap(), 0);
        assert_eq!(store.unread_count(conversation.id, a).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_direct_lookup_ignores_larger_groups() {
        let (store, a, b, conversation) = seeded().await;
        let c = Uuid::new_v4();
        store
            .create_conversation(ConversationType::Direct, None, &[a, b, c])
            .await
            .unwrap();

        let found = store.find_direct_conversation(b, a).await.unwrap().unwrap();
        assert_eq!(found.id, conversation.id);
        assert!(store.find_direct_conversation(a, c).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_find_or_create_direct_is_race_free() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let (x, y) = if i % 2 == 0 { (a, b) } else { (b, a) };
                tokio::spawn(async move { store.find_or_create_direct(x, y).await.unwrap() })
            })
            .collect();

        let mut created = 0;
        let mut ids = Vec::new();
        for handle in handles {
            let (conversation, was_created) = handle.await.unwrap();
            created += usize::from(was_created);
            ids.push(conversation.id);
        }
        ids.sort();
        ids.dedup();

        assert_eq!(created, 1);
        assert_eq!(ids.len(), 1);
        assert_eq!(store.conversations_for_user(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_typing_sweep_deletes_stale_entries() {
        let (store, a, _, conversation) = seeded().await;
        store.upsert_typing(conversation.id, a, true).await.unwrap();

        let deleted = store
            .delete_typing_before(Utc::now() - chrono::Duration::seconds(10))
            .await
            .unwrap();
        assert_eq!(deleted, 0);

        let deleted = store
            .delete_typing_before(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(store.typing_indicators().await.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let (store, a, _, conversation) = seeded().await;

        store.set_message_insert_failure(true);
        assert!(store
            .insert_message(new_message(conversation.id, a, "x"))
            .await
            .is_err());

        store.set_banned_word_failure(true);
        assert!(store.active_entries().await.is_err());
    }
}
