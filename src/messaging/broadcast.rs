// ============================================================================
// Broadcast Substrate
// ============================================================================
//
// ChannelHub is the per-process fan-out table: one tokio broadcast channel
// per conversation with at least one joined connection. A ChatBroadcaster
// decides how published envelopes reach the hubs:
//
// - LocalBroadcaster: straight into this process's hub (single worker)
// - RedisBroadcaster: PUBLISH to "chat:{id}"; every worker runs one
//   PSUBSCRIBE listener that feeds its own hub
//
// Delivery is at-most-once per connected member. A lagging member loses the
// oldest events rather than slowing the group down.
//
// ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use godo_config::RedisChannels;
use godo_redis::{run_pattern_subscriber, RedisClient};

use super::events::ChatEnvelope;

pub struct ChannelHub {
    groups: DashMap<Uuid, broadcast::Sender<Arc<ChatEnvelope>>>,
    buffer: usize,
}

impl ChannelHub {
    pub fn new(buffer: usize) -> Arc<Self> {
        Arc::new(Self {
            groups: DashMap::new(),
            buffer: buffer.max(1),
        })
    }

    /// Registers a new member of `conversation_id`'s broadcast group
    pub fn join(self: &Arc<Self>, conversation_id: Uuid) -> Membership {
        let receiver = self
            .groups
            .entry(conversation_id)
            .or_insert_with(|| broadcast::channel(self.buffer).0)
            .subscribe();

        Membership {
            conversation_id,
            receiver: Some(receiver),
            hub: Arc::clone(self),
        }
    }

    /// Hands the envelope to every local member, returns how many
    pub fn deliver(&self, envelope: ChatEnvelope) -> usize {
        match self.groups.get(&envelope.conversation_id) {
            // No receivers left is not an error: the group is being pruned
            Some(sender) => sender.send(Arc::new(envelope)).unwrap_or(0),
            None => 0,
        }
    }

    pub fn member_count(&self, conversation_id: Uuid) -> usize {
        self.groups
            .get(&conversation_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Called after the leaving receiver is dropped
    fn prune(&self, conversation_id: Uuid) {
        self.groups
            .remove_if(&conversation_id, |_, sender| sender.receiver_count() == 0);
    }
}

/// A live connection's seat in a broadcast group. Dropping it leaves the group.
pub struct Membership {
    conversation_id: Uuid,
    /// `None` only while leaving
    receiver: Option<broadcast::Receiver<Arc<ChatEnvelope>>>,
    hub: Arc<ChannelHub>,
}

impl Membership {
    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    /// Next envelope for this member. `None` once the group is gone.
    pub async fn recv(&mut self) -> Option<Arc<ChatEnvelope>> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        conversation_id = %self.conversation_id,
                        skipped = skipped,
                        "Chat member lagged behind, dropping oldest events"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        drop(self.receiver.take());
        self.hub.prune(self.conversation_id);
    }
}

/// Shared pub/sub seam between chat connections, possibly across workers
#[async_trait]
pub trait ChatBroadcaster: Send + Sync {
    fn join(&self, conversation_id: Uuid) -> Membership;

    async fn publish(&self, envelope: ChatEnvelope) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}

/// In-process only. Correct for a single worker.
pub struct LocalBroadcaster {
    hub: Arc<ChannelHub>,
}

impl LocalBroadcaster {
    pub fn new(hub: Arc<ChannelHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ChatBroadcaster for LocalBroadcaster {
    fn join(&self, conversation_id: Uuid) -> Membership {
        self.hub.join(conversation_id)
    }

    async fn publish(&self, envelope: ChatEnvelope) -> Result<()> {
        let delivered = self.hub.deliver(envelope);
        tracing::trace!(delivered = delivered, "Published chat event locally");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

pub struct RedisBroadcaster {
    hub: Arc<ChannelHub>,
    client: RedisClient,
    channels: RedisChannels,
    listener: JoinHandle<()>,
}

impl RedisBroadcaster {
    /// Spawns this worker's pattern listener and returns the broadcaster
    pub fn start(client: RedisClient, hub: Arc<ChannelHub>, channels: RedisChannels) -> Self {
        let listener_hub = Arc::clone(&hub);
        let listener = tokio::spawn(run_pattern_subscriber(
            client.client().clone(),
            channels.chat_pattern(),
            move |message| match serde_json::from_str::<ChatEnvelope>(&message.payload) {
                Ok(envelope) => {
                    listener_hub.deliver(envelope);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        channel = %message.channel,
                        "Dropping undecodable chat envelope"
                    );
                }
            },
        ));

        Self {
            hub,
            client,
            channels,
            listener,
        }
    }
}

impl Drop for RedisBroadcaster {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl ChatBroadcaster for RedisBroadcaster {
    fn join(&self, conversation_id: Uuid) -> Membership {
        self.hub.join(conversation_id)
    }

    async fn publish(&self, envelope: ChatEnvelope) -> Result<()> {
        let channel = self.channels.chat_channel(envelope.conversation_id);
        let payload =
            serde_json::to_string(&envelope).context("Failed to serialize chat envelope")?;

        let mut client = self.client.clone();
        client
            .publish(&channel, &payload)
            .await
            .with_context(|| format!("Failed to publish to {}", channel))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let mut client = self.client.clone();
        client.ping().await.context("Redis ping failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::events::ServerEvent;

    fn read_event(conversation_id: Uuid, user_id: Uuid) -> ChatEnvelope {
        ChatEnvelope::new(conversation_id, user_id, ServerEvent::Read { user_id })
    }

    #[tokio::test]
    async fn test_members_receive_published_events() {
        let hub = ChannelHub::new(16);
        let broadcaster = LocalBroadcaster::new(Arc::clone(&hub));
        let conversation_id = Uuid::new_v4();

        let mut first = broadcaster.join(conversation_id);
        let mut second = broadcaster.join(conversation_id);
        assert_eq!(hub.member_count(conversation_id), 2);

        let user_id = Uuid::new_v4();
        broadcaster
            .publish(read_event(conversation_id, user_id))
            .await
            .unwrap();

        for member in [&mut first, &mut second] {
            let envelope = member.recv().await.unwrap();
            assert_eq!(envelope.event, ServerEvent::Read { user_id });
        }
    }

    #[tokio::test]
    async fn test_groups_are_isolated() {
        let hub = ChannelHub::new(16);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let _member_a = hub.join(a);
        let mut member_b = hub.join(b);

        assert_eq!(hub.deliver(read_event(a, Uuid::new_v4())), 1);

        let nothing =
            tokio::time::timeout(std::time::Duration::from_millis(50), member_b.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_dropping_last_member_prunes_group() {
        let hub = ChannelHub::new(16);
        let conversation_id = Uuid::new_v4();

        let first = hub.join(conversation_id);
        let second = hub.join(conversation_id);
        assert_eq!(hub.group_count(), 1);

        drop(first);
        assert_eq!(hub.group_count(), 1);
        assert_eq!(hub.member_count(conversation_id), 1);

        drop(second);
        assert_eq!(hub.group_count(), 0);
        assert_eq!(hub.deliver(read_event(conversation_id, Uuid::new_v4())), 0);
    }

    #[test]
    fn test_simultaneous_last_leavers_prune_group() {
        let hub = ChannelHub::new(16);
        for _ in 0..200 {
            let conversation_id = Uuid::new_v4();
            let barrier = Arc::new(std::sync::Barrier::new(2));
            let leavers: Vec<_> = [hub.join(conversation_id), hub.join(conversation_id)]
                .into_iter()
                .map(|membership| {
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        drop(membership);
                    })
                })
                .collect();
            for leaver in leavers {
                leaver.join().unwrap();
            }
        }
        assert_eq!(hub.group_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_member_skips_oldest_events() {
        let hub = ChannelHub::new(2);
        let conversation_id = Uuid::new_v4();
        let mut member = hub.join(conversation_id);

        let users: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for user_id in &users {
            hub.deliver(read_event(conversation_id, *user_id));
        }

        let envelope = member.recv().await.unwrap();
        assert_eq!(envelope.origin_user_id, users[2]);
        let envelope = member.recv().await.unwrap();
        assert_eq!(envelope.origin_user_id, users[3]);
    }
}
