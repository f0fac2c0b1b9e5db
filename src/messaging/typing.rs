use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::store::Store;

/// Background task that reaps typing indicators nobody refreshed within the TTL.
///
/// Indicators are never deleted by a user action; this sweep is the only
/// thing that removes them.
pub struct TypingSweepTask {
    store: Arc<dyn Store>,
    ttl: ChronoDuration,
    sweep_interval: Duration,
}

impl TypingSweepTask {
    pub fn new(store: Arc<dyn Store>, ttl_secs: i64, sweep_interval: Duration) -> Self {
        Self {
            store,
            ttl: ChronoDuration::seconds(ttl_secs),
            sweep_interval,
        }
    }

    /// One sweep. Returns how many indicators were removed.
    pub async fn sweep_once(&self) -> anyhow::Result<u64> {
        let cutoff = Utc::now() - self.ttl;
        self.store.delete_typing_before(cutoff).await
    }

    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.sweep_interval.as_secs(),
            ttl_secs = self.ttl.num_seconds(),
            "Starting typing indicator sweep task"
        );

        let mut interval = time::interval(self.sweep_interval);

        loop {
            interval.tick().await;

            match self.sweep_once().await {
                Ok(0) => {}
                Ok(deleted) => {
                    tracing::debug!(deleted = deleted, "Reaped stale typing indicators");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to reap stale typing indicators");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, TypingStore};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_sweep_removes_only_stale_indicators() {
        let store = Arc::new(MemoryStore::new());
        let conversation_id = Uuid::new_v4();
        store
            .upsert_typing(conversation_id, Uuid::new_v4(), true)
            .await
            .unwrap();

        let fresh = TypingSweepTask::new(store.clone(), 10, Duration::from_secs(5));
        assert_eq!(fresh.sweep_once().await.unwrap(), 0);
        assert_eq!(store.typing_indicators().await.len(), 1);

        // A negative TTL puts the cutoff in the future
        let expired = TypingSweepTask::new(store.clone(), -1, Duration::from_secs(5));
        assert_eq!(expired.sweep_once().await.unwrap(), 1);
        assert!(store.typing_indicators().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_is_last_write_wins() {
        let store = MemoryStore::new();
        let conversation_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        store.upsert_typing(conversation_id, user_id, true).await.unwrap();
        store.upsert_typing(conversation_id, user_id, false).await.unwrap();

        let indicators = store.typing_indicators().await;
        assert_eq!(indicators.len(), 1);
        assert!(!indicators[0].is_typing);
    }
}
