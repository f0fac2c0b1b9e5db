use anyhow::Result;
use std::sync::Arc;

use godo_config::Config;
use godo_moderation::ContentFilter;

use crate::auth::AuthManager;
use crate::messaging::{ChatBroadcaster, MessagePersistence};
use crate::notifications::PushNotifier;
use crate::store::{Store, StoreBannedWords};

/// Application context containing shared dependencies
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    /// Reads the store's banned words on every call
    pub filter: ContentFilter,
    pub persistence: MessagePersistence,
    pub broadcaster: Arc<dyn ChatBroadcaster>,
    pub auth_manager: Arc<AuthManager>,
    pub notifier: Arc<dyn PushNotifier>,
}

impl AppContext {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn Store>,
        broadcaster: Arc<dyn ChatBroadcaster>,
        notifier: Arc<dyn PushNotifier>,
    ) -> Result<Self> {
        let auth_manager = Arc::new(AuthManager::new(&config)?);
        let filter = ContentFilter::new(Arc::new(StoreBannedWords(Arc::clone(&store))));
        let persistence = MessagePersistence::new(Arc::clone(&store), filter.clone());

        Ok(Self {
            config,
            store,
            filter,
            persistence,
            broadcaster,
            auth_manager,
            notifier,
        })
    }
}
