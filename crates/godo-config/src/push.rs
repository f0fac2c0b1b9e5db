// ============================================================================
// Push Notification Configuration
// ============================================================================

const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Clone, Debug)]
pub struct PushConfig {
    /// Legacy FCM server key. Push is disabled (log only) when absent.
    pub fcm_server_key: Option<String>,
    pub fcm_endpoint: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            fcm_server_key: None,
            fcm_endpoint: DEFAULT_FCM_ENDPOINT.to_string(),
        }
    }
}

impl PushConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            fcm_server_key: std::env::var("FCM_SERVER_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            fcm_endpoint: std::env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_FCM_ENDPOINT.to_string()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.fcm_server_key.is_some()
    }
}
