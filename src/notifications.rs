// ============================================================================
// Push Notifications
// ============================================================================
//
// Fire-and-forget: dispatch happens on a spawned task, failures are logged
// and never reach the caller. Users without a device token are skipped.
//
// ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use godo_config::PushConfig;

use crate::store::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    /// Extra key/value data for the client app
    pub data: Value,
}

impl PushNotification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, data: Value) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data,
        }
    }
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, device_token: &str, notification: &PushNotification) -> Result<()>;
}

/// Legacy FCM HTTP endpoint
pub struct FcmNotifier {
    http_client: reqwest::Client,
    server_key: String,
    endpoint: String,
}

impl FcmNotifier {
    pub fn new(server_key: String, endpoint: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            server_key,
            endpoint,
        })
    }
}

#[async_trait]
impl PushNotifier for FcmNotifier {
    async fn send(&self, device_token: &str, notification: &PushNotification) -> Result<()> {
        let body = json!({
            "to": device_token,
            "notification": {
                "title": notification.title,
                "body": notification.body,
            },
            "data": notification.data,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&body)
            .send()
            .await
            .context("FCM request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("FCM returned {}: {}", status, text);
        }

        Ok(())
    }
}

/// Used when push is not configured
pub struct LogNotifier;

#[async_trait]
impl PushNotifier for LogNotifier {
    async fn send(&self, _device_token: &str, notification: &PushNotification) -> Result<()> {
        tracing::debug!(title = %notification.title, "Push disabled, notification dropped");
        Ok(())
    }
}

pub fn notifier_from_config(config: &PushConfig) -> Result<Arc<dyn PushNotifier>> {
    match &config.fcm_server_key {
        Some(key) => {
            tracing::info!("FCM push notifications enabled");
            Ok(Arc::new(FcmNotifier::new(
                key.clone(),
                config.fcm_endpoint.clone(),
            )?))
        }
        None => {
            tracing::info!("FCM_SERVER_KEY not set, push notifications are logged only");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Sends `notification` to every user with a device token, in the background
pub fn notify_users(
    notifier: Arc<dyn PushNotifier>,
    users: Vec<User>,
    notification: PushNotification,
) {
    let tokens: Vec<String> = users.into_iter().filter_map(|u| u.fcm_token).collect();
    if tokens.is_empty() {
        return;
    }

    tokio::spawn(async move {
        for token in tokens {
            if let Err(e) = notifier.send(&token, &notification).await {
                tracing::warn!(error = %e, "Failed to send push notification");
            }
        }
    });
}
