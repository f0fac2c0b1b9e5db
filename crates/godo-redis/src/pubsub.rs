//! Pattern subscription with automatic reconnection

use futures_util::StreamExt;
use std::time::Duration;
use tracing::{error, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// One message received from a pattern subscription
#[derive(Debug, Clone)]
pub struct PubSubMessage {
    pub channel: String,
    pub payload: String,
}

/// PSUBSCRIBE to `pattern` and hand every message to `handler`, forever.
///
/// Connection failures and stream ends are logged and retried; the function
/// only returns if the surrounding task is aborted.
pub async fn run_pattern_subscriber<F>(client: redis::Client, pattern: String, mut handler: F)
where
    F: FnMut(PubSubMessage) + Send,
{
    loop {
        let mut pubsub_conn = match client.get_async_pubsub().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "Failed to create Redis Pub/Sub connection, retrying in 5s...");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
        };

        if let Err(e) = pubsub_conn.psubscribe(pattern.as_str()).await {
            error!(
                error = %e,
                pattern = %pattern,
                "Failed to subscribe to pattern, retrying in 5s..."
            );
            tokio::time::sleep(RECONNECT_DELAY).await;
            continue;
        }

        info!(pattern = %pattern, "Subscribed to Redis pattern");

        let mut stream = pubsub_conn.on_message();
        while let Some(msg) = stream.next().await {
            let payload: String = match msg.get_payload() {
                Ok(p) => p,
                Err(e) => {
                    error!(error = %e, "Failed to get Pub/Sub message payload");
                    continue;
                }
            };

            handler(PubSubMessage {
                channel: msg.get_channel_name().to_string(),
                payload,
            });
        }

        warn!(pattern = %pattern, "Pub/Sub stream ended, reconnecting...");
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
