// ============================================================================
// Test Utilities
// ============================================================================
//
// Spawns the full router on 127.0.0.1:0 over the in-memory store and the
// in-process broadcaster. No Postgres or Redis needed.
//
// ============================================================================

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use godo_config::Config;
use godo_server::{
    context::AppContext,
    messaging::{ChannelHub, LocalBroadcaster},
    notifications::LogNotifier,
    store::{MemoryStore, User, UserStore},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use uuid::Uuid;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestApp {
    pub address: String,
    pub ctx: Arc<AppContext>,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("127.0.0.1:{}", port);

    let config = Arc::new(Config::in_memory("integration-test-secret"));
    let store = Arc::new(MemoryStore::new());
    let ctx = Arc::new(
        AppContext::new(
            config.clone(),
            store.clone(),
            Arc::new(LocalBroadcaster::new(ChannelHub::new(
                config.chat.broadcast_buffer,
            ))),
            Arc::new(LogNotifier),
        )
        .expect("Failed to build app context"),
    );

    let app = godo_server::app(ctx.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        ctx,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    /// Active user plus a valid access token for it
    pub async fn create_user(&self, email: &str, name: &str) -> TestUser {
        let user = User::new(email, Some(name));
        self.store.upsert_user(&user).await.unwrap();
        let (token, _, _) = self.ctx.auth_manager.create_token(&user.id).unwrap();
        TestUser { user, token }
    }

    pub async fn get(&self, user: &TestUser, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, user: &TestUser, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, user: &TestUser, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .unwrap()
    }

    /// Creates a direct conversation between `a` and `b`, returns its id
    pub async fn direct_conversation(&self, a: &TestUser, b: &TestUser) -> Uuid {
        let response = self
            .post(
                a,
                "/conversations/create",
                serde_json::json!({ "participant_ids": [b.id()] }),
            )
            .await;
        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn ws_connect(
        &self,
        conversation_id: Uuid,
        token: Option<&str>,
    ) -> Result<WsClient, tokio_tungstenite::tungstenite::Error> {
        let url = match token {
            Some(token) => format!(
                "ws://{}/ws/chat/{}?token={}",
                self.address, conversation_id, token
            ),
            None => format!("ws://{}/ws/chat/{}", self.address, conversation_id),
        };
        let (ws, _) = connect_async(url).await?;
        // The server joins the broadcast group right after the handshake
        settle().await;
        Ok(ws)
    }
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

pub async fn send_json(ws: &mut WsClient, value: Value) {
    ws.send(WsMessage::Text(value.to_string())).await.unwrap();
}

/// Next JSON text frame within `wait`, `None` on timeout or close
pub async fn recv_json(ws: &mut WsClient, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let frame = tokio::time::timeout_at(deadline, ws.next()).await.ok()??;
        match frame {
            Ok(WsMessage::Text(text)) => return serde_json::from_str(&text).ok(),
            Ok(WsMessage::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

/// Next frame of the given `type`, skipping others
pub async fn recv_event(ws: &mut WsClient, event_type: &str, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let event = recv_json(ws, remaining).await?;
        if event["type"] == event_type {
            return Some(event);
        }
    }
}
