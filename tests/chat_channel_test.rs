// tests/chat_channel_test.rs

use serde_json::json;
use serial_test::serial;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Error as WsError;
use uuid::Uuid;

mod test_utils;
use test_utils::{recv_event, recv_json, send_json, spawn_app, TestApp, TestUser};

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(300);

async fn pair(app: &TestApp) -> (TestUser, TestUser, Uuid) {
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;
    let conversation_id = app.direct_conversation(&alice, &bob).await;
    (alice, bob, conversation_id)
}

fn assert_rejected(result: Result<test_utils::WsClient, WsError>, status: u16) {
    match result {
        Err(WsError::Http(response)) => {
            assert_eq!(response.status().as_u16(), status);
            let body = response.body().clone().unwrap_or_default();
            assert!(body.is_empty(), "rejection body must be empty");
        }
        Err(other) => panic!("expected an HTTP rejection, got {other:?}"),
        Ok(_) => panic!("connection must not be upgraded"),
    }
}

// Rejections touch the process-wide metrics; tests that reject run serially
#[tokio::test]
#[serial]
async fn test_unauthenticated_and_outsiders_are_refused_before_upgrade() {
    let app = spawn_app().await;
    let (_alice, _bob, conversation_id) = pair(&app).await;
    let eve = app.create_user("eve@example.com", "Eve").await;

    assert_rejected(app.ws_connect(conversation_id, None).await, 403);
    assert_rejected(app.ws_connect(conversation_id, Some("not-a-jwt")).await, 403);
    assert_rejected(app.ws_connect(conversation_id, Some(&eve.token)).await, 403);
    assert_rejected(app.ws_connect(Uuid::new_v4(), Some(&eve.token)).await, 403);
}

#[tokio::test]
#[serial]
async fn test_rejected_connection_is_counted() {
    let app = spawn_app().await;
    let (_alice, _bob, conversation_id) = pair(&app).await;

    let before = godo_server::metrics::WS_CONNECTIONS_REJECTED_TOTAL.get();
    assert_rejected(app.ws_connect(conversation_id, None).await, 403);
    assert_eq!(
        godo_server::metrics::WS_CONNECTIONS_REJECTED_TOTAL.get(),
        before + 1
    );

    let response = app.client.get(app.url("/metrics")).send().await.unwrap();
    let text = response.text().await.unwrap();
    assert!(text.contains("godo_ws_connections_rejected_total"));
}

#[tokio::test]
async fn test_message_reaches_every_member_including_sender() {
    let app = spawn_app().await;
    let (alice, bob, conversation_id) = pair(&app).await;

    let mut alice_ws = app.ws_connect(conversation_id, Some(&alice.token)).await.unwrap();
    let mut bob_ws = app.ws_connect(conversation_id, Some(&bob.token)).await.unwrap();

    send_json(&mut alice_ws, json!({"type": "chat_message", "content": "Selam Bob!"})).await;

    for ws in [&mut alice_ws, &mut bob_ws] {
        let event = recv_event(ws, "chat_message", WAIT).await.unwrap();
        let message = &event["message"];
        assert_eq!(message["content"], "Selam Bob!");
        assert_eq!(message["sender_name"], "Alice");
        assert_eq!(message["sender_id"], alice.id().to_string());
        assert_eq!(message["is_filtered"], false);
        assert!(message.get("original_content").is_none());
    }

    assert_eq!(app.store.message_count(conversation_id).await, 1);
}

#[tokio::test]
async fn test_phone_number_is_redacted_before_broadcast() {
    let app = spawn_app().await;
    let (alice, bob, conversation_id) = pair(&app).await;

    let mut alice_ws = app.ws_connect(conversation_id, Some(&alice.token)).await.unwrap();
    let mut bob_ws = app.ws_connect(conversation_id, Some(&bob.token)).await.unwrap();

    send_json(
        &mut alice_ws,
        json!({"type": "chat_message", "content": "call me at 0532 123 45 67"}),
    )
    .await;

    let event = recv_event(&mut bob_ws, "chat_message", WAIT).await.unwrap();
    let content = event["message"]["content"].as_str().unwrap();
    assert!(content.contains("[telefon gizlendi]"));
    assert!(!content.contains("0532"));
    assert_eq!(event["message"]["is_filtered"], true);
    assert!(event["message"].get("original_content").is_none());

    let audit = app.store.audit_entries().await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].target_user_id, alice.id());
}

#[tokio::test]
async fn test_typing_is_not_echoed_to_its_sender() {
    let app = spawn_app().await;
    let (alice, bob, conversation_id) = pair(&app).await;

    let mut alice_ws = app.ws_connect(conversation_id, Some(&alice.token)).await.unwrap();
    let mut bob_ws = app.ws_connect(conversation_id, Some(&bob.token)).await.unwrap();

    send_json(&mut alice_ws, json!({"type": "typing", "is_typing": true})).await;

    let event = recv_event(&mut bob_ws, "typing", WAIT).await.unwrap();
    assert_eq!(event["user_id"], alice.id().to_string());
    assert_eq!(event["user_name"], "Alice");
    assert_eq!(event["is_typing"], true);

    assert!(recv_json(&mut alice_ws, QUIET).await.is_none());
    assert_eq!(app.store.typing_indicators().await.len(), 1);
}

#[tokio::test]
async fn test_read_marks_incoming_messages_once() {
    let app = spawn_app().await;
    let (alice, bob, conversation_id) = pair(&app).await;

    let mut alice_ws = app.ws_connect(conversation_id, Some(&alice.token)).await.unwrap();
    let mut bob_ws = app.ws_connect(conversation_id, Some(&bob.token)).await.unwrap();

    send_json(&mut alice_ws, json!({"type": "chat_message", "content": "Okudun mu?"})).await;
    recv_event(&mut bob_ws, "chat_message", WAIT).await.unwrap();

    send_json(&mut bob_ws, json!({"type": "read"})).await;
    let event = recv_event(&mut alice_ws, "read", WAIT).await.unwrap();
    assert_eq!(event["user_id"], bob.id().to_string());

    // Nothing left to mark the second time
    let response = app
        .post(&bob, &format!("/conversations/{}/read", conversation_id), json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["marked_read"], 0);
}

#[tokio::test]
async fn test_malformed_and_empty_frames_are_ignored() {
    let app = spawn_app().await;
    let (alice, _bob, conversation_id) = pair(&app).await;

    let mut alice_ws = app.ws_connect(conversation_id, Some(&alice.token)).await.unwrap();

    send_json(&mut alice_ws, json!({"type": "teleport"})).await;
    send_json(&mut alice_ws, json!({"type": "chat_message", "content": "   "})).await;
    send_json(&mut alice_ws, json!({"type": "chat_message", "content": "hâlâ buradayım"})).await;

    let event = recv_event(&mut alice_ws, "chat_message", WAIT).await.unwrap();
    assert_eq!(event["message"]["content"], "hâlâ buradayım");
    assert_eq!(app.store.message_count(conversation_id).await, 1);
}

#[tokio::test]
async fn test_failed_persist_is_never_broadcast() {
    let app = spawn_app().await;
    let (alice, bob, conversation_id) = pair(&app).await;

    let mut alice_ws = app.ws_connect(conversation_id, Some(&alice.token)).await.unwrap();
    let mut bob_ws = app.ws_connect(conversation_id, Some(&bob.token)).await.unwrap();

    app.store.set_message_insert_failure(true);
    send_json(&mut alice_ws, json!({"type": "chat_message", "content": "kaybolacak"})).await;

    assert!(recv_event(&mut bob_ws, "chat_message", QUIET).await.is_none());
    assert_eq!(app.store.message_count(conversation_id).await, 0);

    // The session survives the failure
    app.store.set_message_insert_failure(false);
    send_json(&mut alice_ws, json!({"type": "chat_message", "content": "tekrar"})).await;
    let event = recv_event(&mut bob_ws, "chat_message", WAIT).await.unwrap();
    assert_eq!(event["message"]["content"], "tekrar");
}

#[tokio::test]
async fn test_http_send_reaches_connected_members() {
    let app = spawn_app().await;
    let (alice, bob, conversation_id) = pair(&app).await;

    let mut bob_ws = app.ws_connect(conversation_id, Some(&bob.token)).await.unwrap();

    let response = app
        .post(
            &alice,
            &format!("/conversations/{}/send", conversation_id),
            json!({"content": "HTTP'den merhaba"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let event = recv_event(&mut bob_ws, "chat_message", WAIT).await.unwrap();
    assert_eq!(event["message"]["content"], "HTTP'den merhaba");
}
