// tests/conversations_test.rs

use serde_json::{json, Value};
use uuid::Uuid;

mod test_utils;
use test_utils::spawn_app;

use godo_server::store::MessageStore;

#[tokio::test]
async fn test_direct_conversation_is_reused() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;

    let first = app
        .post(&alice, "/conversations/create", json!({"participant_ids": [bob.id()]}))
        .await;
    assert_eq!(first.status().as_u16(), 201);
    let first: Value = first.json().await.unwrap();

    // Same pair, other direction
    let second = app
        .post(&bob, "/conversations/create", json!({"participant_ids": [alice.id()]}))
        .await;
    assert_eq!(second.status().as_u16(), 200);
    let second: Value = second.json().await.unwrap();

    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["conversation_type"], "direct");
    assert_eq!(first["participants"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_blocked_pair_cannot_start_conversation() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;

    let response = app
        .post(&bob, &format!("/users/{}/block", alice.id()), json!({"reason": "spam"}))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = app
        .post(&alice, "/conversations/create", json!({"participant_ids": [bob.id()]}))
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Engellenmiş kullanıcılarla sohbet başlatamazsınız."
    );
}

#[tokio::test]
async fn test_outsider_sees_not_found() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;
    let eve = app.create_user("eve@example.com", "Eve").await;
    let conversation_id = app.direct_conversation(&alice, &bob).await;

    let hidden = app.get(&eve, &format!("/conversations/{}", conversation_id)).await;
    let missing = app.get(&eve, &format!("/conversations/{}", Uuid::new_v4())).await;
    assert_eq!(hidden.status().as_u16(), 404);
    assert_eq!(missing.status().as_u16(), 404);

    let hidden: Value = hidden.json().await.unwrap();
    let missing: Value = missing.json().await.unwrap();
    assert_eq!(hidden["error"], missing["error"]);

    let response = app
        .post(
            &eve,
            &format!("/conversations/{}/send", conversation_id),
            json!({"content": "sızma"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/conversations/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_code"], "AUTH_ERROR");
}

#[tokio::test]
async fn test_original_content_never_leaves_the_server() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;
    let conversation_id = app.direct_conversation(&alice, &bob).await;

    let response = app
        .post(
            &alice,
            &format!("/conversations/{}/send", conversation_id),
            json!({"content": "mail at alice@example.com"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let sent: Value = response.json().await.unwrap();
    assert_eq!(sent["is_filtered"], true);
    assert_eq!(sent["is_mine"], true);
    assert!(sent["content"].as_str().unwrap().contains("[email gizlendi]"));
    assert!(sent.get("original_content").is_none());

    let detail: Value = app
        .get(&bob, &format!("/conversations/{}", conversation_id))
        .await
        .json()
        .await
        .unwrap();
    let messages = detail["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].get("original_content").is_none());
    assert_eq!(messages[0]["is_mine"], false);

    // Kept for moderators only
    let id: Uuid = sent["id"].as_str().unwrap().parse().unwrap();
    let stored = app.store.get_message(id).await.unwrap().unwrap();
    assert_eq!(
        stored.original_content.as_deref(),
        Some("mail at alice@example.com")
    );
}

#[tokio::test]
async fn test_list_shows_preview_and_unread_count() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;

    let response = app
        .post(
            &alice,
            "/conversations/create",
            json!({"participant_ids": [bob.id()], "initial_message": "İlk mesaj"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let list: Value = app.get(&bob, "/conversations/").await.json().await.unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["unread_count"], 1);
    assert_eq!(list[0]["last_message"]["content"], "İlk mesaj");
    assert_eq!(list[0]["last_message"]["sender_name"], "Alice");

    // Viewing the conversation marks it read
    app.get(&bob, &format!("/conversations/{}", list[0]["id"].as_str().unwrap()))
        .await;
    let list: Value = app.get(&bob, "/conversations/").await.json().await.unwrap();
    assert_eq!(list[0]["unread_count"], 0);
}

#[tokio::test]
async fn test_send_validates_length() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;
    let conversation_id = app.direct_conversation(&alice, &bob).await;

    let too_long = "a".repeat(2001);
    for content in ["", too_long.as_str()] {
        let response = app
            .post(
                &alice,
                &format!("/conversations/{}/send", conversation_id),
                json!({ "content": content }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 400);
    }
}

#[tokio::test]
async fn test_concurrent_creates_yield_one_direct_conversation() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let (from, to) = if i % 2 == 0 { (&alice, &bob) } else { (&bob, &alice) };
        let request = app
            .client
            .post(app.url("/conversations/create"))
            .bearer_auth(&from.token)
            .json(&json!({ "participant_ids": [to.id()] }));
        handles.push(tokio::spawn(async move { request.send().await.unwrap() }));
    }

    let mut ids = Vec::new();
    let mut created = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        if response.status().as_u16() == 201 {
            created += 1;
        }
        let body: Value = response.json().await.unwrap();
        ids.push(body["id"].as_str().unwrap().to_string());
    }
    ids.sort();
    ids.dedup();

    assert_eq!(created, 1);
    assert_eq!(ids.len(), 1);
    let list: Value = app.get(&alice, "/conversations/").await.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sent_content_is_trimmed() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com", "Alice").await;
    let bob = app.create_user("bob@example.com", "Bob").await;
    let conversation_id = app.direct_conversation(&alice, &bob).await;

    let response = app
        .post(
            &alice,
            &format!("/conversations/{}/send", conversation_id),
            json!({"content": "   merhaba\n"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let sent: Value = response.json().await.unwrap();
    assert_eq!(sent["content"], "merhaba");

    let id: Uuid = sent["id"].as_str().unwrap().parse().unwrap();
    let stored = app.store.get_message(id).await.unwrap().unwrap();
    assert_eq!(stored.content, "merhaba");
}
