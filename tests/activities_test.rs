// tests/activities_test.rs

use chrono::{Duration, Utc};
use serde_json::{json, Value};

mod test_utils;
use test_utils::{spawn_app, TestApp, TestUser};

async fn create_activity(app: &TestApp, creator: &TestUser, max_participants: i32) -> String {
    let response = app
        .post(
            creator,
            "/activities",
            json!({
                "title": "Cumartesi bisiklet turu",
                "description": "Sahil boyunca 20 km, orta tempo",
                "city": "İzmir",
                "start_time": Utc::now() + Duration::days(3),
                "max_participants": max_participants,
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "active");
    assert_eq!(body["spots_left"], max_participants);
    body["id"].as_str().unwrap().to_string()
}

async fn apply(app: &TestApp, user: &TestUser, activity_id: &str, group: i32) -> reqwest::Response {
    app.post(
        user,
        &format!("/activities/{}/apply", activity_id),
        json!({ "message": "Katılmak isteriz", "is_group": group > 1, "group_member_count": group }),
    )
    .await
}

async fn respond(
    app: &TestApp,
    creator: &TestUser,
    activity_id: &str,
    participation_id: &str,
    action: &str,
) -> reqwest::Response {
    app.post(
        creator,
        &format!(
            "/activities/{}/applications/{}/respond",
            activity_id, participation_id
        ),
        json!({ "action": action }),
    )
    .await
}

#[tokio::test]
async fn test_applications_race_ahead_of_capacity() {
    let app = spawn_app().await;
    let creator = app.create_user("ayse@example.com", "Ayşe").await;
    let first = app.create_user("mehmet@example.com", "Mehmet").await;
    let second = app.create_user("zeynep@example.com", "Zeynep").await;
    let activity_id = create_activity(&app, &creator, 3).await;

    // Both fit at application time, only one fits at approval time
    let a: Value = apply(&app, &first, &activity_id, 2).await.json().await.unwrap();
    let b: Value = apply(&app, &second, &activity_id, 2).await.json().await.unwrap();
    assert_eq!(a["status"], "pending");
    assert_eq!(b["status"], "pending");

    let response = respond(&app, &creator, &activity_id, a["id"].as_str().unwrap(), "approve").await;
    assert_eq!(response.status().as_u16(), 200);
    let approved: Value = response.json().await.unwrap();
    assert_eq!(approved["status"], "approved");

    let response = respond(&app, &creator, &activity_id, b["id"].as_str().unwrap(), "approve").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Yeterli kontenjan yok.");

    let activity: Value = app
        .get(&creator, &format!("/activities/{}", activity_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(activity["current_participants"], 2);
    assert_eq!(activity["spots_left"], 1);
}

#[tokio::test]
async fn test_only_creator_manages_applications() {
    let app = spawn_app().await;
    let creator = app.create_user("ayse@example.com", "Ayşe").await;
    let applicant = app.create_user("mehmet@example.com", "Mehmet").await;
    let activity_id = create_activity(&app, &creator, 5).await;

    let participation: Value = apply(&app, &applicant, &activity_id, 1).await.json().await.unwrap();

    let response = app
        .get(&applicant, &format!("/activities/{}/applications", activity_id))
        .await;
    assert_eq!(response.status().as_u16(), 403);

    let response = respond(
        &app,
        &applicant,
        &activity_id,
        participation["id"].as_str().unwrap(),
        "approve",
    )
    .await;
    assert_eq!(response.status().as_u16(), 403);

    let applications: Value = app
        .get(&creator, &format!("/activities/{}/applications", activity_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(applications.as_array().unwrap().len(), 1);
    assert_eq!(applications[0]["user"]["name"], "Mehmet");
}

#[tokio::test]
async fn test_unknown_action_and_participation() {
    let app = spawn_app().await;
    let creator = app.create_user("ayse@example.com", "Ayşe").await;
    let applicant = app.create_user("mehmet@example.com", "Mehmet").await;
    let activity_id = create_activity(&app, &creator, 5).await;
    let participation: Value = apply(&app, &applicant, &activity_id, 1).await.json().await.unwrap();

    let response = respond(
        &app,
        &creator,
        &activity_id,
        participation["id"].as_str().unwrap(),
        "maybe",
    )
    .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = respond(
        &app,
        &creator,
        &activity_id,
        &uuid::Uuid::new_v4().to_string(),
        "approve",
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_unclean_activity_is_rejected_with_violations() {
    let app = spawn_app().await;
    let creator = app.create_user("ayse@example.com", "Ayşe").await;

    let response = app
        .post(
            &creator,
            "/activities",
            json!({
                "title": "Kahve buluşması",
                "description": "Instagram: @ayse_kahve",
                "start_time": Utc::now() + Duration::days(1),
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "İçeriğiniz uygunsuz ifadeler içeriyor.");
    assert_eq!(body["violations"][0]["type"], "social_media");
}
