// ============================================================================
// Conversations Routes
// ============================================================================
//
// Endpoints:
// - GET  /conversations/          - Caller's conversations
// - POST /conversations/create    - Create (201) or reuse a direct one (200)
// - GET  /conversations/:id       - Detail with messages, marks them read
// - POST /conversations/:id/send  - Send a message
// - POST /conversations/:id/read  - Mark incoming messages read
//
// ============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use godo_error::AppError;

use crate::context::AppContext;
use crate::messaging::conversations::{self, CreateConversationRequest};
use crate::routes::extractors::{AuthenticatedUser, JsonBody};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// GET /conversations/
pub async fn list_conversations(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let summaries = conversations::list_conversations(&ctx, &user).await?;
    Ok(Json(summaries))
}

/// POST /conversations/create
pub async fn create_conversation(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(request): JsonBody<CreateConversationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (detail, created) = conversations::create_conversation(&ctx, &user, request).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(detail)))
}

/// GET /conversations/:id
pub async fn get_conversation(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = conversations::conversation_detail(&ctx, &user, conversation_id).await?;
    Ok(Json(detail))
}

/// POST /conversations/:id/send
pub async fn send_message(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(conversation_id): Path<Uuid>,
    JsonBody(request): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message =
        conversations::send_message(&ctx, &user, conversation_id, &request.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /conversations/:id/read
pub async fn mark_read(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let marked = conversations::mark_read(&ctx, &user, conversation_id).await?;
    Ok(Json(json!({ "marked_read": marked })))
}
