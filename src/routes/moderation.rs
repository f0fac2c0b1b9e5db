// ============================================================================
// Moderation Routes
// ============================================================================
//
// Endpoints:
// - POST   /reports          - Report a user, activity or message
// - POST   /users/:id/block  - Block a user
// - DELETE /users/:id/block  - Unblock a user
//
// Repeated reports and blocks answer 200 instead of an error.
//
// ============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use godo_error::AppError;

use crate::context::AppContext;
use crate::moderation::{self, BlockOutcome, BlockRequest, ReportOutcome, ReportRequest};
use crate::routes::extractors::{AuthenticatedUser, JsonBody};

/// POST /reports
pub async fn create_report(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(request): JsonBody<ReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = match moderation::report_content(&ctx, &user, request).await? {
        ReportOutcome::Created(report_id) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Şikayetiniz alındı. En kısa sürede incelenecektir.",
                "report_id": report_id,
            })),
        ),
        ReportOutcome::AlreadyPending => (
            StatusCode::OK,
            Json(json!({
                "message": "Bu içerik için zaten bekleyen bir şikayetiniz var.",
            })),
        ),
    };
    Ok(response)
}

/// POST /users/:id/block
///
/// The body is optional: `{}` or no body at all both block without a reason.
pub async fn block_user(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(blocked_id): Path<Uuid>,
    request: Option<Json<BlockRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let response = match moderation::block_user(&ctx, &user, blocked_id, request).await? {
        BlockOutcome::Created => (
            StatusCode::CREATED,
            Json(json!({ "message": "Kullanıcı başarıyla engellendi." })),
        ),
        BlockOutcome::AlreadyBlocked => (
            StatusCode::OK,
            Json(json!({ "message": "Bu kullanıcı zaten engellenmiş." })),
        ),
    };
    Ok(response)
}

/// DELETE /users/:id/block
pub async fn unblock_user(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(blocked_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    moderation::unblock_user(&ctx, &user, blocked_id).await?;
    Ok(Json(json!({ "message": "Kullanıcının engeli kaldırıldı." })))
}
