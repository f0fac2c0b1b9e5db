// ============================================================================
// Activities Routes
// ============================================================================
//
// Endpoints:
// - POST /activities                                   - Create an activity
// - GET  /activities/:id                               - Activity detail
// - POST /activities/:id/apply                         - Apply to join
// - GET  /activities/:id/applications                  - Applications (creator)
// - POST /activities/:id/applications/:pid/respond     - Approve or reject
//
// ============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use godo_error::AppError;

use crate::activities::{self, ApplyRequest, CreateActivityRequest, RespondRequest};
use crate::context::AppContext;
use crate::routes::extractors::{AuthenticatedUser, JsonBody};

/// POST /activities
pub async fn create_activity(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(request): JsonBody<CreateActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let activity = activities::create_activity(&ctx, &user, request).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// GET /activities/:id
pub async fn get_activity(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(activity_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(activities::get_activity(&ctx, activity_id).await?))
}

/// POST /activities/:id/apply
pub async fn apply(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(activity_id): Path<Uuid>,
    JsonBody(request): JsonBody<ApplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let participation = activities::apply_to_activity(&ctx, &user, activity_id, request).await?;
    Ok((StatusCode::CREATED, Json(participation)))
}

/// GET /activities/:id/applications
pub async fn applications(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(activity_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        activities::list_applications(&ctx, &user, activity_id).await?,
    ))
}

/// POST /activities/:id/applications/:participation_id/respond
pub async fn respond(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((activity_id, participation_id)): Path<(Uuid, Uuid)>,
    JsonBody(request): JsonBody<RespondRequest>,
) -> Result<impl IntoResponse, AppError> {
    let participation = activities::respond_to_application(
        &ctx,
        &user,
        activity_id,
        participation_id,
        request.action,
    )
    .await?;
    Ok(Json(participation))
}
