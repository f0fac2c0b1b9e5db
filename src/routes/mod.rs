// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: Main router assembly and middleware
// - health.rs: Health check and metrics endpoints
// - conversations.rs: Conversation list/detail/create/send/read
// - activities.rs: Activity creation and the application workflow
// - moderation.rs: Reports and blocks
// - ws.rs: Real-time chat channel
// - extractors.rs: Custom Axum extractors (authenticated user, JSON body)
// - middleware.rs: Request logging
//
// ============================================================================

mod activities;
mod conversations;
mod extractors;
mod health;
mod middleware;
mod moderation;
mod ws;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        // Health and monitoring
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // Conversations
        .route("/conversations/", get(conversations::list_conversations))
        .route("/conversations/create", post(conversations::create_conversation))
        .route("/conversations/:id", get(conversations::get_conversation))
        .route("/conversations/:id/send", post(conversations::send_message))
        .route("/conversations/:id/read", post(conversations::mark_read))
        // Activities
        .route("/activities", post(activities::create_activity))
        .route("/activities/:id", get(activities::get_activity))
        .route("/activities/:id/apply", post(activities::apply))
        .route("/activities/:id/applications", get(activities::applications))
        .route(
            "/activities/:id/applications/:participation_id/respond",
            post(activities::respond),
        )
        // Moderation
        .route("/reports", post(moderation::create_report))
        .route(
            "/users/:id/block",
            post(moderation::block_user).delete(moderation::unblock_user),
        )
        // Real-time chat
        .route("/ws/chat/:conversation_id", get(ws::chat_socket))
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                // Tracing layer (outermost - runs first)
                .layer(TraceLayer::new_for_http())
                // Request logging
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .into_inner(),
        )
        .with_state(app_context)
}
