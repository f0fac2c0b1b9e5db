// ============================================================================
// Chat WebSocket Route
// ============================================================================
//
// GET /ws/chat/:conversation_id?token=<jwt>
//
// The caller is authorized before the upgrade. A rejected caller gets a bare
// status code and the connection is never upgraded.
//
// ============================================================================

use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::context::AppContext;
use crate::messaging::ChatSession;
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub token: Option<String>,
}

pub async fn chat_socket(
    State(ctx): State<Arc<AppContext>>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<ChatQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    match ChatSession::authorize(ctx, conversation_id, query.token.as_deref()).await {
        Ok(session) => ws.on_upgrade(move |socket| session.run(socket)),
        Err(rejection) => {
            metrics::WS_CONNECTIONS_REJECTED_TOTAL.inc();
            tracing::warn!(
                conversation_id = %conversation_id,
                rejection = ?rejection,
                "Chat connection rejected"
            );
            rejection.status_code().into_response()
        }
    }
}
