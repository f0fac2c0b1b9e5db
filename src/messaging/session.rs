// ============================================================================
// Chat Session
// ============================================================================
//
// One task per connection:
//
//   Connecting  - token taken from the handshake, resolved to an identity
//   Authorizing - anonymous or non-participant identities are rejected
//   Joined      - membership in the conversation's broadcast group
//   Closed      - membership dropped, nothing more is delivered
//
// Connecting and Authorizing run before the WebSocket upgrade, so a rejected
// client never gets a socket and learns nothing about the conversation.
//
// ============================================================================

use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::http::StatusCode;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

use super::broadcast::Membership;
use super::delivery;
use super::events::ClientEvent;
use crate::auth::{resolve_identity, Identity};
use crate::context::AppContext;
use crate::metrics;
use crate::store::{Conversation, User};
use crate::utils::loggable_user;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authorizing,
    Joined,
    Closed,
}

/// Why a connection never reached `Joined`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No token, a bad or expired token, or an inactive user
    Unauthenticated,
    /// Unknown conversation, or the user is not in it
    NotParticipant,
    /// Storage failed while authorizing
    Unavailable,
}

impl Rejection {
    /// Status answered instead of upgrading. The body is always empty.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Rejection::Unauthenticated | Rejection::NotParticipant => StatusCode::FORBIDDEN,
            Rejection::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

pub struct ChatSession {
    ctx: Arc<AppContext>,
    conversation: Conversation,
    user: User,
    state: SessionState,
}

impl ChatSession {
    /// Runs Connecting and Authorizing. On success the session is ready to join.
    pub async fn authorize(
        ctx: Arc<AppContext>,
        conversation_id: Uuid,
        token: Option<&str>,
    ) -> Result<Self, Rejection> {
        tracing::debug!(
            conversation_id = %conversation_id,
            state = ?SessionState::Connecting,
            "Chat connection attempt"
        );

        let identity = resolve_identity(&ctx.auth_manager, ctx.store.as_ref(), token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Identity lookup failed");
                Rejection::Unavailable
            })?;

        tracing::debug!(
            conversation_id = %conversation_id,
            state = ?SessionState::Authorizing,
            "Chat connection identity resolved"
        );

        let user = match identity {
            Identity::User(user) => user,
            Identity::Anonymous => return Err(Rejection::Unauthenticated),
        };

        let conversation = match ctx.store.get_conversation(conversation_id).await {
            Ok(Some(conversation)) if conversation.has_participant(&user.id) => conversation,
            Ok(_) => return Err(Rejection::NotParticipant),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    conversation_id = %conversation_id,
                    "Conversation lookup failed"
                );
                return Err(Rejection::Unavailable);
            }
        };

        Ok(Self {
            ctx,
            conversation,
            user,
            state: SessionState::Authorizing,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Joins the broadcast group. Events published from now on are delivered.
    pub fn join(&mut self) -> Membership {
        let membership = self.ctx.broadcaster.join(self.conversation.id);
        self.transition(SessionState::Joined);
        membership
    }

    /// Serves the socket until either side goes away
    pub async fn run(mut self, socket: WebSocket) {
        let mut membership = self.join();
        metrics::WS_CONNECTIONS_TOTAL.inc();
        metrics::WS_ACTIVE_CONNECTIONS.inc();

        let (mut ws_sender, mut ws_receiver) = socket.split();

        loop {
            tokio::select! {
                frame = ws_receiver.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => self.handle_frame(&text).await,
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    // Pings are answered by the protocol layer; binary frames are not part of the protocol
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "Chat socket read failed");
                        break;
                    }
                },
                envelope = membership.recv() => {
                    let Some(envelope) = envelope else { break };
                    if !envelope.is_for(self.user.id) {
                        continue;
                    }

                    let text = match serde_json::to_string(&envelope.event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize chat event");
                            continue;
                        }
                    };
                    if ws_sender.send(WsMessage::Text(text)).await.is_err() {
                        break;
                    }
                }
            }
        }

        drop(membership);
        metrics::WS_ACTIVE_CONNECTIONS.dec();
        self.transition(SessionState::Closed);
    }

    /// Handles one text frame. Undecodable frames are dropped.
    pub async fn handle_frame(&self, text: &str) {
        match ClientEvent::parse(text) {
            Some(event) => self.handle_event(event).await,
            None => {
                tracing::debug!(
                    conversation_id = %self.conversation.id,
                    "Dropping malformed chat frame"
                );
            }
        }
    }

    pub async fn handle_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::ChatMessage { content } => {
                let content = content.trim();
                if content.is_empty() {
                    return;
                }
                if content.chars().count() > self.ctx.config.chat.max_message_length {
                    tracing::debug!(
                        conversation_id = %self.conversation.id,
                        "Dropping oversized chat message"
                    );
                    return;
                }

                if let Err(e) =
                    delivery::post_message(&self.ctx, &self.conversation, &self.user, content)
                        .await
                {
                    tracing::error!(
                        error = %e,
                        conversation_id = %self.conversation.id,
                        "Failed to persist chat message, not broadcasting"
                    );
                }
            }
            ClientEvent::Typing { is_typing } => {
                delivery::set_typing(&self.ctx, self.conversation.id, &self.user, is_typing).await;
            }
            ClientEvent::Read => {
                if let Err(e) =
                    delivery::mark_read(&self.ctx, self.conversation.id, self.user.id).await
                {
                    tracing::error!(
                        error = %e,
                        conversation_id = %self.conversation.id,
                        "Failed to mark conversation read"
                    );
                }
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        let user = loggable_user(&self.user.id, &self.ctx.config.logging);
        match next {
            SessionState::Joined => tracing::info!(
                conversation_id = %self.conversation.id,
                user = %user,
                "Chat connection joined"
            ),
            SessionState::Closed => tracing::info!(
                conversation_id = %self.conversation.id,
                user = %user,
                "Chat connection closed"
            ),
            _ => tracing::debug!(state = ?next, "Chat connection state change"),
        }
        self.state = next;
    }
}
