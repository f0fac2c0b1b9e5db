// ============================================================================
// Real-time Messaging
// ============================================================================
//
// - events.rs: wire frames and the inter-worker envelope
// - broadcast.rs: per-conversation fan-out (local hub, Redis pub/sub)
// - persistence.rs: content filter + durable write
// - delivery.rs: post / read / typing, shared by WebSocket and HTTP
// - session.rs: per-connection state machine
// - conversations.rs: HTTP-level conversation workflows
// - typing.rs: stale typing indicator sweep
//
// ============================================================================

mod broadcast;
pub mod conversations;
pub mod delivery;
mod events;
mod persistence;
mod session;
mod typing;

pub use broadcast::{ChannelHub, ChatBroadcaster, LocalBroadcaster, Membership, RedisBroadcaster};
pub use events::{ChatEnvelope, ClientEvent, MessagePayload, ServerEvent};
pub use persistence::MessagePersistence;
pub use session::{ChatSession, Rejection, SessionState};
pub use typing::TypingSweepTask;
