//! # GoDo Redis
//!
//! Low-level Redis plumbing for the GoDo server: a managed connection for
//! commands and publishing, plus a self-healing pattern subscriber.
//!
//! No business logic lives here; channel naming and payload formats belong to
//! the caller.
//!
//! ```rust,no_run
//! use godo_redis::RedisClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RedisClient::connect("redis://localhost:6379").await?;
//!     client.publish("chat:1", "{}").await?;
//!     Ok(())
//! }
//! ```

mod client;
mod pubsub;

pub use client::RedisClient;
pub use pubsub::{run_pattern_subscriber, PubSubMessage};

pub use redis::RedisError;

/// Result type for Redis operations
pub type Result<T> = std::result::Result<T, RedisError>;
