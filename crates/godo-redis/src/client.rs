//! Redis client implementation with connection management

use crate::Result;
use redis::{aio::ConnectionManager, AsyncCommands};

/// Redis client with automatic reconnection
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    conn: ConnectionManager,
}

impl RedisClient {
    /// Connect to Redis server
    ///
    /// Supports both redis:// and rediss:// (TLS) URLs
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client.clone()).await?;
        Ok(Self { client, conn })
    }

    /// Underlying client, used to open dedicated pub/sub connections
    pub fn client(&self) -> &redis::Client {
        &self.client
    }

    /// PUBLISH - returns the number of subscribers that received the payload
    pub async fn publish(&mut self, channel: &str, payload: &str) -> Result<i64> {
        self.conn.publish(channel, payload).await
    }

    /// PING - used by health checks
    pub async fn ping(&mut self) -> Result<()> {
        let _: String = redis::cmd("PING").query_async(&mut self.conn).await?;
        Ok(())
    }
}
