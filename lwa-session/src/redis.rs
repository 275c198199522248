use async_trait::async_trait;
use lwa_core::AuthError;
use redis::AsyncCommands;

use crate::SessionStore;

/// A Redis-backed [`SessionStore`].
///
/// Every value is written with a fixed TTL covering one login round-trip, so
/// abandoned attempts expire on their own.
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
    ttl: chrono::Duration,
}

impl RedisStore {
    pub fn new(redis_url: &str, prefix: String) -> Result<Self, AuthError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AuthError::Session(format!("Failed to open redis client: {}", e)))?;
        Ok(Self {
            client,
            prefix,
            ttl: chrono::Duration::minutes(15),
        })
    }

    /// Override the per-value TTL.
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn key(&self, session_id: &str, key: &str) -> String {
        format!("{}:{}:{}", self.prefix, session_id, key)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AuthError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AuthError::Session(format!("Redis connection error: {}", e)))
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, AuthError> {
        let mut conn = self.connection().await?;

        let value: Option<String> = conn
            .get(self.key(session_id, key))
            .await
            .map_err(|e| AuthError::Session(format!("Redis get error: {}", e)))?;

        Ok(value)
    }

    async fn set(&self, session_id: &str, key: &str, value: &str) -> Result<(), AuthError> {
        let mut conn = self.connection().await?;

        let ttl = self.ttl.num_seconds().max(1) as u64;
        let _: () = conn
            .set_ex(self.key(session_id, key), value, ttl)
            .await
            .map_err(|e| AuthError::Session(format!("Redis set error: {}", e)))?;

        Ok(())
    }

    async fn remove(&self, session_id: &str, key: &str) -> Result<(), AuthError> {
        let mut conn = self.connection().await?;

        let _: () = conn
            .del(self.key(session_id, key))
            .await
            .map_err(|e| AuthError::Session(format!("Redis del error: {}", e)))?;

        Ok(())
    }

    // GETDEL keeps the state consume atomic across racing callbacks.
    async fn take(&self, session_id: &str, key: &str) -> Result<Option<String>, AuthError> {
        let mut conn = self.connection().await?;

        let value: Option<String> = conn
            .get_del(self.key(session_id, key))
            .await
            .map_err(|e| AuthError::Session(format!("Redis getdel error: {}", e)))?;

        Ok(value)
    }
}
