use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Replay cache shared across instances. Values are the JSON encoded pair,
/// expired by Redis itself.
pub struct RedisReplayCache {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisReplayCache {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisReplayCache {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, token_id: TokenId) -> String {
        format!("{}:replay:{}", self.prefix, token_id)
    }
}

#[async_trait::async_trait]
impl ReplayCache for RedisReplayCache {
    async fn get(&self, token_id: TokenId) -> Result<Option<TokenPair>, TokenError> {
        let key = self.key(token_id);
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&key).await.map_err(TokenError::store)?;
        raw.map(|json| serde_json::from_str(&json).map_err(TokenError::store))
            .transpose()
    }

    async fn put(
        &self,
        token_id: TokenId,
        pair: &TokenPair,
        ttl: Duration,
    ) -> Result<(), TokenError> {
        let key = self.key(token_id);
        let json = serde_json::to_string(pair).map_err(TokenError::store)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .pset_ex(&key, json, ttl.as_millis().max(1) as u64)
            .await
            .map_err(TokenError::store)?;
        Ok(())
    }
}
