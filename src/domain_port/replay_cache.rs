use crate::application_port::*;
use crate::domain_model::*;
use std::time::Duration;

/// Short-lived map from a rotated refresh token id to the pair it produced.
#[async_trait::async_trait]
pub trait ReplayCache: Send + Sync {
    async fn get(&self, token_id: TokenId) -> Result<Option<TokenPair>, TokenError>;

    async fn put(&self, token_id: TokenId, pair: &TokenPair, ttl: Duration)
    -> Result<(), TokenError>;
}
