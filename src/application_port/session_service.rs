use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum TokenError {
    #[error("token malformed")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("wrong token type")]
    WrongTokenType,
    #[error("token revoked")]
    Revoked,
    #[error("timed out waiting for rotation lock")]
    LockTimeout,
    #[error("store error: {0}")]
    StoreFailure(String),
}

impl TokenError {
    pub fn store<E: std::fmt::Display>(error: E) -> TokenError {
        TokenError::StoreFailure(error.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::Expired => "expired",
            TokenError::WrongTokenType => "wrong_token_type",
            TokenError::Revoked => "revoked",
            TokenError::LockTimeout => "lock_timeout",
            TokenError::StoreFailure(_) => "store_failure",
        }
    }

    /// Only lock contention is worth retrying with the same token.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TokenError::LockTimeout)
    }
}

/// An access token and refresh token issued together.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Pure claim <-> bearer string conversion. Expiry and store state are
/// checked by the callers, never here.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, claim: &Claim) -> Result<String, TokenError>;
    fn decode(&self, token: &str) -> Result<Claim, TokenError>;
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Issue the first pair of a new lineage, after the caller has checked credentials.
    async fn issue(&self, subject: Subject) -> Result<TokenPair, TokenError>;
    async fn validate(&self, token: &str, expected: TokenType) -> Result<Claim, TokenError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, TokenError>;
    /// Revoke every lineage of the subject. Returns how many were removed.
    async fn logout(&self, subject: Subject) -> Result<usize, TokenError>;
    async fn issue_reset(&self, subject: Subject) -> Result<ResetToken, TokenError>;
    /// Consume a reset token and revoke the subject's sessions. The caller
    /// updates the password once this returns.
    async fn complete_reset(&self, reset_token: &str) -> Result<Subject, TokenError>;
}
