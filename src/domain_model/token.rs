use super::Subject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Join key between a bearer token and its store record. Minted from a v4
/// uuid, so it is not guessable from other ids.
#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct TokenId(pub uuid::Uuid);

impl TokenId {
    pub fn generate() -> Self {
        TokenId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TokenId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(TokenId)
    }
}

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct PairId(pub uuid::Uuid);

impl PairId {
    pub fn generate() -> Self {
        PairId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
    Reset,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::Reset => "reset",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried inside a bearer token. Times are whole seconds, which is
/// the precision the wire format keeps.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub subject: Subject,
    pub token_type: TokenType,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub token_id: TokenId,
}

impl Claim {
    pub fn mint(
        subject: Subject,
        token_type: TokenType,
        now: DateTime<Utc>,
        ttl: std::time::Duration,
    ) -> Self {
        let issued_at = truncate_to_secs(now);
        Claim {
            subject,
            token_type,
            issued_at,
            expires_at: issued_at + ttl,
            token_id: TokenId::generate(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub fn truncate_to_secs(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

/// One active session lineage.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenPairRecord {
    pub pair_id: PairId,
    pub subject: Subject,
    pub access_token_id: TokenId,
    pub refresh_token_id: TokenId,
    pub created_at: DateTime<Utc>,
}

/// Store-side proof that a reset token has not been used yet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResetGrant {
    pub token_id: TokenId,
    pub subject: Subject,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResetToken(pub String);
