use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct TokenValidator {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl TokenValidator {
    pub fn new(codec: Arc<dyn TokenCodec>, store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec,
            store,
            clock,
        }
    }

    pub async fn validate(&self, token: &str, expected: TokenType) -> Result<Claim, TokenError> {
        let claim = self.codec.decode(token)?;
        self.check(&claim, expected).await?;
        Ok(claim)
    }

    /// Type, expiry and liveness checks for an already decoded claim. Read-only.
    pub async fn check(&self, claim: &Claim, expected: TokenType) -> Result<(), TokenError> {
        if claim.token_type != expected {
            return Err(TokenError::WrongTokenType);
        }
        if claim.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        let live = match claim.token_type {
            TokenType::Access => self
                .store
                .find_by_access(claim.token_id)
                .await?
                .is_some_and(|r| r.subject == claim.subject),
            TokenType::Refresh => self
                .store
                .find_by_refresh(claim.token_id)
                .await?
                .is_some_and(|r| r.subject == claim.subject),
            TokenType::Reset => self
                .store
                .find_reset_grant(claim.token_id)
                .await?
                .is_some_and(|g| g.subject == claim.subject),
        };
        if !live {
            return Err(TokenError::Revoked);
        }

        Ok(())
    }
}
