use crate::application_impl::{RevocationManager, TokenValidator};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Single-use reset tokens. Completing a reset revokes every lineage of the
/// subject; the password change itself belongs to the caller.
pub struct PasswordResetFlow {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    validator: Arc<TokenValidator>,
    revocation: Arc<RevocationManager>,
    reset_ttl: Duration,
}

impl PasswordResetFlow {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        validator: Arc<TokenValidator>,
        revocation: Arc<RevocationManager>,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            store,
            clock,
            validator,
            revocation,
            reset_ttl,
        }
    }

    pub async fn issue_reset(&self, subject: Subject) -> Result<ResetToken, TokenError> {
        let claim = Claim::mint(subject, TokenType::Reset, self.clock.now(), self.reset_ttl);
        let token = self.codec.encode(&claim)?;

        self.store
            .put_reset_grant(ResetGrant {
                token_id: claim.token_id,
                subject,
                created_at: claim.issued_at,
                expires_at: claim.expires_at,
            })
            .await?;

        info!(%subject, "issued reset token");
        Ok(ResetToken(token))
    }

    pub async fn complete_reset(&self, reset_token: &str) -> Result<Subject, TokenError> {
        let claim = self.validator.validate(reset_token, TokenType::Reset).await?;

        // Revoke before consuming the grant: a failed revoke leaves the token
        // usable for a retry, and revoking twice is harmless.
        self.revocation.revoke_all(claim.subject).await?;

        // Two completions may both pass validation; only one can take the grant.
        if !self.store.take_reset_grant(claim.token_id).await? {
            return Err(TokenError::Revoked);
        }

        Ok(claim.subject)
    }

    /// Drop grants whose token expired unused.
    pub async fn purge_expired(&self) -> Result<usize, TokenError> {
        let purged = self
            .store
            .delete_expired_reset_grants(self.clock.now())
            .await?;
        if purged > 0 {
            info!(purged, "purged expired reset grants");
        }
        Ok(purged)
    }
}
