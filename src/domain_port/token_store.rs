use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Durable record of active token pairs and unused reset grants.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn put(&self, record: TokenPairRecord) -> Result<(), TokenError>;

    async fn find_by_access(&self, token_id: TokenId)
    -> Result<Option<TokenPairRecord>, TokenError>;

    async fn find_by_refresh(
        &self,
        token_id: TokenId,
    ) -> Result<Option<TokenPairRecord>, TokenError>;

    /// Returns whether a record was removed.
    async fn delete_by_refresh(&self, token_id: TokenId) -> Result<bool, TokenError>;

    /// Returns how many records were removed.
    async fn delete_all_for_subject(&self, subject: Subject) -> Result<usize, TokenError>;

    /// Supersede the record owning `old_refresh` with `new_record`.
    ///
    /// Installs the new record before deleting the old one. If the old record
    /// is already gone (a logout raced the rotation) the new record is removed
    /// again and the call fails with `Revoked`. On `StoreFailure` the old
    /// record is left in place.
    async fn replace(
        &self,
        old_refresh: TokenId,
        new_record: TokenPairRecord,
    ) -> Result<(), TokenError> {
        let new_refresh = new_record.refresh_token_id;
        self.put(new_record).await?;

        match self.delete_by_refresh(old_refresh).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.delete_by_refresh(new_refresh).await?;
                Err(TokenError::Revoked)
            }
            Err(e) => {
                if let Err(undo) = self.delete_by_refresh(new_refresh).await {
                    tracing::error!(%new_refresh, error = %undo, "failed to remove orphaned pair record");
                }
                Err(e)
            }
        }
    }

    async fn put_reset_grant(&self, grant: ResetGrant) -> Result<(), TokenError>;

    async fn find_reset_grant(&self, token_id: TokenId) -> Result<Option<ResetGrant>, TokenError>;

    /// Consume a grant. Returns false if it was already used or never existed.
    async fn take_reset_grant(&self, token_id: TokenId) -> Result<bool, TokenError>;

    /// Remove grants that expired unused at or before `now`. Returns how many.
    async fn delete_expired_reset_grants(&self, now: DateTime<Utc>) -> Result<usize, TokenError>;
}
