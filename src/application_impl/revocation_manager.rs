use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::info;

/// Bulk invalidation of a subject's lineages. Leaves the replay cache alone:
/// cached rotation results are rejected by the liveness check once their
/// records are gone.
pub struct RevocationManager {
    store: Arc<dyn TokenStore>,
}

impl RevocationManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub async fn revoke_all(&self, subject: Subject) -> Result<usize, TokenError> {
        let revoked = self.store.delete_all_for_subject(subject).await?;
        info!(%subject, revoked, "revoked session lineages");
        Ok(revoked)
    }
}
