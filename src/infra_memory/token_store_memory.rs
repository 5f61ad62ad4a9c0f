use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    // keyed by refresh token id
    pairs: HashMap<TokenId, TokenPairRecord>,
    // access token id -> refresh token id
    by_access: HashMap<TokenId, TokenId>,
    grants: HashMap<TokenId, ResetGrant>,
}

impl Tables {
    fn insert(&mut self, record: TokenPairRecord) {
        self.by_access
            .insert(record.access_token_id, record.refresh_token_id);
        self.pairs.insert(record.refresh_token_id, record);
    }

    fn remove(&mut self, refresh: TokenId) -> bool {
        match self.pairs.remove(&refresh) {
            Some(record) => {
                self.by_access.remove(&record.access_token_id);
                true
            }
            None => false,
        }
    }
}

/// Single-process token store. Every operation, `replace` included, runs
/// under one mutex, so observers never see a half-applied rotation.
#[derive(Default)]
pub struct MemoryTokenStore {
    tables: Mutex<Tables>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.tables().pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records_for(&self, subject: Subject) -> Vec<TokenPairRecord> {
        self.tables()
            .pairs
            .values()
            .filter(|r| r.subject == subject)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, record: TokenPairRecord) -> Result<(), TokenError> {
        let mut tables = self.tables();
        if tables.pairs.contains_key(&record.refresh_token_id)
            || tables.by_access.contains_key(&record.access_token_id)
        {
            return Err(TokenError::StoreFailure(format!(
                "duplicate token id in pair {}",
                record.pair_id
            )));
        }
        tables.insert(record);
        Ok(())
    }

    async fn find_by_access(
        &self,
        token_id: TokenId,
    ) -> Result<Option<TokenPairRecord>, TokenError> {
        let tables = self.tables();
        Ok(tables
            .by_access
            .get(&token_id)
            .and_then(|refresh| tables.pairs.get(refresh))
            .cloned())
    }

    async fn find_by_refresh(
        &self,
        token_id: TokenId,
    ) -> Result<Option<TokenPairRecord>, TokenError> {
        Ok(self.tables().pairs.get(&token_id).cloned())
    }

    async fn delete_by_refresh(&self, token_id: TokenId) -> Result<bool, TokenError> {
        Ok(self.tables().remove(token_id))
    }

    async fn delete_all_for_subject(&self, subject: Subject) -> Result<usize, TokenError> {
        let mut tables = self.tables();
        let doomed: Vec<TokenId> = tables
            .pairs
            .values()
            .filter(|r| r.subject == subject)
            .map(|r| r.refresh_token_id)
            .collect();
        for refresh in &doomed {
            tables.remove(*refresh);
        }
        Ok(doomed.len())
    }

    async fn replace(
        &self,
        old_refresh: TokenId,
        new_record: TokenPairRecord,
    ) -> Result<(), TokenError> {
        let mut tables = self.tables();
        if !tables.remove(old_refresh) {
            return Err(TokenError::Revoked);
        }
        tables.insert(new_record);
        Ok(())
    }

    async fn put_reset_grant(&self, grant: ResetGrant) -> Result<(), TokenError> {
        self.tables().grants.insert(grant.token_id, grant);
        Ok(())
    }

    async fn find_reset_grant(&self, token_id: TokenId) -> Result<Option<ResetGrant>, TokenError> {
        Ok(self.tables().grants.get(&token_id).cloned())
    }

    async fn take_reset_grant(&self, token_id: TokenId) -> Result<bool, TokenError> {
        Ok(self.tables().grants.remove(&token_id).is_some())
    }

    async fn delete_expired_reset_grants(&self, now: DateTime<Utc>) -> Result<usize, TokenError> {
        let mut tables = self.tables();
        let before = tables.grants.len();
        tables.grants.retain(|_, grant| grant.expires_at > now);
        Ok(before - tables.grants.len())
    }
}
