use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Token store over the `token_pair` and `reset_grant` tables
/// (see `sql/token_store.sql`).
pub struct MySqlTokenStore {
    pool: MySqlPool,
}

impl MySqlTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlTokenStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<TokenPairRecord, TokenError> {
        let pair_id: PairId = row.try_get("pair_id").map_err(TokenError::store)?;
        let subject: Subject = row.try_get("subject").map_err(TokenError::store)?;
        let access_token_id: TokenId = row.try_get("access_token_id").map_err(TokenError::store)?;
        let refresh_token_id: TokenId =
            row.try_get("refresh_token_id").map_err(TokenError::store)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(TokenError::store)?;

        Ok(TokenPairRecord {
            pair_id,
            subject,
            access_token_id,
            refresh_token_id,
            created_at,
        })
    }

    fn row_to_grant(row: MySqlRow) -> Result<ResetGrant, TokenError> {
        Ok(ResetGrant {
            token_id: row.try_get("token_id").map_err(TokenError::store)?,
            subject: row.try_get("subject").map_err(TokenError::store)?,
            created_at: row.try_get("created_at").map_err(TokenError::store)?,
            expires_at: row.try_get("expires_at").map_err(TokenError::store)?,
        })
    }

    async fn find_one(
        &self,
        column: &'static str,
        token_id: TokenId,
    ) -> Result<Option<TokenPairRecord>, TokenError> {
        let sql = format!(
            r#"
SELECT pair_id, subject, access_token_id, refresh_token_id, created_at
FROM token_pair
WHERE {column} = ?
"#
        );
        let row_opt: Option<MySqlRow> = sqlx::query(&sql)
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TokenError::StoreFailure(format!("token_pair select: {e}")))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}

#[async_trait::async_trait]
impl TokenStore for MySqlTokenStore {
    async fn put(&self, record: TokenPairRecord) -> Result<(), TokenError> {
        sqlx::query(
            r#"
INSERT INTO token_pair (pair_id, subject, access_token_id, refresh_token_id, created_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(record.pair_id)
        .bind(record.subject)
        .bind(record.access_token_id)
        .bind(record.refresh_token_id)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| TokenError::StoreFailure(format!("token_pair insert: {e}")))?;

        Ok(())
    }

    async fn find_by_access(
        &self,
        token_id: TokenId,
    ) -> Result<Option<TokenPairRecord>, TokenError> {
        self.find_one("access_token_id", token_id).await
    }

    async fn find_by_refresh(
        &self,
        token_id: TokenId,
    ) -> Result<Option<TokenPairRecord>, TokenError> {
        self.find_one("refresh_token_id", token_id).await
    }

    async fn delete_by_refresh(&self, token_id: TokenId) -> Result<bool, TokenError> {
        let res = sqlx::query("DELETE FROM token_pair WHERE refresh_token_id = ?")
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(|e| TokenError::StoreFailure(format!("token_pair delete: {e}")))?;

        Ok(res.rows_affected() > 0)
    }

    async fn delete_all_for_subject(&self, subject: Subject) -> Result<usize, TokenError> {
        let res = sqlx::query("DELETE FROM token_pair WHERE subject = ?")
            .bind(subject)
            .execute(&self.pool)
            .await
            .map_err(|e| TokenError::StoreFailure(format!("token_pair delete all: {e}")))?;

        Ok(res.rows_affected() as usize)
    }

    /// Delete and insert in one transaction; nothing is visible until commit.
    async fn replace(
        &self,
        old_refresh: TokenId,
        new_record: TokenPairRecord,
    ) -> Result<(), TokenError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TokenError::StoreFailure(format!("begin: {e}")))?;

        let deleted = sqlx::query("DELETE FROM token_pair WHERE refresh_token_id = ?")
            .bind(old_refresh)
            .execute(&mut *tx)
            .await
            .map_err(|e| TokenError::StoreFailure(format!("token_pair delete: {e}")))?
            .rows_affected();

        if deleted == 0 {
            tx.rollback()
                .await
                .map_err(|e| TokenError::StoreFailure(format!("rollback: {e}")))?;
            return Err(TokenError::Revoked);
        }

        sqlx::query(
            r#"
INSERT INTO token_pair (pair_id, subject, access_token_id, refresh_token_id, created_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(new_record.pair_id)
        .bind(new_record.subject)
        .bind(new_record.access_token_id)
        .bind(new_record.refresh_token_id)
        .bind(new_record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| TokenError::StoreFailure(format!("token_pair insert: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| TokenError::StoreFailure(format!("commit: {e}")))?;

        Ok(())
    }

    async fn put_reset_grant(&self, grant: ResetGrant) -> Result<(), TokenError> {
        sqlx::query(
            r#"
INSERT INTO reset_grant (token_id, subject, created_at, expires_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(grant.token_id)
        .bind(grant.subject)
        .bind(grant.created_at)
        .bind(grant.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| TokenError::StoreFailure(format!("reset_grant insert: {e}")))?;

        Ok(())
    }

    async fn find_reset_grant(&self, token_id: TokenId) -> Result<Option<ResetGrant>, TokenError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token_id, subject, created_at, expires_at
FROM reset_grant
WHERE token_id = ?
"#,
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TokenError::StoreFailure(format!("reset_grant select: {e}")))?;

        row_opt.map(Self::row_to_grant).transpose()
    }

    async fn take_reset_grant(&self, token_id: TokenId) -> Result<bool, TokenError> {
        let res = sqlx::query("DELETE FROM reset_grant WHERE token_id = ?")
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(|e| TokenError::StoreFailure(format!("reset_grant delete: {e}")))?;

        Ok(res.rows_affected() == 1)
    }

    async fn delete_expired_reset_grants(&self, now: DateTime<Utc>) -> Result<usize, TokenError> {
        let res = sqlx::query("DELETE FROM reset_grant WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| TokenError::StoreFailure(format!("reset_grant purge: {e}")))?;

        Ok(res.rows_affected() as usize)
    }
}
