use super::util::is_dup_key;
use anyhow::anyhow;
use crate::domain_model::PersistedSession;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// `TokenStore` over the `session_token` table (see `sql/session_token.sql`).
pub struct MySqlTokenStore {
    pool: MySqlPool,
}

impl MySqlTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlTokenStore { pool }
    }

    fn row_to_session(row: MySqlRow) -> Result<PersistedSession, TokenStoreError> {
        let identifier: String = row
            .try_get("identifier")
            .map_err(|e| TokenStoreError::InternalError(anyhow!(e)))?;
        let verifier_hash: String = row
            .try_get("verifier_hash")
            .map_err(|e| TokenStoreError::InternalError(anyhow!(e)))?;
        let expiration_date_time: DateTime<Utc> = row
            .try_get("expiration_date_time")
            .map_err(|e| TokenStoreError::InternalError(anyhow!(e)))?;
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| TokenStoreError::InternalError(anyhow!(e)))?;
        let details: String = row
            .try_get("details")
            .map_err(|e| TokenStoreError::InternalError(anyhow!(e)))?;

        Ok(PersistedSession {
            identifier,
            verifier_hash,
            expiration_date_time,
            user_id,
            details,
        })
    }
}

#[async_trait::async_trait]
impl TokenStore for MySqlTokenStore {
    async fn create(&self, session: PersistedSession) -> Result<(), TokenStoreError> {
        sqlx::query(
            r#"
INSERT INTO session_token (identifier, verifier_hash, expiration_date_time, user_id, details)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(&session.identifier)
        .bind(&session.verifier_hash)
        .bind(session.expiration_date_time)
        .bind(&session.user_id)
        .bind(&session.details)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                TokenStoreError::AlreadyExists
            } else {
                TokenStoreError::Store(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<PersistedSession, TokenStoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT identifier, verifier_hash, expiration_date_time, user_id, details
FROM session_token
WHERE identifier = ?
"#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Store(e.to_string()))?;

        row_opt
            .map(Self::row_to_session)
            .transpose()?
            .ok_or(TokenStoreError::NotFound)
    }

    async fn update(&self, session: PersistedSession) -> Result<(), TokenStoreError> {
        // sqlx connects with CLIENT_FOUND_ROWS, so an unchanged row still counts
        let result = sqlx::query(
            r#"
UPDATE session_token
SET expiration_date_time = ?
WHERE identifier = ?
"#,
        )
        .bind(session.expiration_date_time)
        .bind(&session.identifier)
        .execute(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(TokenStoreError::NotFound);
        }
        Ok(())
    }

    async fn revoke(&self, identifier: &str) -> Result<(), TokenStoreError> {
        sqlx::query(
            r#"
DELETE FROM session_token
WHERE identifier = ?
"#,
        )
        .bind(identifier)
        .execute(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Store(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<PersistedSession>, TokenStoreError> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
SELECT identifier, verifier_hash, expiration_date_time, user_id, details
FROM session_token
WHERE user_id = ?
"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TokenStoreError::Store(e.to_string()))?;

        rows.into_iter().map(Self::row_to_session).collect()
    }
}
