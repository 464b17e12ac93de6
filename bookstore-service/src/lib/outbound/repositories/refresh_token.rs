use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::credentials::errors::StoreError;
use crate::credentials::models::NewRefreshToken;
use crate::credentials::models::RefreshTokenRecord;
use crate::credentials::models::UserId;
use crate::credentials::ports::RefreshTokenRepository;

pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &PgRow) -> Result<RefreshTokenRecord, sqlx::Error> {
        Ok(RefreshTokenRecord {
            id: row.try_get("id")?,
            owner_id: UserId(row.try_get("user_id")?),
            token: row.try_get("token")?,
            expires_at: row.try_get("expires_at")?,
            revoked: row.try_get("revoked")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn insert_error(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::Conflict("refresh_tokens_token_key".to_string());
        }
    }
    StoreError::Database(e.to_string())
}

fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn create(&self, token: NewRefreshToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token.owner_id.0)
        .bind(&token.token)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token, expires_at, revoked, created_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref()
            .map(Self::row_to_record)
            .transpose()
            .map_err(database_error)
    }

    async fn revoke(&self, token: &str, owner_id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1 AND user_id = $2 AND revoked = FALSE
            "#,
        )
        .bind(token)
        .bind(owner_id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn rotate(
        &self,
        old_token: &str,
        replacement: NewRefreshToken,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        // Row lock taken here serializes concurrent rotations of the same
        // token; the loser re-evaluates the predicate and matches nothing.
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(old_token)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await.map_err(database_error)?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(replacement.owner_id.0)
        .bind(&replacement.token)
        .bind(replacement.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(insert_error)?;

        tx.commit().await.map_err(database_error)?;

        Ok(true)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
