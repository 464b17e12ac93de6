use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::credentials::errors::StoreError;
use crate::credentials::models::Identity;
use crate::credentials::models::NewIdentity;
use crate::credentials::models::NewRefreshToken;
use crate::credentials::models::UserId;
use crate::credentials::models::Username;
use crate::credentials::ports::IdentityRepository;

pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_identity(row: &PgRow) -> Result<Identity, StoreError> {
        let username: String = row.try_get("username").map_err(database_error)?;

        Ok(Identity {
            id: UserId(row.try_get("id").map_err(database_error)?),
            username: Username::new(username)
                .map_err(|e| StoreError::Database(format!("Stored username is invalid: {}", e)))?,
            password_hash: row.try_get("password_hash").map_err(database_error)?,
            created_at: row.try_get("created_at").map_err(database_error)?,
        })
    }
}

fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn register(
        &self,
        identity: NewIdentity,
        first_session: NewRefreshToken,
    ) -> Result<Identity, StoreError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.username.as_str())
        .bind(&identity.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    tracing::debug!(
                        username = %identity.username,
                        constraint = ?db_err.constraint(),
                        "Username uniqueness violated on insert"
                    );
                    return StoreError::Conflict(identity.username.as_str().to_string());
                }
            }
            database_error(e)
        })?;

        let created = Self::row_to_identity(&row)?;

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(first_session.owner_id.0)
        .bind(&first_session.token)
        .bind(first_session.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        tx.commit().await.map_err(database_error)?;

        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref().map(Self::row_to_identity).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref().map(Self::row_to_identity).transpose()
    }
}
