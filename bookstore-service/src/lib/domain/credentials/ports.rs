use async_trait::async_trait;
use auth::TokenPair;
use chrono::DateTime;
use chrono::Utc;

use crate::credentials::errors::AuthError;
use crate::credentials::errors::StoreError;
use crate::credentials::models::Identity;
use crate::credentials::models::NewIdentity;
use crate::credentials::models::NewRefreshToken;
use crate::credentials::models::RefreshTokenRecord;
use crate::credentials::models::Registration;
use crate::credentials::models::UserId;
use crate::credentials::models::Username;

/// Port for authentication operations exposed to inbound adapters.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new identity and open its first session.
    ///
    /// # Arguments
    /// * `username` - Validated username
    /// * `password` - Plaintext password (hashed by the service)
    ///
    /// # Returns
    /// New identity id with an access/refresh token pair
    ///
    /// # Errors
    /// * `UserAlreadyExists` - Username is taken
    /// * `Internal` - Store, hasher or signer failure
    async fn register(&self, username: &Username, password: &str)
        -> Result<Registration, AuthError>;

    /// Verify credentials and open a new session.
    ///
    /// Existing sessions of the same identity stay valid.
    ///
    /// # Errors
    /// * `UserNotFound` - No identity with this username
    /// * `InvalidPassword` - Password does not match
    /// * `Internal` - Store, hasher or signer failure
    async fn login(&self, username: &Username, password: &str) -> Result<TokenPair, AuthError>;

    /// Exchange a refresh token for a new pair, revoking the presented one.
    ///
    /// # Errors
    /// * `InvalidToken` - Token unknown, expired, revoked, or rotated concurrently
    /// * `Internal` - Store or signer failure
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke one of `owner`'s refresh tokens.
    ///
    /// Unknown, already revoked, or foreign tokens are not an error and are
    /// left untouched.
    ///
    /// # Errors
    /// * `Internal` - Store failure
    async fn logout(&self, owner: &UserId, refresh_token: &str) -> Result<(), AuthError>;

    /// Look up the identity an access token was issued to.
    ///
    /// # Errors
    /// * `UserNotFound` - Identity no longer exists
    /// * `Internal` - Store failure
    async fn current_identity(&self, id: &UserId) -> Result<Identity, AuthError>;
}

/// Persistence operations for identities.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist a new identity together with its first refresh token.
    ///
    /// Both rows are written or neither is.
    ///
    /// # Errors
    /// * `Conflict` - Username is already taken
    /// * `Database` - Storage failure; nothing was written
    async fn register(
        &self,
        identity: NewIdentity,
        first_session: NewRefreshToken,
    ) -> Result<Identity, StoreError>;

    /// Retrieve identity by id.
    ///
    /// # Errors
    /// * `Database` - Storage failure
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Identity>, StoreError>;

    /// Retrieve identity by username.
    ///
    /// # Returns
    /// `None` when no identity has this username
    ///
    /// # Errors
    /// * `Database` - Storage failure
    async fn find_by_username(&self, username: &Username) -> Result<Option<Identity>, StoreError>;
}

/// Persistence operations for refresh token records.
///
/// Adapters hold no business rules beyond the atomicity `revoke` and `rotate`
/// promise.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Persist a new, unrevoked refresh token record.
    ///
    /// # Errors
    /// * `Conflict` - Token value already stored
    /// * `Database` - Storage failure
    async fn create(&self, token: NewRefreshToken) -> Result<(), StoreError>;

    /// Retrieve a record by its token value.
    ///
    /// # Returns
    /// `None` when the token is unknown
    ///
    /// # Errors
    /// * `Database` - Storage failure
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Mark a record owned by `owner_id` revoked.
    ///
    /// # Returns
    /// `true` if this call moved the record from live to revoked, `false` if
    /// it was unknown, owned by someone else, or already revoked
    ///
    /// # Errors
    /// * `Database` - Storage failure
    async fn revoke(&self, token: &str, owner_id: UserId) -> Result<bool, StoreError>;

    /// Atomically revoke `old_token` and insert `replacement`.
    ///
    /// The revoke is conditional on the old record being unrevoked and
    /// unexpired. When that condition fails nothing is written.
    ///
    /// # Returns
    /// `true` if the rotation was applied
    ///
    /// # Errors
    /// * `Conflict` - Replacement token value already stored
    /// * `Database` - Storage failure; nothing was written
    async fn rotate(&self, old_token: &str, replacement: NewRefreshToken)
        -> Result<bool, StoreError>;

    /// Physically delete every record whose expiry is at or before `now`.
    ///
    /// # Returns
    /// Number of records removed
    ///
    /// # Errors
    /// * `Database` - Storage failure
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
