use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenPair;
use chrono::Utc;

use crate::credentials::errors::AuthError;
use crate::credentials::errors::StoreError;
use crate::credentials::models::Identity;
use crate::credentials::models::NewIdentity;
use crate::credentials::models::NewRefreshToken;
use crate::credentials::models::Registration;
use crate::credentials::models::UserId;
use crate::credentials::models::Username;
use crate::credentials::ports::AuthServicePort;
use crate::credentials::ports::IdentityRepository;
use crate::credentials::ports::RefreshTokenRepository;

/// Domain service owning registration, login and the refresh token lifecycle.
///
/// Holds no mutable state of its own: every transition is written through
/// the two repositories, so one instance is shared by all request tasks.
pub struct AuthService<IR, RR>
where
    IR: IdentityRepository,
    RR: RefreshTokenRepository,
{
    identities: Arc<IR>,
    refresh_tokens: Arc<RR>,
    authenticator: Arc<Authenticator>,
}

impl<IR, RR> AuthService<IR, RR>
where
    IR: IdentityRepository,
    RR: RefreshTokenRepository,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `identities` - Identity persistence implementation
    /// * `refresh_tokens` - Refresh token persistence implementation
    /// * `authenticator` - Password hasher and token signer
    pub fn new(
        identities: Arc<IR>,
        refresh_tokens: Arc<RR>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        Self {
            identities,
            refresh_tokens,
            authenticator,
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    /// Verify `password` against `stored_hash`, or against a decoy when there
    /// is no stored hash, so both paths cost the same.
    async fn verify_password(
        &self,
        password: &str,
        stored_hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => authenticator.verify_password(&password, &hash),
            None => {
                authenticator.verify_dummy_password(&password);
                Ok(false)
            }
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(AuthError::from)
    }

    /// Mint a token pair for `owner` and record its refresh half.
    async fn open_session(&self, owner: UserId) -> Result<TokenPair, AuthError> {
        let tokens = self.authenticator.issue_token_pair(&owner.to_string())?;

        self.refresh_tokens
            .create(NewRefreshToken::new(owner, &tokens.refresh))
            .await?;

        Ok(tokens)
    }

    async fn sweep_expired_refresh_tokens(&self) {
        match self.refresh_tokens.delete_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "Expired refresh tokens removed"),
            Err(e) => tracing::warn!(error = %e, "Failed to remove expired refresh tokens"),
        }
    }
}

#[async_trait]
impl<IR, RR> AuthServicePort for AuthService<IR, RR>
where
    IR: IdentityRepository,
    RR: RefreshTokenRepository,
{
    async fn register(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<Registration, AuthError> {
        if self.identities.find_by_username(username).await?.is_some() {
            tracing::info!(username = %username, "Registration rejected: username taken");
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = self.hash_password(password).await?;

        let id = UserId::new();
        let tokens = self.authenticator.issue_token_pair(&id.to_string())?;

        // The store's unique constraint is authoritative: a concurrent
        // registration can slip past the lookup above.
        let identity = self
            .identities
            .register(
                NewIdentity {
                    id,
                    username: username.clone(),
                    password_hash,
                },
                NewRefreshToken::new(id, &tokens.refresh),
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::from(other),
            })?;

        tracing::info!(user_id = %identity.id, username = %identity.username, "User registered");

        Ok(Registration {
            identity_id: identity.id,
            tokens,
        })
    }

    async fn login(&self, username: &Username, password: &str) -> Result<TokenPair, AuthError> {
        let identity = self.identities.find_by_username(username).await?;

        let password_matches = self
            .verify_password(
                password,
                identity.as_ref().map(|i| i.password_hash.clone()),
            )
            .await?;

        let Some(identity) = identity else {
            tracing::info!(username = %username, "Login rejected: unknown username");
            return Err(AuthError::UserNotFound);
        };

        if !password_matches {
            tracing::info!(user_id = %identity.id, "Login rejected: invalid password");
            return Err(AuthError::InvalidPassword);
        }

        let tokens = self.open_session(identity.id).await?;
        tracing::info!(user_id = %identity.id, "User logged in");

        self.sweep_expired_refresh_tokens().await;

        Ok(tokens)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let Some(record) = self.refresh_tokens.find_by_token(refresh_token).await? else {
            tracing::debug!("Refresh rejected: unknown token");
            return Err(AuthError::InvalidToken);
        };

        if !record.is_usable(Utc::now()) {
            tracing::debug!(
                user_id = %record.owner_id,
                revoked = record.revoked,
                expires_at = %record.expires_at,
                "Refresh rejected: token no longer usable"
            );
            return Err(AuthError::InvalidToken);
        }

        let tokens = self
            .authenticator
            .issue_token_pair(&record.owner_id.to_string())?;

        let rotated = self
            .refresh_tokens
            .rotate(
                refresh_token,
                NewRefreshToken::new(record.owner_id, &tokens.refresh),
            )
            .await?;

        if !rotated {
            tracing::warn!(
                user_id = %record.owner_id,
                "Refresh rejected: token rotated or revoked by a concurrent request"
            );
            return Err(AuthError::InvalidToken);
        }

        tracing::info!(user_id = %record.owner_id, "Refresh token rotated");

        Ok(tokens)
    }

    async fn logout(&self, owner: &UserId, refresh_token: &str) -> Result<(), AuthError> {
        if self.refresh_tokens.revoke(refresh_token, *owner).await? {
            tracing::info!(user_id = %owner, "Refresh token revoked");
        } else {
            tracing::debug!(
                user_id = %owner,
                "Logout with unknown, foreign or already revoked refresh token"
            );
        }

        Ok(())
    }

    async fn current_identity(&self, id: &UserId) -> Result<Identity, AuthError> {
        self.identities
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
