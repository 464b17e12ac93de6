use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::credentials::errors::StoreError;
use crate::credentials::models::Identity;
use crate::credentials::models::NewIdentity;
use crate::credentials::models::NewRefreshToken;
use crate::credentials::models::RefreshTokenRecord;
use crate::credentials::models::UserId;
use crate::credentials::models::Username;
use crate::credentials::ports::IdentityRepository;
use crate::credentials::ports::RefreshTokenRepository;

/// Identity store kept in process memory.
///
/// Used when no database is configured and by the integration tests. The
/// username map is the uniqueness constraint; inserts check it under the
/// write lock. Registration also writes the first session into `sessions`
/// while both locks are held.
#[derive(Debug)]
pub struct InMemoryIdentityRepository {
    identities: RwLock<HashMap<Username, Identity>>,
    sessions: Arc<InMemoryRefreshTokenRepository>,
}

impl InMemoryIdentityRepository {
    pub fn new(sessions: Arc<InMemoryRefreshTokenRepository>) -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
            sessions,
        }
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn register(
        &self,
        identity: NewIdentity,
        first_session: NewRefreshToken,
    ) -> Result<Identity, StoreError> {
        let mut identities = self.identities.write().await;

        if identities.contains_key(&identity.username) {
            return Err(StoreError::Conflict(identity.username.to_string()));
        }

        // Lock order: identities, then sessions.
        let mut records = self.sessions.records.write().await;

        if records.contains_key(&first_session.token) {
            return Err(StoreError::Database(
                "refresh token value already stored".to_string(),
            ));
        }

        let created = Identity {
            id: identity.id,
            username: identity.username,
            password_hash: identity.password_hash,
            created_at: Utc::now(),
        };

        let record = InMemoryRefreshTokenRepository::new_record(first_session);
        records.insert(record.token.clone(), record);
        identities.insert(created.username.clone(), created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|identity| identity.id == *id)
            .cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.read().await.get(username).cloned())
    }
}

/// Refresh token store kept in process memory, keyed by token value.
///
/// Conditional revoke and rotation run under a single write lock, which
/// gives them the same all-or-nothing behaviour as the SQL transaction.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenRepository {
    records: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Number of unrevoked, unexpired records owned by `owner_id`.
    pub async fn live_count(&self, owner_id: UserId) -> usize {
        let now = Utc::now();
        self.records
            .read()
            .await
            .values()
            .filter(|record| record.owner_id == owner_id && record.is_usable(now))
            .count()
    }

    fn new_record(token: NewRefreshToken) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            owner_id: token.owner_id,
            token: token.token,
            expires_at: token.expires_at,
            revoked: false,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn create(&self, token: NewRefreshToken) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        if records.contains_key(&token.token) {
            return Err(StoreError::Conflict("refresh token value".to_string()));
        }

        let record = Self::new_record(token);
        records.insert(record.token.clone(), record);

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.records.read().await.get(token).cloned())
    }

    async fn revoke(&self, token: &str, owner_id: UserId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;

        match records.get_mut(token) {
            Some(record) if record.owner_id == owner_id && !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn rotate(
        &self,
        old_token: &str,
        replacement: NewRefreshToken,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;

        if records.contains_key(&replacement.token) {
            return Err(StoreError::Conflict("refresh token value".to_string()));
        }

        let now = Utc::now();
        match records.get_mut(old_token) {
            Some(record) if record.is_usable(now) => record.revoked = true,
            _ => return Ok(false),
        }

        let record = Self::new_record(replacement);
        records.insert(record.token.clone(), record);

        Ok(true)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();

        records.retain(|_, record| !record.is_expired(now));

        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn username(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    fn new_token(owner_id: UserId, value: &str, expires_in: Duration) -> NewRefreshToken {
        NewRefreshToken {
            owner_id,
            token: value.to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    fn new_identity(name: &str) -> NewIdentity {
        NewIdentity {
            id: UserId::new(),
            username: username(name),
            password_hash: "$argon2id$hash".to_string(),
        }
    }

    fn stores() -> (InMemoryIdentityRepository, Arc<InMemoryRefreshTokenRepository>) {
        let sessions = Arc::new(InMemoryRefreshTokenRepository::new());
        (
            InMemoryIdentityRepository::new(Arc::clone(&sessions)),
            sessions,
        )
    }

    #[tokio::test]
    async fn test_identity_register_and_find() {
        let (repository, sessions) = stores();
        let new = new_identity("alice");
        let id = new.id;

        let created = repository
            .register(new, new_token(id, "rt-1", Duration::days(7)))
            .await
            .unwrap();
        assert_eq!(created.id, id);

        let found = repository
            .find_by_username(&username("alice"))
            .await
            .unwrap()
            .expect("identity should exist");
        assert_eq!(found.id, id);

        let by_id = repository
            .find_by_id(&id)
            .await
            .unwrap()
            .expect("identity should exist");
        assert_eq!(by_id.username, username("alice"));

        assert!(repository
            .find_by_username(&username("Alice"))
            .await
            .unwrap()
            .is_none());
        assert!(repository.find_by_id(&UserId::new()).await.unwrap().is_none());

        assert_eq!(sessions.live_count(id).await, 1);
    }

    #[tokio::test]
    async fn test_identity_duplicate_username() {
        let (repository, sessions) = stores();
        let first = new_identity("alice");
        let first_id = first.id;
        let second = new_identity("alice");
        let second_id = second.id;

        repository
            .register(first, new_token(first_id, "rt-1", Duration::days(7)))
            .await
            .unwrap();
        let result = repository
            .register(second, new_token(second_id, "rt-2", Duration::days(7)))
            .await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(repository.len().await, 1);
        assert!(sessions.find_by_token("rt-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_identity_register_writes_nothing_on_session_clash() {
        let (repository, sessions) = stores();
        let owner = UserId::new();
        sessions
            .create(new_token(owner, "rt-1", Duration::days(7)))
            .await
            .unwrap();

        let new = new_identity("alice");
        let id = new.id;
        let result = repository
            .register(new, new_token(id, "rt-1", Duration::days(7)))
            .await;

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(repository.len().await, 0);
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_token_revoke_is_monotonic() {
        let repository = InMemoryRefreshTokenRepository::new();
        let owner = UserId::new();

        repository
            .create(new_token(owner, "rt-1", Duration::days(7)))
            .await
            .unwrap();

        assert!(repository.revoke("rt-1", owner).await.unwrap());
        assert!(!repository.revoke("rt-1", owner).await.unwrap());
        assert!(!repository.revoke("unknown", owner).await.unwrap());

        let record = repository.find_by_token("rt-1").await.unwrap().unwrap();
        assert!(record.revoked);
    }

    #[tokio::test]
    async fn test_refresh_token_revoke_ignores_other_owners() {
        let repository = InMemoryRefreshTokenRepository::new();
        let owner = UserId::new();

        repository
            .create(new_token(owner, "rt-1", Duration::days(7)))
            .await
            .unwrap();

        assert!(!repository.revoke("rt-1", UserId::new()).await.unwrap());

        let record = repository.find_by_token("rt-1").await.unwrap().unwrap();
        assert!(!record.revoked);
    }

    #[tokio::test]
    async fn test_rotate_once() {
        let repository = InMemoryRefreshTokenRepository::new();
        let owner = UserId::new();

        repository
            .create(new_token(owner, "rt-1", Duration::days(7)))
            .await
            .unwrap();

        assert!(repository
            .rotate("rt-1", new_token(owner, "rt-2", Duration::days(7)))
            .await
            .unwrap());
        assert!(!repository
            .rotate("rt-1", new_token(owner, "rt-3", Duration::days(7)))
            .await
            .unwrap());

        assert!(repository.find_by_token("rt-3").await.unwrap().is_none());
        assert_eq!(repository.live_count(owner).await, 1);
    }

    #[tokio::test]
    async fn test_rotate_expired_token() {
        let repository = InMemoryRefreshTokenRepository::new();
        let owner = UserId::new();

        repository
            .create(new_token(owner, "rt-1", Duration::seconds(-1)))
            .await
            .unwrap();

        assert!(!repository
            .rotate("rt-1", new_token(owner, "rt-2", Duration::days(7)))
            .await
            .unwrap());
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let repository = InMemoryRefreshTokenRepository::new();
        let owner = UserId::new();
        let other_owner = UserId::new();

        repository
            .create(new_token(owner, "expired-1", Duration::seconds(-10)))
            .await
            .unwrap();
        repository
            .create(new_token(other_owner, "expired-2", Duration::seconds(-10)))
            .await
            .unwrap();
        repository
            .create(new_token(owner, "live", Duration::days(7)))
            .await
            .unwrap();

        assert_eq!(repository.delete_expired(Utc::now()).await.unwrap(), 2);
        assert_eq!(repository.len().await, 1);
        assert!(repository.find_by_token("live").await.unwrap().is_some());
    }
}
