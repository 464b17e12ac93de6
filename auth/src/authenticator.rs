use chrono::Duration;

use crate::jwt::IssuedToken;
use crate::jwt::TokenError;
use crate::jwt::TokenSigner;
use crate::jwt::TokenType;
use crate::jwt::VerifiedToken;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Lifetimes of the two halves of a token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::days(7),
        }
    }
}

/// Access and refresh tokens minted together for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Authentication coordinator combining password hashing and token signing.
///
/// Services receive one of these at startup instead of reaching for
/// process-wide key state.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_signer: TokenSigner,
    lifetimes: TokenLifetimes,
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `token_signer` - Signer holding the loaded key pair
    /// * `lifetimes` - Access and refresh token TTLs
    pub fn new(token_signer: TokenSigner, lifetimes: TokenLifetimes) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            token_signer,
            lifetimes,
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `HashingFailed` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check `password` against a stored hash.
    ///
    /// # Returns
    /// `true` when the password matches
    ///
    /// # Errors
    /// * `VerificationFailed` - Stored hash is malformed
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Spend a verification's worth of work without a stored hash.
    pub fn verify_dummy_password(&self, password: &str) {
        self.password_hasher.verify_dummy(password)
    }

    /// Mint an access/refresh token pair bound to `subject`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing either token failed
    pub fn issue_token_pair(&self, subject: &str) -> Result<TokenPair, TokenError> {
        let access = self
            .token_signer
            .sign(subject, TokenType::Access, self.lifetimes.access)?;
        let refresh = self
            .token_signer
            .sign(subject, TokenType::Refresh, self.lifetimes.refresh)?;

        Ok(TokenPair { access, refresh })
    }

    /// Validate a bearer access token.
    ///
    /// # Errors
    /// * `InvalidToken` - Bad signature, expired, malformed or not an access token
    pub fn validate_access_token(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.token_signer.verify_access(token)
    }
}
