use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// Hash used to burn the same verification cost when no stored hash exists.
static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Password hashing implementation.
///
/// Argon2id with the crate's default cost parameters and a fresh random salt
/// per hash. Output is a PHC string, so parameters and salt travel with it.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string (algorithm, parameters, salt and digest)
    ///
    /// # Errors
    /// * `HashingFailed` - Salt generation or hashing failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The digest comparison inside Argon2 is constant-time.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored hash in PHC string format
    ///
    /// # Returns
    /// `true` if the password matches, `false` otherwise
    ///
    /// # Errors
    /// * `VerificationFailed` - The stored hash cannot be parsed
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::VerificationFailed(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Run a full verification against a decoy hash and discard the outcome.
    ///
    /// Callers use this on the "no such account" path so that rejecting an
    /// unknown username costs roughly as much as rejecting a wrong password.
    pub fn verify_dummy(&self, password: &str) {
        let decoy = DECOY_HASH.get_or_init(|| self.hash("decoy-password").ok());

        if let Some(hash) = decoy {
            let _ = self.verify(password, hash);
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
