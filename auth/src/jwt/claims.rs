use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::errors::TokenError;

/// Which half of a token pair a JWT represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT payload issued by this crate.
///
/// Standard RFC 7519 claims plus `typ`. `jti` is random per token so two
/// tokens minted for the same subject within the same second still differ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (identity identifier)
    pub sub: String,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// JWT ID
    pub jti: String,

    /// Token type
    pub typ: TokenType,
}

impl Claims {
    /// Build claims for `subject` valid for `ttl` starting at `issued_at`.
    ///
    /// # Errors
    /// * `EncodingFailed` - The expiry does not fit in a timestamp
    pub fn new(
        subject: impl ToString,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            TokenError::EncodingFailed(format!("token lifetime out of range: {}", ttl))
        })?;

        Ok(Self {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: token_type,
        })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}
