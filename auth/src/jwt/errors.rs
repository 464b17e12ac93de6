use thiserror::Error;

/// Error type for JWT operations.
///
/// Verification failures collapse into `InvalidToken` whatever the cause
/// (bad signature, malformed, expired, wrong type).
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Failed to load signing keys: {0}")]
    KeyLoading(String),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is invalid")]
    InvalidToken,
}
