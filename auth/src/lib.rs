//! Authentication utilities library
//!
//! Credential primitives shared by services:
//! - Password hashing (Argon2id)
//! - RS256 JWT signing and verification over a PEM key pair
//! - Token pair issuance with configurable lifetimes
//!
//! Services define their own ports and persistence; this crate holds no
//! state beyond the key material it is constructed with.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Token Pairs
//! ```
//! use auth::{Authenticator, TokenLifetimes, TokenSigner};
//!
//! let signer = TokenSigner::from_rsa_pem(
//!     include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/private.pem")),
//!     include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/public.pem")),
//! )
//! .unwrap();
//! let auth = Authenticator::new(signer, TokenLifetimes::default());
//!
//! let pair = auth.issue_token_pair("user123").unwrap();
//! let verified = auth.validate_access_token(&pair.access.token).unwrap();
//! assert_eq!(verified.subject, "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

pub use authenticator::Authenticator;
pub use authenticator::TokenLifetimes;
pub use authenticator::TokenPair;
pub use jwt::Claims;
pub use jwt::IssuedToken;
pub use jwt::TokenError;
pub use jwt::TokenSigner;
pub use jwt::TokenType;
pub use jwt::VerifiedToken;
pub use password::PasswordError;
pub use password::PasswordHasher;
