use std::fs;
use std::path::Path;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::TokenType;
use super::errors::TokenError;

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims of a token that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub token_type: TokenType,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// RS256 token signer and verifier.
///
/// Holds an RSA key pair loaded once at startup. Immutable afterwards, so a
/// single instance is shared across request tasks behind an `Arc`.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    /// Build a signer from PEM encoded RSA keys.
    ///
    /// # Arguments
    /// * `private_pem` - PKCS#1 or PKCS#8 RSA private key
    /// * `public_pem` - RSA public key matching `private_pem`
    ///
    /// # Errors
    /// * `KeyLoading` - Either key could not be parsed
    pub fn from_rsa_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| TokenError::KeyLoading(format!("private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::KeyLoading(format!("public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Read both PEM files from disk and build a signer.
    ///
    /// # Errors
    /// * `KeyLoading` - A file is unreadable or does not hold a valid key
    pub fn from_pem_files(
        private_key_path: impl AsRef<Path>,
        public_key_path: impl AsRef<Path>,
    ) -> Result<Self, TokenError> {
        let private_key_path = private_key_path.as_ref();
        let public_key_path = public_key_path.as_ref();

        let private_pem = fs::read(private_key_path).map_err(|e| {
            TokenError::KeyLoading(format!("{}: {}", private_key_path.display(), e))
        })?;
        let public_pem = fs::read(public_key_path).map_err(|e| {
            TokenError::KeyLoading(format!("{}: {}", public_key_path.display(), e))
        })?;

        Self::from_rsa_pem(&private_pem, &public_pem)
    }

    /// Sign a token for `subject` valid for `ttl` from now.
    pub fn sign(
        &self,
        subject: &str,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        self.sign_at(subject, token_type, Utc::now(), ttl)
    }

    /// Sign a token with an explicit issue time.
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiry out of range, serialization or RSA signing failed
    pub fn sign_at(
        &self,
        subject: &str,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let claims = Claims::new(subject, token_type, issued_at, ttl)?;
        let expires_at = claims.expires_at().ok_or_else(|| {
            TokenError::EncodingFailed(format!("expiry out of range: {}", claims.exp))
        })?;

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature and expiry of `token`.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature mismatch, malformed token or expired
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(reason = %e, "Token rejected");
            TokenError::InvalidToken
        })?;

        let claims = data.claims;
        let (Some(issued_at), Some(expires_at)) = (claims.issued_at(), claims.expires_at()) else {
            tracing::debug!("Token timestamps out of range");
            return Err(TokenError::InvalidToken);
        };

        Ok(VerifiedToken {
            subject: claims.sub,
            token_type: claims.typ,
            issued_at,
            expires_at,
        })
    }

    /// Verify `token` and require it to be an access token.
    pub fn verify_access(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let verified = self.verify(token)?;

        if verified.token_type != TokenType::Access {
            tracing::debug!(token_type = ?verified.token_type, "Wrong token type");
            return Err(TokenError::InvalidToken);
        }

        Ok(verified)
    }
}
