//! HS256 JWT implementation of the `TokenVerifier` port.
//!
//! The `sub` claim carries the user id. Tokens are issued by the wider
//! application; `issue_token` exists for development and tests.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AuthError, TokenVerifier, UserId};

/// Minimum accepted length of the signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Lifetime of development tokens minted by `issue-token`
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    #[serde(default)]
    iat: i64,
    exp: i64,
}

/// Errors raised while configuring the verifier or issuing tokens
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret must be at least {min} characters long (got {actual})")]
    SecretTooShort { min: usize, actual: usize },

    #[error("failed to encode access token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// JWT-backed token verifier
#[derive(Clone)]
pub struct JwtTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    /// Create a verifier from a shared HS256 secret
    ///
    /// # Errors
    ///
    /// Returns `JwtError::SecretTooShort` for secrets under 32 characters.
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::SecretTooShort {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token for `user_id` valid for `ttl`
    pub fn issue_token(&self, user_id: &UserId, ttl: Duration) -> Result<String, JwtError> {
        self.issue_token_at(user_id, chrono::Utc::now().timestamp(), ttl)
    }

    fn issue_token_at(
        &self,
        user_id: &UserId,
        issued_at: i64,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = AccessTokenClaims {
            sub: user_id.as_str().to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        UserId::new(claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
