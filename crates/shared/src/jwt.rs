//! JWT token generation and validation.
//!
//! Tokens are stateless: no session rows, no refresh tokens, no
//! revocation list. The role set travels inside the claims.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::config::JwtConfig;

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// Token has expired. Distinguished from `Invalid` so clients can
    /// re-authenticate instead of treating the token as garbage.
    #[error("token has expired")]
    Expired,

    /// Token is malformed or its signature does not verify.
    #[error("invalid token")]
    Invalid,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("token_expiry_minutes", &self.config.token_expiry_minutes)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generates an access token carrying the user's current role set.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Encoding` if token generation fails.
    pub fn generate_token(&self, user_id: Uuid, roles: &[Role]) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::minutes(self.config.token_expiry_minutes);
        let claims = Claims::new(user_id, roles, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validates signature and expiry, and decodes the claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired and
    /// `JwtError::Invalid` if it is malformed or tampered with.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }

    /// Returns the token lifetime in seconds.
    #[must_use]
    pub const fn token_expires_in(&self) -> i64 {
        self.config.token_expiry_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_expiry(minutes: i64) -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            token_expiry_minutes: minutes,
        })
    }

    #[test]
    fn generate_and_validate_round_trip() {
        let service = service_with_expiry(60);
        let user_id = Uuid::new_v4();

        let token = service
            .generate_token(user_id, &[Role::Manager, Role::Approver])
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.roles, vec![Role::Manager, Role::Approver]);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        // A negative lifetime mints a token that is already hours past
        // its exp, well beyond the default validation leeway.
        let service = service_with_expiry(-120);
        let token = service
            .generate_token(Uuid::new_v4(), &[Role::Submitter])
            .unwrap();

        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, JwtError::Expired));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let service = service_with_expiry(60);
        let err = service.validate_token("not.a.token").unwrap_err();
        assert!(matches!(err, JwtError::Invalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let service = service_with_expiry(60);
        let other = JwtService::new(JwtConfig {
            secret: "a-different-secret".to_string(),
            token_expiry_minutes: 60,
        });

        let token = other
            .generate_token(Uuid::new_v4(), &[Role::Manager])
            .unwrap();
        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, JwtError::Invalid));
    }

    #[test]
    fn debug_hides_key_material() {
        let service = service_with_expiry(60);
        let debug = format!("{service:?}");
        assert!(!debug.contains("test-secret-key-for-testing"));
    }
}
