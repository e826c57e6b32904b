//! Signed, self-contained bearer tokens (HS256 JWT).
//!
//! Validation is purely cryptographic; resolving the subject to a user row is up to the caller.
//! There is no revocation: a token stays valid until `exp`.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::{config::SessionConfig, error::Error};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // User id
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl SessionClaims {
    pub fn new(user_id: &str, ttl: Duration) -> Result<Self, Error> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| Error::Internal {
            operation: format!("convert token ttl: {e}"),
        })?;
        let exp = now.checked_add_signed(ttl).ok_or_else(|| Error::Internal {
            operation: "compute token expiry: lifetime out of range".to_string(),
        })?;

        Ok(Self {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

/// Issue a token for `user_id` using the configured lifetime.
pub fn issue(user_id: &str, config: &SessionConfig) -> Result<String, Error> {
    issue_with_ttl(user_id, config.token_ttl, config)
}

pub fn issue_with_ttl(user_id: &str, ttl: Duration, config: &SessionConfig) -> Result<String, Error> {
    let claims = SessionClaims::new(user_id, ttl)?;
    let key = EncodingKey::from_secret(config.secret_key.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify signature and expiry and return the embedded user id.
pub fn validate(token: &str, config: &SessionConfig) -> Result<String, AuthError> {
    let key = DecodingKey::from_secret(config.secret_key.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
            ErrorKind::InvalidSignature => tracing::debug!("rejected token with bad signature"),
            _ => tracing::debug!("rejected token: {}", e),
        }
        AuthError::InvalidToken
    })?;

    if data.claims.sub.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(data.claims.sub)
}
