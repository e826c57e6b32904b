//! Credentials and bearer sessions.

pub mod password;
pub mod session;

use thiserror::Error;

use crate::error::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Bad signature, malformed token, missing claims, or expired.
    #[error("Could not validate credentials")]
    InvalidToken,
    /// The token verified but its subject no longer exists.
    #[error("Could not validate credentials")]
    UnknownUser,
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Unauthenticated(err.to_string())
    }
}

/// Identity resolved from a bearer token, inserted into request extensions by the auth
/// middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}
