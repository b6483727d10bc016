use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures of the credential and session operations
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password must not be empty")]
    EmptyPassword,

    #[error("password hashing failed: {0}")]
    HashingFailure(String),

    /// The stored secret is not a readable hash. Points at data corruption, not a wrong password.
    #[error("stored secret material is malformed: {0}")]
    MalformedSecret(String),

    #[error("token signing failed: {0}")]
    SigningFailure(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token expired at {expired_at}")]
    TokenExpired { expired_at: DateTime<Utc> },
}

impl AuthError {
    /// True for outcomes that should reach the end user as plain "unauthenticated"
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AuthError::InvalidSignature | AuthError::TokenExpired { .. })
    }
}
