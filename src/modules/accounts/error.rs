use thiserror::Error;

use crate::modules::auth::AuthError;

/// Failures reported by an account store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account store unavailable: {0}")]
    Unavailable(String),

    #[error("account {0} not found")]
    NotFound(String),
}

/// Failures of the account flows
#[derive(Debug, Error)]
pub enum AccountError {
    /// Covers both an unknown email and a wrong password
    #[error("wrong email or password")]
    Unauthenticated,

    #[error("account already exists")]
    AccountExists,

    #[error("account not found")]
    NotFound,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("account store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Credential(#[from] AuthError),
}

impl AccountError {
    /// True when the caller should just be told "unauthenticated"
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            AccountError::Unauthenticated => true,
            AccountError::Credential(e) => e.is_unauthenticated(),
            _ => false,
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => AccountError::StoreUnavailable(reason),
            StoreError::NotFound(_) => AccountError::NotFound,
        }
    }
}
