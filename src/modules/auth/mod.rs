pub mod config;
pub mod error;
pub mod manager;
pub mod password;
pub mod tokens;

// Re-export the main types and functions
pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use manager::CredentialManager;
pub use password::{verify, SecretHasher, SecretMaterial};
pub use tokens::{
    issue_token, issue_token_at, validate_token, validate_token_at, Identity, SessionClaims,
    SigningKey,
};
