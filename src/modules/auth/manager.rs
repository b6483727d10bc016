use super::config::AuthConfig;
use super::error::AuthError;
use super::password::{self, SecretHasher, SecretMaterial};
use super::tokens::{self, Identity};

/// Credential and session operations bound to one configuration.
///
/// Holds no mutable state; every method takes `&self` and calls never interact,
/// so one manager can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct CredentialManager {
    config: AuthConfig,
    hasher: SecretHasher,
}

impl CredentialManager {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let hasher = SecretHasher::new(config.hash_rounds)?;
        Ok(Self { config, hasher })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Derive storable secret material from a new password
    pub fn enroll(&self, plaintext: &str) -> Result<SecretMaterial, AuthError> {
        self.hasher.enroll(plaintext)
    }

    /// Check a candidate password against stored secret material
    pub fn verify(&self, plaintext: &str, stored: &SecretMaterial) -> Result<bool, AuthError> {
        password::verify(plaintext, stored)
    }

    /// Mint a session token with the configured key and lifetime
    pub fn issue_token(&self, account_id: &str, email: &str) -> Result<String, AuthError> {
        tokens::issue_token(
            account_id,
            email,
            &self.config.signing_key,
            self.config.token_ttl,
        )
    }

    pub fn validate_token(&self, token: &str) -> Result<Identity, AuthError> {
        tokens::validate_token(token, &self.config.signing_key)
    }
}
