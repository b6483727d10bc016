use chrono::Duration;
use thiserror::Error;

use super::tokens::SigningKey;
use crate::{
    DEFAULT_HASH_ROUNDS, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, MIN_HASH_ROUNDS,
    MIN_SIGNING_KEY_LEN,
};

pub const SIGNING_KEY_VAR: &str = "SESSION_SIGNING_KEY";
pub const TOKEN_TTL_VAR: &str = "SESSION_TOKEN_TTL_SECS";
pub const HASH_ROUNDS_VAR: &str = "PASSWORD_HASH_ROUNDS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not set", var = SIGNING_KEY_VAR)]
    MissingSigningKey,

    #[error("signing key must be at least {min} bytes, got {len}", min = MIN_SIGNING_KEY_LEN)]
    WeakSigningKey { len: usize },

    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("hash cost factor {rounds} is below the minimum of {min}", min = MIN_HASH_ROUNDS)]
    HashRoundsTooLow { rounds: u32 },

    #[error("token lifetime must be positive")]
    NonPositiveTtl,

    #[error("token lifetime of {secs} seconds exceeds the maximum of {max}", max = MAX_TOKEN_TTL_SECS)]
    TtlTooLong { secs: i64 },
}

/// Settings for the credential manager, passed in explicitly
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub signing_key: SigningKey,
    pub token_ttl: Duration,
    pub hash_rounds: u32,
}

impl AuthConfig {
    /// Create configuration with default lifetime and cost factor
    pub fn new(signing_key: SigningKey) -> Result<Self, ConfigError> {
        Self::build(signing_key, DEFAULT_TOKEN_TTL_SECS, DEFAULT_HASH_ROUNDS)
    }

    /// Override the token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Result<Self, ConfigError> {
        self.token_ttl = checked_ttl(ttl.num_seconds())?;
        Ok(self)
    }

    /// Override the hashing cost factor
    pub fn with_hash_rounds(mut self, rounds: u32) -> Result<Self, ConfigError> {
        if rounds < MIN_HASH_ROUNDS {
            return Err(ConfigError::HashRoundsTooLow { rounds });
        }
        self.hash_rounds = rounds;
        Ok(self)
    }

    /// Load configuration from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any name -> value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing_key = lookup(SIGNING_KEY_VAR)
            .filter(|value| !value.is_empty())
            .map(SigningKey::new)
            .ok_or(ConfigError::MissingSigningKey)?;

        let ttl_secs = match lookup(TOKEN_TTL_VAR) {
            Some(value) => parse_number::<i64>(TOKEN_TTL_VAR, &value)?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        let rounds = match lookup(HASH_ROUNDS_VAR) {
            Some(value) => parse_number::<u32>(HASH_ROUNDS_VAR, &value)?,
            None => DEFAULT_HASH_ROUNDS,
        };

        Self::build(signing_key, ttl_secs, rounds)
    }

    fn build(signing_key: SigningKey, ttl_secs: i64, rounds: u32) -> Result<Self, ConfigError> {
        if !signing_key.is_usable() {
            return Err(ConfigError::WeakSigningKey {
                len: signing_key.len(),
            });
        }
        let token_ttl = checked_ttl(ttl_secs)?;
        if rounds < MIN_HASH_ROUNDS {
            return Err(ConfigError::HashRoundsTooLow { rounds });
        }

        Ok(Self {
            signing_key,
            token_ttl,
            hash_rounds: rounds,
        })
    }
}

/// Bound a lifetime to `1..=MAX_TOKEN_TTL_SECS` seconds
fn checked_ttl(secs: i64) -> Result<Duration, ConfigError> {
    if secs <= 0 {
        return Err(ConfigError::NonPositiveTtl);
    }
    if secs > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::TtlTooLong { secs });
    }
    Duration::try_seconds(secs).ok_or(ConfigError::TtlTooLong { secs })
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}
