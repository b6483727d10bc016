// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{accounts, auth, utils};

// Re-export commonly used types
pub use modules::accounts::{AccountError, AccountService, AccountStore, MemoryAccountStore};
pub use modules::auth::{
    AuthConfig, AuthError, CredentialManager, Identity, SecretMaterial, SigningKey,
};

// Constants
pub const DEFAULT_HASH_ROUNDS: u32 = 100_000;
pub const MIN_HASH_ROUNDS: u32 = 1_000;
pub const SALT_LEN: usize = 16;
pub const HASH_OUTPUT_LEN: usize = 32;
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 86400;
pub const MIN_SIGNING_KEY_LEN: usize = 32;

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
