pub mod error;
pub mod model;
pub mod service;
pub mod store;

// Re-export the main types
pub use error::{AccountError, StoreError};
pub use model::{
    Account, AccountUpdate, LoginSession, NewAccount, Profile, ProfileUpdate, Registration,
};
pub use service::AccountService;
pub use store::{generate_account_id, AccountStore, MemoryAccountStore};
