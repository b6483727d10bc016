use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use super::model::{Account, AccountUpdate, NewAccount};
use crate::modules::utils::logging::log_store_operation;
use crate::modules::utils::time;

/// Persistence contract for accounts.
///
/// The credential code never talks to a store directly; the account service
/// passes secret material in and out through these calls.
pub trait AccountStore {
    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    fn find_account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;

    /// Persist a new account; the store assigns its id and creation date
    fn create_account(&mut self, fields: NewAccount) -> Result<Account, StoreError>;

    /// Apply `fields` to an existing account and return the updated record
    fn update_account(&mut self, id: &str, fields: AccountUpdate) -> Result<Account, StoreError>;
}

/// Function to generate a 24-character hex account id
pub fn generate_account_id() -> String {
    let bytes: [u8; 12] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Account store held in memory, with JSON snapshots on disk
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct MemoryAccountStore {
    accounts: HashMap<String, Account>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Write all accounts to `path` as JSON
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Unavailable(format!("failed to serialize accounts: {}", e)))?;

        match fs::write(path, data) {
            Ok(()) => {
                log_store_operation("save", "*", true, Some(&path.display().to_string()));
                Ok(())
            }
            Err(e) => {
                log_store_operation("save", "*", false, Some(&e.to_string()));
                Err(StoreError::Unavailable(format!(
                    "failed to write {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    /// Read accounts from `path`; a missing file gives an empty store
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&data).map_err(|e| {
            StoreError::Unavailable(format!("failed to parse {}: {}", path.display(), e))
        })
    }
}

impl AccountStore for MemoryAccountStore {
    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    fn find_account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(id).cloned())
    }

    fn create_account(&mut self, fields: NewAccount) -> Result<Account, StoreError> {
        let mut id = generate_account_id();
        while self.accounts.contains_key(&id) {
            id = generate_account_id();
        }

        let account = Account {
            id: id.clone(),
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            password: fields.password,
            phone: fields.phone,
            dob: fields.dob,
            avatar: fields.avatar,
            date_created: time::now(),
            subscription: false,
        };

        self.accounts.insert(id.clone(), account.clone());
        log_store_operation("create_account", &id, true, None);
        Ok(account)
    }

    fn update_account(&mut self, id: &str, fields: AccountUpdate) -> Result<Account, StoreError> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        fields.apply_to(account);
        log_store_operation("update_account", id, true, None);
        Ok(account.clone())
    }
}
