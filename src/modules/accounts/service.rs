use log::{error, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::error::AccountError;
use super::model::{AccountUpdate, LoginSession, NewAccount, Profile, ProfileUpdate, Registration};
use super::store::AccountStore;
use crate::modules::auth::{AuthError, CredentialManager, Identity, SecretMaterial};
use crate::modules::utils::logging::log_auth_event;
use crate::modules::utils::time::{format_duration, format_timestamp};

/// Register, log in and manage accounts over any `AccountStore`.
///
/// Every flow hashes before it persists and checks a token's signature before
/// trusting anything it carries.
pub struct AccountService<S: AccountStore> {
    store: S,
    credentials: CredentialManager,
    decoy: SecretMaterial, // Compared against when the email is unknown
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: S, credentials: CredentialManager) -> Result<Self, AccountError> {
        let decoy_password: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let decoy = credentials.enroll(&decoy_password)?;

        Ok(Self {
            store,
            credentials,
            decoy,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Create an account from a registration form
    pub fn register(&mut self, form: Registration) -> Result<Profile, AccountError> {
        let first_name = required("first_name", &form.first_name)?;
        let last_name = required("last_name", &form.last_name)?;
        let email = required("email", &normalize_email(&form.email))?;
        if form.password.is_empty() {
            return Err(AccountError::MissingField("password"));
        }

        if self.store.find_account_by_email(&email)?.is_some() {
            log_auth_event("register", &email, false, Some("account already exists"));
            return Err(AccountError::AccountExists);
        }

        let password = self.credentials.enroll(&form.password)?;

        let account = self.store.create_account(NewAccount {
            first_name,
            last_name,
            email,
            password,
            phone: non_empty(form.phone),
            dob: form.dob,
            avatar: non_empty(form.avatar),
        })?;

        log_auth_event("register", &account.email, true, None);
        Ok(account.profile())
    }

    /// Check an email and password and mint a session token
    pub fn login(&self, email: &str, password: &str) -> Result<LoginSession, AccountError> {
        let email = normalize_email(email);

        let account = match self.store.find_account_by_email(&email)? {
            Some(account) => account,
            None => {
                // Burn the same hashing time as a real comparison
                let _ = self.credentials.verify(password, &self.decoy);
                log_auth_event("login", &email, false, Some("unknown email"));
                return Err(AccountError::Unauthenticated);
            }
        };

        match self.credentials.verify(password, &account.password) {
            Ok(true) => {}
            Ok(false) => {
                log_auth_event("login", &email, false, Some("wrong password"));
                return Err(AccountError::Unauthenticated);
            }
            Err(e @ AuthError::MalformedSecret(_)) => {
                error!("Stored secret for account {} is unreadable: {}", account.id, e);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }

        let token = self.credentials.issue_token(&account.id, &account.email)?;

        let validity = format!(
            "session valid for {}",
            format_duration(self.credentials.config().token_ttl.num_seconds())
        );
        log_auth_event("login", &account.email, true, Some(&validity));

        Ok(LoginSession {
            token,
            profile: account.profile(),
        })
    }

    /// Resolve a session token to the identity it was issued for.
    ///
    /// The returned email is the one recorded at issue time; re-read the
    /// account by id when the current address matters.
    pub fn authenticate(&self, token: &str) -> Result<Identity, AccountError> {
        match self.credentials.validate_token(token) {
            Ok(identity) => Ok(identity),
            Err(AuthError::TokenExpired { expired_at }) => {
                warn!(
                    "Rejected session token: expired at {}",
                    format_timestamp(expired_at.timestamp())
                );
                Err(AuthError::TokenExpired { expired_at }.into())
            }
            Err(e) => {
                warn!("Rejected session token: {}", e);
                Err(e.into())
            }
        }
    }

    /// Apply profile edits for the account behind `token`
    pub fn update_profile(
        &mut self,
        token: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, AccountError> {
        let identity = self.authenticate(token)?;
        let account = self
            .store
            .find_account_by_id(&identity.account_id)?
            .ok_or(AccountError::NotFound)?;

        let mut fields = AccountUpdate {
            first_name: non_empty(update.first_name),
            last_name: non_empty(update.last_name),
            phone: non_empty(update.phone),
            avatar: non_empty(update.avatar),
            ..Default::default()
        };

        if let Some(email) = non_empty(update.email.map(|e| normalize_email(&e))) {
            if email != account.email {
                if let Some(owner) = self.store.find_account_by_email(&email)? {
                    if owner.id != account.id {
                        log_auth_event("update_profile", &email, false, Some("email taken"));
                        return Err(AccountError::AccountExists);
                    }
                }
                fields.email = Some(email);
            }
        }

        if let Some(password) = update.password.filter(|p| !p.is_empty()) {
            fields.password = Some(self.credentials.enroll(&password)?);
        }

        if fields.is_empty() {
            return Ok(account.profile());
        }

        let changed_password = fields.password.is_some();
        let updated = self.store.update_account(&account.id, fields)?;

        let details = changed_password.then_some("password replaced");
        log_auth_event("update_profile", &updated.email, true, details);
        Ok(updated.profile())
    }

    /// Look up the profile behind `token`
    pub fn find_profile(&self, token: &str) -> Result<Profile, AccountError> {
        let identity = self.authenticate(token)?;
        self.store
            .find_account_by_id(&identity.account_id)?
            .map(|account| account.profile())
            .ok_or(AccountError::NotFound)
    }

    /// Set the newsletter subscription flag of an account
    pub fn update_subscription(
        &mut self,
        account_id: &str,
        subscribed: bool,
    ) -> Result<Profile, AccountError> {
        let updated = self.store.update_account(
            account_id,
            AccountUpdate {
                subscription: Some(subscribed),
                ..Default::default()
            },
        )?;
        Ok(updated.profile())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: &'static str, value: &str) -> Result<String, AccountError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AccountError::MissingField(field));
    }
    Ok(value.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
