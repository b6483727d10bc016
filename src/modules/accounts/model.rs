use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::auth::SecretMaterial;

/// One stored account, including its credential
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String, // Normalized, used as the lookup key
    pub password: SecretMaterial,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub avatar: Option<String>, // URL on the external image host
    pub date_created: DateTime<Utc>,
    pub subscription: bool,
}

impl Account {
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            avatar: self.avatar.clone(),
            subscription: self.subscription,
        }
    }
}

/// Fields for a new account, credential already derived
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: SecretMaterial,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub avatar: Option<String>,
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<SecretMaterial>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub subscription: Option<bool>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.phone.is_none()
            && self.avatar.is_none()
            && self.subscription.is_none()
    }

    /// Write the present fields onto `account`
    pub fn apply_to(self, account: &mut Account) {
        if let Some(first_name) = self.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            account.last_name = last_name;
        }
        if let Some(email) = self.email {
            account.email = email;
        }
        // Wholesale replacement, never a partial edit of the secret
        if let Some(password) = self.password {
            account.password = password;
        }
        if let Some(phone) = self.phone {
            account.phone = Some(phone);
        }
        if let Some(avatar) = self.avatar {
            account.avatar = Some(avatar);
        }
        if let Some(subscription) = self.subscription {
            account.subscription = subscription;
        }
    }
}

/// Registration form as submitted by the client
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub avatar: Option<String>,
}

/// Profile edits as submitted by the client. Empty strings are ignored.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// Client-safe view of an account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub subscription: bool,
}

/// Result of a successful login
#[derive(Serialize, Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub profile: Profile,
}
