use std::fmt;

use pbkdf2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use crate::{DEFAULT_HASH_ROUNDS, HASH_OUTPUT_LEN, MIN_HASH_ROUNDS, SALT_LEN};

/// Stored, one-way representation of a password.
///
/// Holds a PHC string (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`) so the
/// salt and cost factor travel with the hash and verification needs nothing else.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretMaterial(String);

impl SecretMaterial {
    /// Wrap a value read back from the account store
    pub fn from_stored(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretMaterial(<redacted>)")
    }
}

/// Function to generate a fresh random salt from the OS random source
pub fn generate_random_salt() -> Result<SaltString, AuthError> {
    let mut bytes = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::HashingFailure(format!("random source unavailable: {}", e)))?;

    SaltString::b64_encode(&bytes).map_err(|e| AuthError::HashingFailure(e.to_string()))
}

/// Salted PBKDF2-HMAC-SHA256 hasher with a tunable cost factor
#[derive(Debug, Clone, Copy)]
pub struct SecretHasher {
    rounds: u32,
}

impl SecretHasher {
    /// Create a hasher running `rounds` PBKDF2 iterations per derivation
    pub fn new(rounds: u32) -> Result<Self, AuthError> {
        if rounds < MIN_HASH_ROUNDS {
            return Err(AuthError::HashingFailure(format!(
                "cost factor {} is below the minimum of {}",
                rounds, MIN_HASH_ROUNDS
            )));
        }
        Ok(Self { rounds })
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Turn a plaintext password into storable secret material.
    ///
    /// Every call draws a new salt, so enrolling the same password twice
    /// yields different output. This blocks for the full cost of the derivation.
    pub fn enroll(&self, plaintext: &str) -> Result<SecretMaterial, AuthError> {
        if plaintext.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        let salt = generate_random_salt()?;
        let params = Params {
            rounds: self.rounds,
            output_length: HASH_OUTPUT_LEN,
        };

        let hash = Pbkdf2
            .hash_password_customized(plaintext.as_bytes(), None, None, params, &salt)
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?;

        Ok(SecretMaterial(hash.to_string()))
    }

    /// Check a candidate password against stored secret material
    pub fn verify(&self, plaintext: &str, stored: &SecretMaterial) -> Result<bool, AuthError> {
        verify(plaintext, stored)
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_HASH_ROUNDS,
        }
    }
}

/// Re-derive with the embedded salt and cost, then compare in constant time.
///
/// A mismatch is `Ok(false)`. `MalformedSecret` is reserved for stored values
/// that cannot be read as a hash at all.
pub fn verify(plaintext: &str, stored: &SecretMaterial) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored.as_str())
        .map_err(|e| AuthError::MalformedSecret(e.to_string()))?;

    if parsed.salt.is_none() || parsed.hash.is_none() {
        return Err(AuthError::MalformedSecret(
            "missing salt or hash segment".to_string(),
        ));
    }

    // Output equality inside verify_password is constant-time
    match Pbkdf2.verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::MalformedSecret(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hasher() -> SecretHasher {
        SecretHasher::new(MIN_HASH_ROUNDS).unwrap()
    }

    #[test]
    fn test_enroll_then_verify() {
        let hasher = test_hasher();

        for password in ["Password123!", "a", "correct horse battery staple", "pässwörd✓"] {
            let secret = hasher.enroll(password).unwrap();
            assert!(hasher.verify(password, &secret).unwrap());
        }
    }

    #[test]
    fn test_wrong_password_does_not_verify() {
        let hasher = test_hasher();
        let secret = hasher.enroll("Password123!").unwrap();

        assert!(!hasher.verify("Password123", &secret).unwrap());
        assert!(!hasher.verify("Password123!!", &secret).unwrap());
        assert!(!hasher.verify("", &secret).unwrap());
    }

    #[test]
    fn test_scenario_is_case_sensitive() {
        let hasher = test_hasher();
        let secret = hasher.enroll("Sw0rdfish!").unwrap();

        assert!(verify("Sw0rdfish!", &secret).unwrap());
        assert!(!verify("sw0rdfish!", &secret).unwrap());
    }

    #[test]
    fn test_salts_differ_between_enrollments() {
        let hasher = test_hasher();
        let first = hasher.enroll("Password123!").unwrap();
        let second = hasher.enroll("Password123!").unwrap();

        assert_ne!(first, second);

        // Both still verify
        assert!(verify("Password123!", &first).unwrap());
        assert!(verify("Password123!", &second).unwrap());

        let salt1 = generate_random_salt().unwrap();
        let salt2 = generate_random_salt().unwrap();
        assert_ne!(salt1.as_str(), salt2.as_str());
    }

    #[test]
    fn test_plaintext_is_not_stored() {
        let secret = test_hasher().enroll("Sw0rdfish!").unwrap();

        assert!(!secret.as_str().contains("Sw0rdfish!"));
        assert!(secret.as_str().starts_with("$pbkdf2-sha256$"));
        assert!(secret.as_str().contains("i=1000"));
        assert_eq!(format!("{:?}", secret), "SecretMaterial(<redacted>)");
    }

    #[test]
    fn test_cost_factor_travels_with_the_secret() {
        let secret = test_hasher().enroll("Password123!").unwrap();

        // A hasher configured with a higher cost still verifies older material
        let stronger = SecretHasher::new(2_000).unwrap();
        assert!(stronger.verify("Password123!", &secret).unwrap());
    }

    #[test]
    fn test_empty_password_is_rejected() {
        assert!(matches!(
            test_hasher().enroll(""),
            Err(AuthError::EmptyPassword)
        ));
    }

    #[test]
    fn test_low_cost_factor_is_rejected() {
        assert!(matches!(
            SecretHasher::new(MIN_HASH_ROUNDS - 1),
            Err(AuthError::HashingFailure(_))
        ));
        assert_eq!(SecretHasher::default().rounds(), DEFAULT_HASH_ROUNDS);
    }

    #[test]
    fn test_malformed_secret_is_reported_separately() {
        let valid = test_hasher().enroll("Password123!").unwrap();
        let corrupted = SecretMaterial::from_stored(valid.as_str().replace('$', "#"));

        let cases = [
            SecretMaterial::from_stored(""),
            SecretMaterial::from_stored("not-a-hash"),
            SecretMaterial::from_stored("$pbkdf2-sha256$i=1000,l=32"),
            SecretMaterial::from_stored(
                "$argon2id$v=19$m=65536,t=3,p=4$c29tZXNhbHQ$RdescudvJCsgt3ub+b+dWRWJTmaaJObG",
            ),
            corrupted,
        ];

        for stored in cases.iter() {
            assert!(
                matches!(
                    verify("Password123!", stored),
                    Err(AuthError::MalformedSecret(_))
                ),
                "expected MalformedSecret for {:?}",
                stored.as_str()
            );
        }
    }
}
