use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as base64url, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::Mac;
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use crate::{HmacSha256, MIN_SIGNING_KEY_LEN};

const TOKEN_ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Server-held HMAC key used to sign session tokens
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the key is long enough to sign with
    pub fn is_usable(&self) -> bool {
        self.0.len() >= MIN_SIGNING_KEY_LEN
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        if !self.is_usable() {
            return Err(AuthError::SigningFailure(format!(
                "signing key must be at least {} bytes, got {}",
                MIN_SIGNING_KEY_LEN,
                self.0.len()
            )));
        }
        HmacSha256::new_from_slice(&self.0).map_err(|e| AuthError::SigningFailure(e.to_string()))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(<{} bytes>)", self.0.len())
    }
}

#[derive(Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Claims carried inside a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Identity proven by a valid session token.
///
/// `email` is the address at the time the token was issued. It goes stale if
/// the account's email changes later; look the account up by `account_id` for
/// the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account_id: String,
    pub email: String,
}

/// Mint a signed session token valid for `ttl` from now
pub fn issue_token(
    account_id: &str,
    email: &str,
    key: &SigningKey,
    ttl: Duration,
) -> Result<String, AuthError> {
    issue_token_at(account_id, email, key, ttl, Utc::now())
}

/// Mint a signed session token as if issued at `issued_at`
pub fn issue_token_at(
    account_id: &str,
    email: &str,
    key: &SigningKey,
    ttl: Duration,
    issued_at: DateTime<Utc>,
) -> Result<String, AuthError> {
    if ttl <= Duration::zero() {
        return Err(AuthError::SigningFailure(
            "token lifetime must be positive".to_string(),
        ));
    }

    // Fail before building anything if the key is unusable
    let mut mac = key.mac()?;

    let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
        AuthError::SigningFailure("token expiry is out of the representable range".to_string())
    })?;

    let header = TokenHeader {
        alg: TOKEN_ALGORITHM.to_string(),
        typ: TOKEN_TYPE.to_string(),
    };
    let claims = SessionClaims {
        sub: account_id.to_string(),
        email: email.to_string(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };

    let header_json =
        serde_json::to_vec(&header).map_err(|e| AuthError::SigningFailure(e.to_string()))?;
    let claims_json =
        serde_json::to_vec(&claims).map_err(|e| AuthError::SigningFailure(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        base64url.encode(header_json),
        base64url.encode(claims_json)
    );
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!("{}.{}", signing_input, base64url.encode(signature)))
}

/// Check a session token against the current time
pub fn validate_token(token: &str, key: &SigningKey) -> Result<Identity, AuthError> {
    validate_token_at(token, key, Utc::now())
}

/// Check a session token's signature, then its expiry relative to `now`.
///
/// Nothing inside the token is decoded until the signature has been verified.
pub fn validate_token_at(
    token: &str,
    key: &SigningKey,
    now: DateTime<Utc>,
) -> Result<Identity, AuthError> {
    let claims = verified_claims(token, key)?;

    if now.timestamp() >= claims.exp {
        let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_default();
        return Err(AuthError::TokenExpired { expired_at });
    }

    Ok(Identity {
        account_id: claims.sub,
        email: claims.email,
    })
}

fn verified_claims(token: &str, key: &SigningKey) -> Result<SessionClaims, AuthError> {
    let mut segments = token.split('.');
    let (header_b64, claims_b64, signature_b64) =
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(h), Some(c), Some(s), None) => (h, c, s),
            _ => return Err(AuthError::InvalidSignature),
        };

    let signature = base64url
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidSignature)?;

    let mut mac = key.mac().map_err(|_| AuthError::InvalidSignature)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AuthError::InvalidSignature)?;

    // Signature holds; the content is ours
    let header: TokenHeader = decode_segment(header_b64)?;
    if header.alg != TOKEN_ALGORITHM {
        return Err(AuthError::InvalidSignature);
    }

    decode_segment(claims_b64)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = base64url
        .decode(segment)
        .map_err(|_| AuthError::InvalidSignature)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key() -> SigningKey {
        SigningKey::new("0123456789abcdef0123456789abcdef".as_bytes())
    }

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_issue_then_validate() {
        let token = issue_token("u123", "a@b.com", &key(), Duration::seconds(3600)).unwrap();
        let identity = validate_token(&token, &key()).unwrap();

        assert_eq!(identity.account_id, "u123");
        assert_eq!(identity.email, "a@b.com");
    }

    #[test]
    fn test_token_expiry_scenario() {
        let token =
            issue_token_at("u123", "a@b.com", &key(), Duration::seconds(3600), t0()).unwrap();

        let identity =
            validate_token_at(&token, &key(), t0() + Duration::seconds(3599)).unwrap();
        assert_eq!(
            identity,
            Identity {
                account_id: "u123".to_string(),
                email: "a@b.com".to_string(),
            }
        );

        // Exactly at expiry is already expired
        assert!(matches!(
            validate_token_at(&token, &key(), t0() + Duration::seconds(3600)),
            Err(AuthError::TokenExpired { .. })
        ));

        match validate_token_at(&token, &key(), t0() + Duration::seconds(3601)) {
            Err(AuthError::TokenExpired { expired_at }) => {
                assert_eq!(expired_at, t0() + Duration::seconds(3600));
            }
            other => panic!("expected TokenExpired, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let token = issue_token("u123", "a@b.com", &key(), Duration::seconds(3600)).unwrap();
        let other = SigningKey::new("fedcba9876543210fedcba9876543210".as_bytes());

        assert!(matches!(
            validate_token(&token, &other),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_forged_and_expired_is_invalid_signature() {
        // Signature is checked before expiry, so a wrong key never reports TokenExpired
        let token =
            issue_token_at("u123", "a@b.com", &key(), Duration::seconds(60), t0()).unwrap();
        let other = SigningKey::new(vec![7u8; 32]);

        assert!(matches!(
            validate_token_at(&token, &other, t0() + Duration::days(1)),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_single_bit_flips_never_validate() {
        let token =
            issue_token_at("u123", "a@b.com", &key(), Duration::seconds(3600), t0()).unwrap();
        let now = t0() + Duration::seconds(1);
        assert!(validate_token_at(&token, &key(), now).is_ok());

        let bytes = token.as_bytes();
        for index in 0..bytes.len() {
            for bit in 0..8 {
                let mut tampered = bytes.to_vec();
                tampered[index] ^= 1 << bit;

                // Only strings can be handed to the validator
                let Ok(tampered) = String::from_utf8(tampered) else {
                    continue;
                };

                assert!(
                    matches!(
                        validate_token_at(&tampered, &key(), now),
                        Err(AuthError::InvalidSignature)
                    ),
                    "bit {} of byte {} validated",
                    bit,
                    index
                );
            }
        }
    }

    #[test]
    fn test_swapped_payload_is_rejected() {
        let mine = issue_token_at("u1", "me@b.com", &key(), Duration::seconds(3600), t0()).unwrap();
        let theirs =
            issue_token_at("u2", "you@b.com", &key(), Duration::seconds(3600), t0()).unwrap();

        let mine: Vec<&str> = mine.split('.').collect();
        let theirs: Vec<&str> = theirs.split('.').collect();
        let spliced = format!("{}.{}.{}", mine[0], theirs[1], mine[2]);

        assert!(matches!(
            validate_token_at(&spliced, &key(), t0()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_structurally_broken_tokens() {
        for token in ["", "abc", "a.b", "a.b.c.d", "..", "not base64!.x.y"] {
            assert!(matches!(
                validate_token(token, &key()),
                Err(AuthError::InvalidSignature)
            ));
        }
    }

    #[test]
    fn test_unsigned_token_is_rejected() {
        let header = base64url.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = base64url.encode(br#"{"sub":"u123","email":"a@b.com","iat":0,"exp":99999999999}"#);

        assert!(matches!(
            validate_token(&format!("{}.{}.", header, claims), &key()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_weak_or_missing_key_refuses_to_sign() {
        let empty = SigningKey::new(Vec::new());
        let short = SigningKey::new("short".as_bytes());

        for bad in [&empty, &short] {
            assert!(matches!(
                issue_token("u123", "a@b.com", bad, Duration::seconds(3600)),
                Err(AuthError::SigningFailure(_))
            ));
        }
        assert!(empty.is_empty());
        assert!(!short.is_usable());
    }

    #[test]
    fn test_non_positive_ttl_refuses_to_sign() {
        assert!(matches!(
            issue_token("u123", "a@b.com", &key(), Duration::zero()),
            Err(AuthError::SigningFailure(_))
        ));
    }

    #[test]
    fn test_overflowing_ttl_refuses_to_sign() {
        // Roughly 400,000 years, past the end of the calendar range
        let result = issue_token_at(
            "u123",
            "a@b.com",
            &key(),
            Duration::days(365 * 400_000),
            t0(),
        );
        assert!(matches!(result, Err(AuthError::SigningFailure(_))));
    }

    #[test]
    fn test_key_is_not_printed() {
        assert_eq!(format!("{:?}", key()), "SigningKey(<32 bytes>)");
    }

    #[test]
    fn test_claims_layout() {
        let token =
            issue_token_at("u123", "a@b.com", &key(), Duration::seconds(3600), t0()).unwrap();
        let claims: SessionClaims = decode_segment(token.split('.').nth(1).unwrap()).unwrap();

        assert_eq!(claims.sub, "u123");
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_003_600);
    }
}
