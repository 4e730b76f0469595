use std::fmt;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Minimum HMAC-SHA256 key size in bytes.
pub const MIN_HMAC_KEY_LEN: usize = 32;

/// 24 hours, expressed the way `JWT_EXPIRATION_MS` is.
pub const DEFAULT_TOKEN_TTL_MS: u64 = 86_400_000;

/// Derive the HMAC key from the configured secret.
///
/// Secrets shorter than [`MIN_HMAC_KEY_LEN`] are replaced by their SHA-256
/// digest; longer ones are used verbatim. Every instance sharing a secret
/// derives the same key.
pub fn derive_signing_key(secret: &[u8]) -> Vec<u8> {
    if secret.len() < MIN_HMAC_KEY_LEN {
        Sha256::digest(secret).to_vec()
    } else {
        secret.to_vec()
    }
}

/// JWT signing configuration shared by issuance and verification.
#[derive(Clone)]
pub struct SecurityConfig {
    signing_key: Vec<u8>,
    /// Always HS256
    pub algorithm: Algorithm,
    pub token_ttl: Duration,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

impl SecurityConfig {
    /// Build from a raw secret with the default 24h TTL.
    pub fn try_new(secret: impl AsRef<[u8]>) -> Result<Self, AppError> {
        let secret = secret.as_ref();
        if secret.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::config("JWT secret is not configured"));
        }
        Ok(Self {
            signing_key: derive_signing_key(secret),
            algorithm: Algorithm::HS256,
            token_ttl: Duration::from_millis(DEFAULT_TOKEN_TTL_MS),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        })
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Lower costs make test suites fast; production keeps the default.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// `JWT_SECRET` (required in every environment) and `JWT_EXPIRATION_MS`.
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        let config = Self::try_new(secret.as_bytes())?;

        match std::env::var("JWT_EXPIRATION_MS") {
            Ok(raw) => {
                let ms = raw.trim().parse::<u64>().map_err(|_| {
                    AppError::config(format!(
                        "JWT_EXPIRATION_MS must be a positive integer, got '{raw}'"
                    ))
                })?;
                if ms == 0 {
                    return Err(AppError::config("JWT_EXPIRATION_MS must be greater than zero"));
                }
                Ok(config.with_token_ttl(Duration::from_millis(ms)))
            }
            Err(_) => Ok(config),
        }
    }

    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }

    /// Test-only config with a fixed secret.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            signing_key: derive_signing_key(b"test_secret_key_for_testing_purposes_only"),
            algorithm: Algorithm::HS256,
            token_ttl: Duration::from_millis(DEFAULT_TOKEN_TTL_MS),
            bcrypt_cost: 4,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("signing_key", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn short_secret_is_hashed() {
        let key = derive_signing_key(b"short");
        assert_eq!(key.len(), 32);
        assert_eq!(key, Sha256::digest(b"short").to_vec());
    }

    #[test]
    fn long_secret_is_used_verbatim() {
        let secret = b"0123456789abcdef0123456789abcdef-and-more";
        assert_eq!(derive_signing_key(secret), secret.to_vec());
    }

    #[test]
    fn exactly_min_len_is_not_hashed() {
        let secret = [b'k'; MIN_HMAC_KEY_LEN];
        assert_eq!(derive_signing_key(&secret), secret.to_vec());
    }

    #[test]
    fn blank_secret_is_rejected() {
        assert!(SecurityConfig::try_new("").is_err());
        assert!(SecurityConfig::try_new("   ").is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let cfg = SecurityConfig::try_new("super-secret").unwrap();
        assert!(!format!("{cfg:?}").contains("super-secret"));
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic_and_at_least_min_len(secret in proptest::collection::vec(any::<u8>(), 1..80)) {
            let a = derive_signing_key(&secret);
            let b = derive_signing_key(&secret);
            prop_assert_eq!(&a, &b);
            prop_assert!(a.len() >= MIN_HMAC_KEY_LEN);
        }
    }
}
