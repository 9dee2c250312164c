//! One-time passcodes for email verification.
//!
//! Codes are six digits, live for ten minutes, and are stored hashed so a
//! process dump never reveals a usable code. Issuing a new code for an
//! address replaces the previous one. Verification does not consume the
//! code: the same code gates a pre-check and the registration that follows,
//! so it stays valid until its TTL runs out or a flow removes it with
//! [`OtpStore::consume`].

use std::time::Duration;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use moka::future::Cache;
use rand::Rng;
use thiserror::Error;

use attire_core::Email;

/// How long an issued code stays valid.
const CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// Upper bound on outstanding codes; far beyond any expected load.
const MAX_OUTSTANDING: u64 = 100_000;

/// Errors from issuing codes.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("failed to hash verification code")]
    Hash,
}

/// In-memory store of outstanding verification codes, keyed by email.
#[derive(Clone)]
pub struct OtpStore {
    codes: Cache<String, String>,
}

impl OtpStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codes: Cache::builder()
                .max_capacity(MAX_OUTSTANDING)
                .time_to_live(CODE_TTL)
                .build(),
        }
    }

    /// Issue a fresh code for an address, replacing any outstanding one.
    ///
    /// Returns the plaintext code for delivery; only its hash is stored.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::Hash` if hashing fails.
    pub async fn issue(&self, email: &Email) -> Result<String, OtpError> {
        let code = format!("{:06}", rand::rng().random_range(0..1_000_000));

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(code.as_bytes(), &salt)
            .map_err(|_| OtpError::Hash)?
            .to_string();

        self.codes.insert(email.as_str().to_owned(), hash).await;

        Ok(code)
    }

    /// Check a code against the outstanding one for an address.
    ///
    /// The code stays outstanding on success so a flow can verify it more
    /// than once within the TTL.
    pub async fn verify(&self, email: &Email, code: &str) -> bool {
        let Some(stored) = self.codes.get(email.as_str()).await else {
            return false;
        };

        let Ok(parsed) = PasswordHash::new(&stored) else {
            return false;
        };

        Argon2::default()
            .verify_password(code.as_bytes(), &parsed)
            .is_ok()
    }

    /// Remove the outstanding code for an address.
    pub async fn consume(&self, email: &Email) {
        self.codes.invalidate(email.as_str()).await;
    }
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("otp@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let store = OtpStore::new();
        let code = store.issue(&email()).await.unwrap();

        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert!(store.verify(&email(), &code).await);
    }

    #[tokio::test]
    async fn test_verify_does_not_consume_code() {
        let store = OtpStore::new();
        let code = store.issue(&email()).await.unwrap();

        // A pre-check and the follow-up flow both see the same code.
        assert!(store.verify(&email(), &code).await);
        assert!(store.verify(&email(), &code).await);
    }

    #[tokio::test]
    async fn test_consume_removes_code() {
        let store = OtpStore::new();
        let code = store.issue(&email()).await.unwrap();

        store.consume(&email()).await;
        assert!(!store.verify(&email(), &code).await);
    }

    #[tokio::test]
    async fn test_wrong_code_rejected() {
        let store = OtpStore::new();
        let code = store.issue(&email()).await.unwrap();

        assert!(!store.verify(&email(), "000000").await || code == "000000");
        assert!(store.verify(&email(), &code).await);
    }

    #[tokio::test]
    async fn test_reissue_replaces_previous_code() {
        let store = OtpStore::new();
        let first = store.issue(&email()).await.unwrap();
        let second = store.issue(&email()).await.unwrap();

        if first != second {
            assert!(!store.verify(&email(), &first).await);
        }
        assert!(store.verify(&email(), &second).await);
    }

    #[tokio::test]
    async fn test_unknown_email_rejected() {
        let store = OtpStore::new();
        assert!(!store.verify(&email(), "123456").await);
    }
}
