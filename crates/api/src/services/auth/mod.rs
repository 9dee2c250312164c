//! Account service: registration, login, verification codes, and profile
//! updates.
//!
//! Three ways into an account: password login, emailed one-time codes, and
//! federated (Google/Facebook) login. All three converge on the same `users`
//! row; federated identities link onto an existing account by email.

mod error;

pub use error::AuthError;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sqlx::PgPool;

use attire_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{FederatedProvider, User};
use crate::services::compose_full_address;
use crate::services::email::EmailService;
use crate::services::oauth::FederatedIdentity;
use crate::services::otp::OtpStore;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Account operations.
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    otp: OtpStore,
    email: EmailService,
}

impl AuthService {
    /// Create the service.
    #[must_use]
    pub const fn new(pool: PgPool, otp: OtpStore, email: EmailService) -> Self {
        Self { pool, otp, email }
    }

    /// Issue a verification code for an address and email it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address or
    /// `AuthError::Email` when delivery fails.
    pub async fn request_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let code = self.otp.issue(&email).await?;
        self.email.send_otp(&email, &code).await?;
        Ok(())
    }

    /// Check a verification code without any other side effect.
    ///
    /// The code stays valid afterwards, so the client can pre-check it and
    /// then submit the same code with the registration form.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOtp` for wrong, expired, or unknown codes.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        if self.otp.verify(&email, code).await {
            Ok(())
        } else {
            Err(AuthError::InvalidOtp)
        }
    }

    /// Register a new account with a password.
    ///
    /// Requires a valid verification code for the address, which proves the
    /// email is reachable; the account is created verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOtp` for a bad code,
    /// `AuthError::PasswordTooShort` or `AuthError::EmailTaken` for invalid
    /// input.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        code: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }

        if !self.otp.verify(&email, code).await {
            return Err(AuthError::InvalidOtp);
        }

        let hash = hash_password(password)?;
        let users = UserRepository::new(&self.pool);
        match users.create_with_password(&email, name, &hash).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::Conflict(_)) => Err(AuthError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound`, `AuthError::NoPasswordSet`, or
    /// `AuthError::IncorrectPassword` for the three distinct failure modes.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let users = UserRepository::new(&self.pool);

        let user = users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::NoPasswordSet);
        };

        if !verify_password(password, hash) {
            return Err(AuthError::IncorrectPassword);
        }

        Ok(user)
    }

    /// Look up an account by email, for the two-step login UI and for OTP
    /// login after a verified code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let email = Email::parse(email)?;
        Ok(UserRepository::new(&self.pool).get_by_email(&email).await?)
    }

    /// Log in (or sign up) with a federated identity assertion.
    ///
    /// Matches by provider id first, falls back to email and links the
    /// provider id onto the existing account, and creates a fresh verified
    /// account when neither matches.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` when the provider reports a
    /// malformed address.
    pub async fn login_with_federated_identity(
        &self,
        identity: &FederatedIdentity,
    ) -> Result<User, AuthError> {
        let email = Email::parse(&identity.email)?;
        let users = UserRepository::new(&self.pool);

        if let Some(mut user) = users
            .get_by_provider_or_email(identity.provider, &identity.provider_id, &email)
            .await?
        {
            let linked = match identity.provider {
                FederatedProvider::Google => user.google_id.as_deref(),
                FederatedProvider::Facebook => user.facebook_id.as_deref(),
            };
            if linked.is_none() {
                users
                    .set_provider_id(user.id, identity.provider, &identity.provider_id)
                    .await?;
                match identity.provider {
                    FederatedProvider::Google => {
                        user.google_id = Some(identity.provider_id.clone());
                    }
                    FederatedProvider::Facebook => {
                        user.facebook_id = Some(identity.provider_id.clone());
                    }
                }
            }
            return Ok(user);
        }

        let user = users
            .create_federated(identity.provider, &identity.provider_id, &identity.name, &email)
            .await?;
        Ok(user)
    }

    /// Load a user by id (session refresh).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` when the account no longer exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        UserRepository::new(&self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change the account email, gated on a verification code for the NEW
    /// address.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOtp` for a bad code or
    /// `AuthError::EmailTaken` when another account uses the address.
    pub async fn update_email(
        &self,
        user_id: UserId,
        new_email: &str,
        code: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(new_email)?;

        if !self.otp.verify(&email, code).await {
            return Err(AuthError::InvalidOtp);
        }

        match UserRepository::new(&self.pool)
            .update_email(user_id, &email)
            .await
        {
            Ok(()) => {
                // The address changed hands; the code must not gate anything
                // else.
                self.otp.consume(&email).await;
                Ok(())
            }
            Err(RepositoryError::Conflict(_)) => Err(AuthError::EmailTaken),
            Err(RepositoryError::NotFound) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Update display name and phone number.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` when the account doesn't exist.
    pub async fn update_name_phone(
        &self,
        user_id: UserId,
        name: &str,
        phone_number: Option<&str>,
    ) -> Result<(), AuthError> {
        match UserRepository::new(&self.pool)
            .update_name_phone(user_id, name, phone_number)
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Update the shipping address, recomputing the denormalized full
    /// address.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` when the account doesn't exist.
    pub async fn update_address(
        &self,
        user_id: UserId,
        street_address: &str,
        unit_number: Option<&str>,
        postal_code: &str,
        city: &str,
    ) -> Result<(), AuthError> {
        let full_address = compose_full_address(street_address, unit_number, city, postal_code);

        match UserRepository::new(&self.pool)
            .update_address(
                user_id,
                street_address,
                unit_number,
                postal_code,
                city,
                &full_address,
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Change the password, verifying the current one when the account has
    /// one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectPassword` when the current password is
    /// wrong, `AuthError::PasswordTooShort` for a weak replacement.
    pub async fn update_password(
        &self,
        user_id: UserId,
        current_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }

        let users = UserRepository::new(&self.pool);
        let user = users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(hash) = user.password_hash.as_deref() {
            let current = current_password.ok_or(AuthError::IncorrectPassword)?;
            if !verify_password(current, hash) {
                return Err(AuthError::IncorrectPassword);
            }
        }

        let hash = hash_password(new_password)?;
        match users.update_password_hash(user_id, &hash).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Hash a password with Argon2id and a fresh salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Hash)
}

/// Check a password against a stored Argon2 hash.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::Rng;
    use secrecy::SecretString;

    use super::*;
    use crate::config::EmailConfig;

    fn service(pool: PgPool) -> AuthService {
        let email = EmailService::new(&EmailConfig {
            smtp_host: "smtp.example.com".to_owned(),
            smtp_port: 465,
            smtp_username: "mailer".to_owned(),
            smtp_password: SecretString::from("mail-secret"),
            from_address: "Attire <no-reply@example.com>".to_owned(),
        })
        .unwrap();

        AuthService::new(pool, OtpStore::new(), email)
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
    async fn test_precheck_does_not_spend_registration_code() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = PgPool::connect(&url).await.unwrap();
        let auth = service(pool);

        let address = format!(
            "precheck-{}@example.com",
            rand::rng().random_range(0..1_000_000_u32)
        );
        let parsed = Email::parse(&address).unwrap();
        let code = auth.otp.issue(&parsed).await.unwrap();

        auth.verify_otp(&address, &code).await.unwrap();

        // The client pre-checks the code, then submits it again with the
        // registration form; both must accept it.
        let user = auth
            .register(&address, "Precheck Test", "a-long-password", &code)
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), address);
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();

        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same input").unwrap();
        let second = hash_password("same input").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
