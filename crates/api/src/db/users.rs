//! User repository for database operations.

use sqlx::PgPool;

use attire_core::{Email, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::{FederatedProvider, User};

/// Columns selected for every `User` load, in `FromRow` order.
const USER_COLUMNS: &str = "id, google_id, facebook_id, email, name, password_hash, phone_number, \
     street_address, unit_number, postal_code, city, full_address, email_verified, \
     created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(user)
    }

    /// Create a new user with email, name, and password hash.
    ///
    /// The account is marked email-verified: registration requires a
    /// confirmed OTP for the address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name, password_hash, email_verified) \
             VALUES ($1, $2, $3, TRUE) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        Ok(user)
    }

    /// Look up a user by federated provider id OR email (account linking).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_provider_or_email(
        &self,
        provider: FederatedProvider,
        provider_id: &str,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {} = $1 OR email = $2",
            provider.id_column()
        ))
        .bind(provider_id)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Back-fill a provider id onto an existing account (linking by email).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_provider_id(
        &self,
        user_id: UserId,
        provider: FederatedProvider,
        provider_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!(
            "UPDATE users SET {} = $1, updated_at = now() WHERE id = $2",
            provider.id_column()
        ))
        .bind(provider_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Create a new verified user from a federated identity assertion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or provider id
    /// already exists.
    pub async fn create_federated(
        &self,
        provider: FederatedProvider,
        provider_id: &str,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users ({}, name, email, email_verified) \
             VALUES ($1, $2, $3, TRUE) \
             RETURNING {USER_COLUMNS}",
            provider.id_column()
        ))
        .bind(provider_id)
        .bind(name)
        .bind(email)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "account already exists"))?;

        Ok(user)
    }

    /// Change a user's email and mark it verified (OTP-gated caller).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email belongs to another
    /// account, `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_email(&self, user_id: UserId, email: &Email) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET email = $1, email_verified = TRUE, updated_at = now() WHERE id = $2",
        )
        .bind(email)
        .bind(user_id)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already in use"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Update display name and phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_name_phone(
        &self,
        user_id: UserId,
        name: &str,
        phone_number: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET name = $1, phone_number = $2, updated_at = now() WHERE id = $3",
        )
        .bind(name)
        .bind(phone_number)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Update address fields and the denormalized full address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_address(
        &self,
        user_id: UserId,
        street_address: &str,
        unit_number: Option<&str>,
        postal_code: &str,
        city: &str,
        full_address: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET street_address = $1, unit_number = $2, postal_code = $3, \
             city = $4, full_address = $5, updated_at = now() WHERE id = $6",
        )
        .bind(street_address)
        .bind(unit_number)
        .bind(postal_code)
        .bind(city)
        .bind(full_address)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Replace the stored password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
