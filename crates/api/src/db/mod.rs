//! Database operations for the Attire `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - Accounts (password, OTP, or federated signup)
//! - `products` / `product_variants` / `product_images` - Catalog
//! - `cart_items` - Per-user cart lines
//! - `orders` / `order_details` - Checkout output
//! - `email_subscriptions` - Newsletter signups
//!
//! # Migrations
//!
//! Plain SQL migrations live in `crates/api/migrations/` and run via
//! `sqlx migrate run`.
//!
//! All queries are runtime-checked (`sqlx::query` / `query_as`), so building
//! the crate does not require a live database.

pub mod cart;
pub mod orders;
pub mod products;
pub mod subscriptions;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error to `Conflict` when it is a unique constraint violation.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
