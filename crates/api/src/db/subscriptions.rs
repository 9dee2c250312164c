//! Newsletter subscription repository.

use sqlx::PgPool;

use attire_core::{Email, SubscriptionId};

use super::RepositoryError;

/// Outcome of a subscription upsert, so the caller can pick the right
/// notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// First time this address subscribed.
    Created,
    /// An inactive subscription was switched back on.
    Reactivated,
    /// Already subscribed and active; nothing changed.
    AlreadyActive,
}

/// Repository for newsletter subscriptions.
pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Subscribe an address, reactivating it if it had unsubscribed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn subscribe(&self, email: &Email) -> Result<SubscribeOutcome, RepositoryError> {
        let existing: Option<(SubscriptionId, bool)> =
            sqlx::query_as("SELECT id, active FROM email_subscriptions WHERE email = $1")
                .bind(email)
                .fetch_optional(self.pool)
                .await?;

        match existing {
            None => {
                sqlx::query("INSERT INTO email_subscriptions (email) VALUES ($1)")
                    .bind(email)
                    .execute(self.pool)
                    .await?;
                Ok(SubscribeOutcome::Created)
            }
            Some((id, false)) => {
                sqlx::query(
                    "UPDATE email_subscriptions SET active = TRUE, updated_at = now() \
                     WHERE id = $1",
                )
                .bind(id)
                .execute(self.pool)
                .await?;
                Ok(SubscribeOutcome::Reactivated)
            }
            Some((_, true)) => Ok(SubscribeOutcome::AlreadyActive),
        }
    }
}
