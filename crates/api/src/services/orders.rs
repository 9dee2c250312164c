//! Order lifecycle after payment: history, shopper cancellation, and
//! delivery confirmation.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use attire_core::{OrderId, OrderStatus, UserId};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::models::order::{Order, OrderHistoryLine};

/// Errors from order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found")]
    NotFound,

    /// Cancelling an order that is already cancelled.
    #[error("order is already cancelled")]
    AlreadyCancelled,

    /// Confirming receipt of an order that is already completed.
    #[error("order is already completed")]
    AlreadyCompleted,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// An order with its line items for the history page.
#[derive(Debug, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub details: Vec<OrderHistoryLine>,
}

/// Order lifecycle operations.
#[derive(Clone)]
pub struct OrderLifecycleService {
    pool: PgPool,
}

impl OrderLifecycleService {
    /// Create the service.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All non-draft orders of a user, newest first, with line items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<OrderWithLines>, OrderError> {
        let orders = OrderRepository::new(&self.pool);

        let headers = orders.history(user_id).await?;
        let lines = orders.history_lines(user_id).await?;

        let mut result: Vec<OrderWithLines> = headers
            .into_iter()
            .map(|order| OrderWithLines {
                order,
                details: Vec::new(),
            })
            .collect();

        for line in lines {
            if let Some(entry) = result
                .iter_mut()
                .find(|entry| entry.order.id == line.order_id)
            {
                entry.details.push(line);
            }
        }

        Ok(result)
    }

    /// Cancel an order on the shopper's behalf.
    ///
    /// Any state except `cancelled` can be cancelled; stock is not returned
    /// to the catalog, that's a support decision made out of band.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::AlreadyCancelled` when the order is already
    /// cancelled, `OrderError::NotFound` when it doesn't exist or belongs to
    /// another user.
    pub async fn cancel_user_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<(), OrderError> {
        let orders = OrderRepository::new(&self.pool);

        let order = orders
            .get_for_user(order_id, user_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !order.status.can_cancel() {
            return Err(OrderError::AlreadyCancelled);
        }

        orders
            .set_status(order_id, user_id, OrderStatus::Cancelled)
            .await?;
        tracing::info!(%order_id, from = %order.status, "order cancelled by shopper");

        Ok(())
    }

    /// Mark an order as received by the shopper.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::AlreadyCompleted` when the order is already
    /// completed, `OrderError::NotFound` when it doesn't exist or belongs to
    /// another user.
    pub async fn confirm_received(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<(), OrderError> {
        let orders = OrderRepository::new(&self.pool);

        let order = orders
            .get_for_user(order_id, user_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !order.status.can_complete() {
            return Err(OrderError::AlreadyCompleted);
        }

        orders
            .set_status(order_id, user_id, OrderStatus::Completed)
            .await?;
        tracing::info!(%order_id, from = %order.status, "order marked received");

        Ok(())
    }
}
