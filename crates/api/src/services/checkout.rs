//! Checkout: draft order creation, payment confirmation, and draft
//! abandonment.
//!
//! `prepare_order` runs as one transaction: reserve stock for every line,
//! insert the draft order with frozen prices, open a Stripe Checkout
//! Session, and commit only once the session exists. Any failure along the
//! way rolls the whole draft back, stock included.

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use attire_core::{OrderId, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::cart::CartRepository;
use crate::db::orders::{NewOrder, NewOrderLine, OrderRepository};
use crate::models::order::Order;
use crate::services::compose_full_address;
use crate::services::stripe::{
    CheckoutSessionRequest, SessionLineItem, StripeClient, StripeError,
};

/// Errors from checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout with no line items.
    #[error("no items to check out")]
    Empty,

    /// A line references a product that doesn't exist or is inactive.
    #[error("product {0} not available")]
    ProductNotFound(ProductId),

    /// The draft was already confirmed, cancelled, or never existed.
    #[error("order already processed or not found")]
    AlreadyProcessed,

    #[error(transparent)]
    Stripe(#[from] StripeError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One line of a checkout request.
#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub quantity: i32,
}

/// Shipment and delivery details for a new draft order.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub street_address: String,
    pub unit_number: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub delivery_type: String,
    pub delivery_fee: Decimal,
    pub expected_date: Option<String>,
    pub items: Vec<CheckoutItem>,
}

/// Result of preparing an order.
#[derive(Debug)]
pub enum PrepareOutcome {
    /// Draft created; redirect the shopper to the hosted payment page.
    Ready {
        order: Order,
        session_id: String,
        checkout_url: Option<String>,
    },
    /// A line couldn't be reserved; nothing was created.
    Unavailable {
        product_id: ProductId,
        color: String,
        size: String,
    },
}

/// Checkout operations.
#[derive(Clone)]
pub struct CheckoutService {
    pool: PgPool,
    stripe: StripeClient,
    /// Front-end base URL for payment redirects.
    client_url: String,
}

impl CheckoutService {
    /// Create the service.
    #[must_use]
    pub const fn new(pool: PgPool, stripe: StripeClient, client_url: String) -> Self {
        Self {
            pool,
            stripe,
            client_url,
        }
    }

    /// Create a draft order and its payment session.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Empty` for an itemless request,
    /// `CheckoutError::ProductNotFound` for unknown products, or
    /// `CheckoutError::Stripe` when the payment session can't be opened (the
    /// draft is rolled back).
    pub async fn prepare_order(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<PrepareOutcome, CheckoutError> {
        if request.items.is_empty() {
            return Err(CheckoutError::Empty);
        }

        let orders = OrderRepository::new(&self.pool);
        let mut tx = self.pool.begin().await?;

        let mut lines = Vec::with_capacity(request.items.len());
        let mut subtotal_sum = Decimal::ZERO;

        for item in &request.items {
            let (product_name, price) = orders
                .product_snapshot(&mut tx, item.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(item.product_id))?;

            let reserved = orders
                .try_reserve_stock(&mut tx, item.product_id, &item.color, &item.size, item.quantity)
                .await?;
            if !reserved {
                tx.rollback().await?;
                return Ok(PrepareOutcome::Unavailable {
                    product_id: item.product_id,
                    color: item.color.clone(),
                    size: item.size.clone(),
                });
            }

            let subtotal = price * Decimal::from(item.quantity);
            subtotal_sum += subtotal;
            lines.push(NewOrderLine {
                product_id: item.product_id,
                product_name,
                color: item.color.clone(),
                size: item.size.clone(),
                quantity: item.quantity,
                price,
                subtotal,
            });
        }

        let total_amount = subtotal_sum + request.delivery_fee;
        let full_address = compose_full_address(
            &request.street_address,
            request.unit_number.as_deref(),
            &request.city,
            &request.postal_code,
        );

        // The unique constraint on order_no is the real guarantee; a clash
        // between concurrent checkouts in the same millisecond gets one
        // retry with a fresh number, inside a savepoint so the collision
        // leaves the stock reservations above intact.
        let order_no = generate_order_no();
        let fallback_no = generate_order_no();
        let header = draft_header(request, user_id, &order_no, &full_address, total_amount);
        let order = orders.insert_draft(&mut tx, &header, &fallback_no).await?;

        orders
            .insert_lines(&mut tx, order.id, &order.order_no, &lines)
            .await?;

        let session = self
            .stripe
            .create_checkout_session(&CheckoutSessionRequest {
                order_id: order.id,
                order_no: order.order_no.clone(),
                line_items: lines
                    .iter()
                    .map(|line| SessionLineItem {
                        name: line.product_name.clone(),
                        unit_price: line.price,
                        quantity: line.quantity,
                    })
                    .collect(),
                delivery_fee: request.delivery_fee,
                success_url: format!(
                    "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}&orderId={}&orderNo={}",
                    self.client_url, order.id, order.order_no
                ),
                cancel_url: format!("{}/cart", self.client_url),
            })
            .await?;

        tx.commit().await?;

        Ok(PrepareOutcome::Ready {
            order,
            session_id: session.id,
            checkout_url: session.url,
        })
    }

    /// Confirm payment on a draft and clear the shopper's cart.
    ///
    /// Idempotent: replaying a confirmation for an already-confirmed order
    /// fails with `AlreadyProcessed` and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AlreadyProcessed` when no matching draft
    /// exists.
    pub async fn confirm_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
        order_no: &str,
    ) -> Result<(), CheckoutError> {
        let confirmed = OrderRepository::new(&self.pool)
            .confirm_draft(order_id, order_no, user_id)
            .await?;

        if !confirmed {
            return Err(CheckoutError::AlreadyProcessed);
        }

        let cleared = CartRepository::new(&self.pool).clear(user_id).await?;
        tracing::info!(%order_id, order_no, cleared, "order confirmed");

        Ok(())
    }

    /// Abandon a draft order, returning its reserved stock.
    ///
    /// Only drafts can be abandoned; the order row and its lines are
    /// deleted. Confirmed orders are cancelled through the order lifecycle
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AlreadyProcessed` when the order is missing,
    /// confirmed, or not owned by the user.
    pub async fn cancel_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
        order_no: &str,
    ) -> Result<(), CheckoutError> {
        let orders = OrderRepository::new(&self.pool);
        let lines = orders.list_lines(order_id).await?;

        let mut tx = self.pool.begin().await?;

        if !orders
            .delete_draft(&mut tx, order_id, order_no, user_id)
            .await?
        {
            tx.rollback().await?;
            return Err(CheckoutError::AlreadyProcessed);
        }

        for line in &lines {
            orders
                .restore_stock(&mut tx, line.product_id, &line.color, &line.size, line.quantity)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(%order_id, "draft order abandoned, stock restored");

        Ok(())
    }
}

/// Order header values for a new draft, all borrowed from the request.
fn draft_header<'a>(
    request: &'a CheckoutRequest,
    user_id: UserId,
    order_no: &'a str,
    full_address: &'a str,
    total_amount: Decimal,
) -> NewOrder<'a> {
    NewOrder {
        order_no,
        user_id,
        name: &request.name,
        email: &request.email,
        phone_number: &request.phone_number,
        street_address: &request.street_address,
        unit_number: request.unit_number.as_deref(),
        postal_code: &request.postal_code,
        city: &request.city,
        full_address,
        delivery_type: &request.delivery_type,
        delivery_fee: request.delivery_fee,
        total_amount,
        expected_date: request.expected_date.as_deref(),
    }
}

/// Generate an order number: `ORD-{unix_millis}-{4 random digits}`.
fn generate_order_no() -> String {
    format!(
        "ORD-{}-{:04}",
        Utc::now().timestamp_millis(),
        rand::rng().random_range(0..10_000)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_no_shape() {
        let order_no = generate_order_no();
        let parts: Vec<&str> = order_no.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_order_no_suffix_varies() {
        let suffixes: std::collections::HashSet<String> = (0..50)
            .map(|_| generate_order_no().split('-').nth(2).unwrap().to_owned())
            .collect();

        // 50 draws of a 4-digit suffix virtually never all collide.
        assert!(suffixes.len() > 1);
    }
}
