//! Order repository.
//!
//! Checkout runs inside one transaction (stock reservation, order insert,
//! line insert), so the write methods here take an explicit connection
//! instead of the pool. Read and lifecycle methods run on the pool.

use rust_decimal::Decimal;
use sqlx::{Acquire, PgConnection, PgPool};

use attire_core::{OrderId, OrderStatus, ProductId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::order::{Order, OrderDetail, OrderHistoryLine};

/// Columns selected for every `Order` load, in `FromRow` order.
const ORDER_COLUMNS: &str = "id, order_no, user_id, name, email, phone_number, street_address, \
     unit_number, postal_code, city, full_address, delivery_type, delivery_fee, total_amount, \
     expected_date, arrives_date, status, payment_status, cancelled_at, completed_at, \
     created_at, updated_at";

/// Order header values frozen at creation time.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_no: &'a str,
    pub user_id: UserId,
    pub name: &'a str,
    pub email: &'a str,
    pub phone_number: &'a str,
    pub street_address: &'a str,
    pub unit_number: Option<&'a str>,
    pub postal_code: &'a str,
    pub city: &'a str,
    pub full_address: &'a str,
    pub delivery_type: &'a str,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
    pub expected_date: Option<&'a str>,
}

/// One line of a new order, price already frozen.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Name and current price of an active product, read inside the
    /// checkout transaction so the frozen price matches what was reserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_snapshot(
        &self,
        conn: &mut PgConnection,
        product_id: ProductId,
    ) -> Result<Option<(String, Decimal)>, RepositoryError> {
        let row: Option<(String, Decimal)> =
            sqlx::query_as("SELECT name, price FROM products WHERE id = $1 AND is_active")
                .bind(product_id)
                .fetch_optional(conn)
                .await?;

        Ok(row)
    }

    /// Atomically reserve stock for one variant.
    ///
    /// Decrements only when enough stock remains; returns `false` (and
    /// changes nothing) otherwise. The CHECK constraint on `stock` backs
    /// this up, but the condition here is what keeps concurrent checkouts
    /// from racing each other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn try_reserve_stock(
        &self,
        conn: &mut PgConnection,
        product_id: ProductId,
        color: &str,
        size: &str,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE product_variants SET stock = stock - $1 \
             WHERE product_id = $2 AND color = $3 AND size = $4 AND stock >= $1",
        )
        .bind(quantity)
        .bind(product_id)
        .bind(color)
        .bind(size)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Return reserved stock to a variant (draft abandonment).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn restore_stock(
        &self,
        conn: &mut PgConnection,
        product_id: ProductId,
        color: &str,
        size: &str,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE product_variants SET stock = stock + $1 \
             WHERE product_id = $2 AND color = $3 AND size = $4",
        )
        .bind(quantity)
        .bind(product_id)
        .bind(color)
        .bind(size)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Insert an order header in `draft`/`pending` state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `order_no` is already taken.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        order: &NewOrder<'_>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (order_no, user_id, name, email, phone_number, street_address, \
                 unit_number, postal_code, city, full_address, delivery_type, delivery_fee, \
                 total_amount, expected_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.order_no)
        .bind(order.user_id)
        .bind(order.name)
        .bind(order.email)
        .bind(order.phone_number)
        .bind(order.street_address)
        .bind(order.unit_number)
        .bind(order.postal_code)
        .bind(order.city)
        .bind(order.full_address)
        .bind(order.delivery_type)
        .bind(order.delivery_fee)
        .bind(order.total_amount)
        .bind(order.expected_date)
        .fetch_one(conn)
        .await
        .map_err(|e| conflict_on_unique(e, "order number already exists"))?;

        Ok(row)
    }

    /// Insert a draft order header, retrying once with `fallback_no` when
    /// `order_no` collides.
    ///
    /// The first attempt runs in a savepoint: a unique violation would
    /// otherwise abort the caller's whole transaction, losing the stock
    /// reservations made before it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the fallback number collides
    /// too.
    pub async fn insert_draft(
        &self,
        conn: &mut PgConnection,
        order: &NewOrder<'_>,
        fallback_no: &str,
    ) -> Result<Order, RepositoryError> {
        let mut attempt = conn.begin().await?;
        match self.insert(&mut attempt, order).await {
            Ok(created) => {
                attempt.commit().await?;
                Ok(created)
            }
            Err(RepositoryError::Conflict(_)) => {
                attempt.rollback().await?;
                let retry = NewOrder {
                    order_no: fallback_no,
                    ..order.clone()
                };
                self.insert(conn, &retry).await
            }
            Err(e) => Err(e),
        }
    }

    /// Insert the frozen line items of a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails.
    pub async fn insert_lines(
        &self,
        conn: &mut PgConnection,
        order_id: OrderId,
        order_no: &str,
        lines: &[NewOrderLine],
    ) -> Result<(), RepositoryError> {
        for line in lines {
            sqlx::query(
                "INSERT INTO order_details (order_id, order_no, product_id, product_name, \
                     color, size, quantity, price, subtotal) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(order_id)
            .bind(order_no)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(&line.color)
            .bind(&line.size)
            .bind(line.quantity)
            .bind(line.price)
            .bind(line.subtotal)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Get an order by id, scoped to the owning user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Line items of one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_lines(&self, order_id: OrderId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderDetail>(
            "SELECT id, order_id, order_no, product_id, product_name, color, size, quantity, \
                 price, subtotal \
             FROM order_details WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Confirm payment on a draft order.
    ///
    /// The update is conditional on the full identity of the draft (id,
    /// order number, owner) and on it still being `draft`/`pending`, so a
    /// replayed confirmation changes nothing and reports zero rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn confirm_draft(
        &self,
        order_id: OrderId,
        order_no: &str,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'confirmed', payment_status = 'paid', \
                 updated_at = now() \
             WHERE id = $1 AND order_no = $2 AND user_id = $3 \
                 AND status = 'draft' AND payment_status = 'pending'",
        )
        .bind(order_id)
        .bind(order_no)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete an abandoned draft order inside the caller's transaction.
    ///
    /// Line items go with it via `ON DELETE CASCADE`. Returns `false` when
    /// the order is missing, not a draft, or not owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_draft(
        &self,
        conn: &mut PgConnection,
        order_id: OrderId,
        order_no: &str,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM orders \
             WHERE id = $1 AND order_no = $2 AND user_id = $3 AND status = 'draft'",
        )
        .bind(order_id)
        .bind(order_no)
        .bind(user_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Set an order's lifecycle status, stamping the matching timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist or
    /// belongs to another user.
    pub async fn set_status(
        &self,
        order_id: OrderId,
        user_id: UserId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let timestamp_set = match status {
            OrderStatus::Cancelled => ", cancelled_at = now(), expected_date = NULL",
            OrderStatus::Completed => ", completed_at = now(), arrives_date = now()",
            OrderStatus::Draft | OrderStatus::Confirmed => "",
        };

        let result = sqlx::query(&format!(
            "UPDATE orders SET status = $1, updated_at = now(){timestamp_set} \
             WHERE id = $2 AND user_id = $3"
        ))
        .bind(status)
        .bind(order_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Non-draft orders for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 AND status <> 'draft' \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Line items with display thumbnails for every non-draft order of a
    /// user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history_lines(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderHistoryLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderHistoryLine>(
            "SELECT d.id, d.order_id, d.order_no, d.product_id, d.product_name, d.color, \
                    d.size, d.quantity, d.price, d.subtotal, \
                    COALESCE( \
                        (SELECT i.image_url FROM product_images i \
                         WHERE i.product_id = d.product_id \
                             AND lower(i.color) = lower(d.color) \
                         ORDER BY i.is_thumbnail DESC, i.sequence LIMIT 1), \
                        (SELECT i.image_url FROM product_images i \
                         WHERE i.product_id = d.product_id \
                         ORDER BY i.sequence LIMIT 1), \
                        '' \
                    ) AS image_url \
             FROM order_details d \
             JOIN orders o ON o.id = d.order_id \
             WHERE o.user_id = $1 AND o.status <> 'draft' \
             ORDER BY o.created_at DESC, d.id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::Rng;

    use super::*;

    fn draft<'a>(order_no: &'a str, user_id: UserId, email: &'a str) -> NewOrder<'a> {
        NewOrder {
            order_no,
            user_id,
            name: "Test Shopper",
            email,
            phone_number: "91234567",
            street_address: "1 Test Street",
            unit_number: None,
            postal_code: "049999",
            city: "Singapore",
            full_address: "1 Test Street, Singapore 049999",
            delivery_type: "standard",
            delivery_fee: Decimal::ZERO,
            total_amount: Decimal::new(4990, 2),
            expected_date: None,
        }
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
    async fn test_insert_draft_survives_order_no_collision() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = PgPool::connect(&url).await.unwrap();
        let repo = OrderRepository::new(&pool);

        let mut tx = pool.begin().await.unwrap();

        let suffix: u32 = rand::rng().random_range(0..1_000_000);
        let email = format!("collision-{suffix}@example.com");
        let user_id: UserId = sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (email, name) VALUES ($1, 'Test Shopper') RETURNING id",
        )
        .bind(&email)
        .fetch_one(&mut *tx)
        .await
        .unwrap()
        .into();

        let taken = format!("ORD-COLLIDE-{suffix}");
        repo.insert(&mut tx, &draft(&taken, user_id, &email))
            .await
            .unwrap();

        // The colliding first attempt must not abort the outer transaction.
        let fallback = format!("{taken}-F");
        let order = repo
            .insert_draft(&mut tx, &draft(&taken, user_id, &email), &fallback)
            .await
            .unwrap();
        assert_eq!(order.order_no, fallback);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        assert_eq!(count, 2);

        tx.rollback().await.unwrap();
    }
}
