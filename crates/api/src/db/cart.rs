//! Cart repository.
//!
//! Every operation is scoped by `user_id`, so one user can never read or
//! mutate another user's cart rows.

use sqlx::PgPool;

use attire_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{CartItem, CartLine};

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All cart lines for a user, joined with catalog display data.
    ///
    /// The image is the color-matching product image when one exists,
    /// otherwise the product's main image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT c.id, c.product_id, c.color, c.size, c.quantity, \
                    p.name AS product_name, p.price, \
                    COALESCE( \
                        (SELECT i.image_url FROM product_images i \
                         WHERE i.product_id = p.id AND lower(i.color) = lower(c.color) \
                         ORDER BY i.is_thumbnail DESC, i.sequence LIMIT 1), \
                        p.image_url \
                    ) AS image_url \
             FROM cart_items c \
             JOIN products p ON p.id = c.product_id \
             WHERE c.user_id = $1 \
             ORDER BY c.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// One cart row by id, scoped to the owning user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT id, user_id, product_id, color, size, quantity, created_at \
             FROM cart_items WHERE id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(item)
    }

    /// Add a variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a line for
    /// this exact `(product, color, size)`.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        color: &str,
        size: &str,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_items (user_id, product_id, color, size, quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, product_id, color, size, quantity, created_at",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(color)
        .bind(size)
        .bind(quantity)
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::conflict_on_unique(e, "item already in cart"))?;

        Ok(item)
    }

    /// Increment a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or
    /// belongs to another user.
    pub async fn increase_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartItem, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            "UPDATE cart_items SET quantity = quantity + 1 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, product_id, color, size, quantity, created_at",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(item)
    }

    /// Decrement a line's quantity by one, but never below one.
    ///
    /// Returns the updated row, or `None` when the line was already at the
    /// minimum quantity (nothing changed).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or
    /// belongs to another user.
    pub async fn decrease_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            "UPDATE cart_items SET quantity = quantity - 1 \
             WHERE id = $1 AND user_id = $2 AND quantity > 1 \
             RETURNING id, user_id, product_id, color, size, quantity, created_at",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        if item.is_some() {
            return Ok(item);
        }

        // Distinguish "at minimum" from "no such row".
        if self.get(user_id, item_id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        Ok(None)
    }

    /// Change a line's size, keeping quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a line for
    /// the target size, `RepositoryError::NotFound` if the line doesn't
    /// exist.
    pub async fn update_size(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        size: &str,
    ) -> Result<CartItem, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            "UPDATE cart_items SET size = $1 \
             WHERE id = $2 AND user_id = $3 \
             RETURNING id, user_id, product_id, color, size, quantity, created_at",
        )
        .bind(size)
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| super::conflict_on_unique(e, "cart already has that size"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(item)
    }

    /// Delete one cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or
    /// belongs to another user.
    pub async fn delete(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Total quantity across the user's cart (badge count).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_quantity(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Remove every cart line for a user (after a confirmed checkout).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
