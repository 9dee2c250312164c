//! Cart models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use attire_core::{CartItemId, ProductId, UserId};

/// One cart row.
///
/// Unique per `(user, product, color, size)`; `quantity` never drops below 1
/// (the row is deleted instead).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// A cart row joined with catalog display data for the cart page.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub product_name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
}
