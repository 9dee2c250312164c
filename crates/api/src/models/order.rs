//! Order models.
//!
//! An order snapshots shipment contact details and per-line prices at
//! creation time; later catalog or profile edits never change historical
//! orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use attire_core::{OrderDetailId, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

/// An order row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_no: String,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub street_address: String,
    pub unit_number: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub full_address: String,
    pub delivery_type: String,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
    pub expected_date: Option<String>,
    pub arrives_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item frozen at order-creation time.
///
/// `subtotal` is `price * quantity` with the price as it was when the order
/// was created.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub order_no: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// An order line joined with its display thumbnail for the history page.
///
/// The thumbnail is the image matching the line's color when one exists,
/// otherwise the product's first image, otherwise empty.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderHistoryLine {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub order_no: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub image_url: String,
}
