//! Catalog models: products, per-variant stock, and display images.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use attire_core::{ProductId, VariantId};

/// A catalog entry.
///
/// `sizes` and `colors` are the sets offered across all variants; actual
/// availability is tracked per `(color, size)` in [`ProductVariant`].
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub style: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub image_url: Option<String>,
    pub is_new_arrival: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock for one `(product, color, size)` combination.
///
/// Uniquely keyed by that triple; `stock` never goes negative (enforced by a
/// database CHECK and the conditional decrement in checkout).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub stock: i32,
}

/// A display image, optionally tied to one color of the product.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: ProductId,
    pub color: Option<String>,
    pub image_url: String,
    pub is_thumbnail: bool,
    pub sequence: i32,
}

/// Size and live stock for one variant, used by the cart size-change UI.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SizeStock {
    pub size: String,
    pub stock: i32,
}
