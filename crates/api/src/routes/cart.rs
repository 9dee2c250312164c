//! Cart routes. All require a session and operate only on the caller's own
//! cart.

use axum::extract::{Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use attire_core::{CartItemId, ProductId};

use crate::db::cart::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::cart::{CartItem, CartLine};
use crate::models::product::SizeStock;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cart))
        .route("/add", post(add_item))
        .route("/{itemId}/increase", patch(increase_quantity))
        .route("/{itemId}/decrease", patch(decrease_quantity))
        .route("/{itemId}", delete(delete_item))
        .route("/getInfo/{itemId}", get(item_info))
        .route("/updateSize/{itemId}", patch(update_size))
        .route("/countCart", get(count_cart))
}

async fn list_cart(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<CartLine>>, AppError> {
    let lines = CartRepository::new(&state.pool).list(current.id).await?;
    Ok(Json(lines))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest {
    product_id: ProductId,
    color: String,
    size: String,
    quantity: i32,
}

async fn add_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartItem>, AppError> {
    if body.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_owned(),
        ));
    }

    let item = CartRepository::new(&state.pool)
        .add(
            current.id,
            body.product_id,
            &body.color,
            &body.size,
            body.quantity,
        )
        .await?;

    Ok(Json(item))
}

async fn increase_quantity(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartItem>, AppError> {
    let item = CartRepository::new(&state.pool)
        .increase_quantity(current.id, item_id)
        .await?;
    Ok(Json(item))
}

async fn decrease_quantity(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartItem>, AppError> {
    let item = CartRepository::new(&state.pool)
        .decrease_quantity(current.id, item_id)
        .await?
        .ok_or_else(|| AppError::Validation("quantity cannot go below 1".to_owned()))?;

    Ok(Json(item))
}

async fn delete_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<Value>, AppError> {
    CartRepository::new(&state.pool)
        .delete(current.id, item_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Serialize)]
struct ItemInfoResponse {
    item: CartItem,
    /// Per-size stock for the item's color, for the size-change picker.
    sizes: Vec<SizeStock>,
}

async fn item_info(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<ItemInfoResponse>, AppError> {
    let item = CartRepository::new(&state.pool)
        .get(current.id, item_id)
        .await?
        .ok_or(AppError::Repository(crate::db::RepositoryError::NotFound))?;

    let sizes = ProductRepository::new(&state.pool)
        .list_size_stock(item.product_id, &item.color)
        .await?;

    Ok(Json(ItemInfoResponse { item, sizes }))
}

#[derive(Debug, Deserialize)]
struct UpdateSizeRequest {
    size: String,
}

async fn update_size(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateSizeRequest>,
) -> Result<Json<CartItem>, AppError> {
    if body.size.trim().is_empty() {
        return Err(AppError::Validation("size must not be empty".to_owned()));
    }

    let item = CartRepository::new(&state.pool)
        .update_size(current.id, item_id, body.size.trim())
        .await?;

    Ok(Json(item))
}

async fn count_cart(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let count = CartRepository::new(&state.pool)
        .total_quantity(current.id)
        .await?;
    Ok(Json(json!({ "count": count })))
}
