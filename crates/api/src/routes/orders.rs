//! Checkout and order lifecycle routes. All require a session.

use axum::extract::State;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use attire_core::{OrderId, ProductId};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::checkout::{CheckoutItem, CheckoutRequest, PrepareOutcome};
use crate::services::orders::OrderWithLines;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prepare", post(prepare_order))
        .route("/confirmOrder", put(confirm_order))
        .route("/cancelOrder", delete(cancel_order))
        .route("/orderHistory", get(order_history))
        .route("/cancelUserOrder", patch(cancel_user_order))
        .route("/confirmOrderReceived", patch(confirm_order_received))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareItemRequest {
    product_id: ProductId,
    color: String,
    size: String,
    quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareOrderRequest {
    name: String,
    email: String,
    phone_number: String,
    street_address: String,
    unit_number: Option<String>,
    postal_code: String,
    city: String,
    delivery_type: String,
    delivery_fee: Decimal,
    expected_date: Option<String>,
    items: Vec<PrepareItemRequest>,
}

/// Create a draft order and payment session.
///
/// Insufficient stock is a normal outcome, not an error: the response is
/// 200 with `status: "unavailable"` and nothing is persisted.
async fn prepare_order(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<PrepareOrderRequest>,
) -> Result<Json<Value>, AppError> {
    if body.items.iter().any(|item| item.quantity < 1) {
        return Err(AppError::Validation(
            "item quantity must be at least 1".to_owned(),
        ));
    }

    let request = CheckoutRequest {
        name: body.name,
        email: body.email,
        phone_number: body.phone_number,
        street_address: body.street_address,
        unit_number: body.unit_number,
        postal_code: body.postal_code,
        city: body.city,
        delivery_type: body.delivery_type,
        delivery_fee: body.delivery_fee,
        expected_date: body.expected_date,
        items: body
            .items
            .into_iter()
            .map(|item| CheckoutItem {
                product_id: item.product_id,
                color: item.color,
                size: item.size,
                quantity: item.quantity,
            })
            .collect(),
    };

    let outcome = state.checkout.prepare_order(current.id, &request).await?;

    let response = match outcome {
        PrepareOutcome::Ready {
            order,
            session_id,
            checkout_url,
        } => json!({
            "status": "success",
            "orderId": order.id,
            "orderNo": order.order_no,
            "sessionId": session_id,
            "url": checkout_url,
        }),
        PrepareOutcome::Unavailable {
            product_id,
            color,
            size,
        } => json!({
            "status": "unavailable",
            "productId": product_id,
            "color": color,
            "size": size,
        }),
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRef {
    order_id: OrderId,
    order_no: String,
}

async fn confirm_order(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<OrderRef>,
) -> Result<Json<Value>, AppError> {
    state
        .checkout
        .confirm_order(current.id, body.order_id, &body.order_no)
        .await?;
    Ok(Json(json!({ "status": "success" })))
}

async fn cancel_order(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<OrderRef>,
) -> Result<Json<Value>, AppError> {
    state
        .checkout
        .cancel_order(current.id, body.order_id, &body.order_no)
        .await?;
    Ok(Json(json!({ "status": "success" })))
}

async fn order_history(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<OrderWithLines>>, AppError> {
    let orders = state.orders.history(current.id).await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderIdRequest {
    order_id: OrderId,
}

async fn cancel_user_order(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<OrderIdRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .orders
        .cancel_user_order(current.id, body.order_id)
        .await?;
    Ok(Json(json!({ "status": "success" })))
}

async fn confirm_order_received(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<OrderIdRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .orders
        .confirm_received(current.id, body.order_id)
        .await?;
    Ok(Json(json!({ "status": "success" })))
}
