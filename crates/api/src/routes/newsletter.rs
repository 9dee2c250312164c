//! Newsletter subscription route. Public.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use attire_core::Email;

use crate::db::subscriptions::{SubscribeOutcome, SubscriptionRepository};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/addEmailSubscription", post(add_subscription))
}

#[derive(Debug, Deserialize)]
struct SubscribeRequest {
    email: String,
}

async fn add_subscription(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<Value>, AppError> {
    let email =
        Email::parse(&body.email).map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = SubscriptionRepository::new(&state.pool)
        .subscribe(&email)
        .await?;

    // Welcome mail is best-effort and never blocks or fails the response.
    if matches!(
        outcome,
        SubscribeOutcome::Created | SubscribeOutcome::Reactivated
    ) {
        state.email.send_subscription_welcome_background(email);
    }

    Ok(Json(json!({
        "subscribed": true,
        "alreadySubscribed": outcome == SubscribeOutcome::AlreadyActive,
    })))
}
