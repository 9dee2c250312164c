//! Payment session lookup.
//!
//! Deliberately unauthenticated: the post-payment success page calls this
//! before the session cookie is guaranteed to be attached, and session ids
//! are unguessable provider-issued tokens.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppError;
use crate::services::stripe::CheckoutSession;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/session/{id}", get(get_session))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CheckoutSession>, AppError> {
    let session = state.stripe.retrieve_session(&session_id).await?;
    Ok(Json(session))
}
