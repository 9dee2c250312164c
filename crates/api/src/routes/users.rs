//! Account profile routes. All require a session.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::user::User;
use crate::services::token::TokenService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/logoutUser", post(logout))
        .route("/updateEmail", patch(update_email))
        .route("/updateNamePhone", patch(update_name_phone))
        .route("/updateAddress", patch(update_address))
        .route("/updatePassword", patch(update_password))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(flatten)]
    user: User,
    has_password: bool,
}

async fn profile(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state.auth.get_user(current.id).await?;
    let has_password = user.has_password();

    Ok(Json(ProfileResponse { user, has_password }))
}

async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, TokenService::clear_cookie())]),
        Json(json!({ "success": true })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEmailRequest {
    new_email: String,
    otp: String,
}

/// Change the account email, gated on a code sent to the new address.
///
/// The session token embeds the email, so a fresh cookie is issued with the
/// response.
async fn update_email(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<UpdateEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth
        .update_email(current.id, &body.new_email, &body.otp)
        .await?;

    let user = state.auth.get_user(current.id).await?;
    let token = state.tokens.sign(user.id, user.email.as_str())?;

    Ok((
        AppendHeaders([(SET_COOKIE, state.tokens.session_cookie(&token))]),
        Json(json!({ "user": user })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNamePhoneRequest {
    name: String,
    phone_number: Option<String>,
}

async fn update_name_phone(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<UpdateNamePhoneRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_owned()));
    }

    state
        .auth
        .update_name_phone(current.id, body.name.trim(), body.phone_number.as_deref())
        .await?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAddressRequest {
    street_address: String,
    unit_number: Option<String>,
    postal_code: String,
    city: String,
}

async fn update_address(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<UpdateAddressRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .auth
        .update_address(
            current.id,
            &body.street_address,
            body.unit_number.as_deref(),
            &body.postal_code,
            &body.city,
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePasswordRequest {
    current_password: Option<String>,
    new_password: String,
}

async fn update_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .auth
        .update_password(
            current.id,
            body.current_password.as_deref(),
            &body.new_password,
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}
