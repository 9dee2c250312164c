//! Authentication routes: registration, password and OTP login, and
//! federated login.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::user::{FederatedProvider, User};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login_lookup))
        .route("/passwordLogin", post(password_login))
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/getJwtToken", get(get_session))
        .route("/google", get(google_login))
        .route("/google/callback", get(google_callback))
        .route("/facebook", get(facebook_login))
        .route("/facebook/callback", get(facebook_callback))
}

type SessionHeaders = AppendHeaders<[(axum::http::HeaderName, String); 1]>;

/// Sign a session token for a user and wrap it in a `Set-Cookie` header.
fn session_headers(state: &AppState, user: &User) -> Result<SessionHeaders, AppError> {
    let token = state.tokens.sign(user.id, user.email.as_str())?;
    Ok(AppendHeaders([(
        SET_COOKIE,
        state.tokens.session_cookie(&token),
    )]))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    name: String,
    password: String,
    otp: String,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth
        .register(&body.email, &body.name, &body.password, &body.otp)
        .await?;

    let headers = session_headers(&state, &user)?;
    Ok((headers, Json(json!({ "user": user }))))
}

#[derive(Debug, Deserialize)]
struct EmailRequest {
    email: String,
}

/// Two-step login UI: does this email have an account?
async fn login_lookup(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    let exists = state.auth.find_by_email(&body.email).await?.is_some();
    Ok(Json(json!({ "exists": exists })))
}

#[derive(Debug, Deserialize)]
struct PasswordLoginRequest {
    email: String,
    password: String,
}

async fn password_login(
    State(state): State<AppState>,
    Json(body): Json<PasswordLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth
        .login_with_password(&body.email, &body.password)
        .await?;

    let headers = session_headers(&state, &user)?;
    Ok((headers, Json(json!({ "user": user }))))
}

async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    state.auth.request_otp(&body.email).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct VerifyOtpRequest {
    email: String,
    otp: String,
}

/// Check a verification code; when the address already has an account, the
/// response also establishes a session (OTP login).
async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Response, AppError> {
    state.auth.verify_otp(&body.email, &body.otp).await?;

    match state.auth.find_by_email(&body.email).await? {
        Some(user) => {
            let headers = session_headers(&state, &user)?;
            Ok((headers, Json(json!({ "verified": true, "user": user }))).into_response())
        }
        None => Ok(Json(json!({ "verified": true })).into_response()),
    }
}

/// Return the current session's account, proving the cookie is valid.
async fn get_session(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let user = state.auth.get_user(current.id).await?;
    Ok(Json(json!({ "user": user })))
}

async fn google_login(State(state): State<AppState>) -> Result<Redirect, AppError> {
    provider_login(&state, FederatedProvider::Google)
}

async fn facebook_login(State(state): State<AppState>) -> Result<Redirect, AppError> {
    provider_login(&state, FederatedProvider::Facebook)
}

fn provider_login(state: &AppState, provider: FederatedProvider) -> Result<Redirect, AppError> {
    let url = state
        .oauth
        .authorize_url(provider)
        .map_err(crate::services::auth::AuthError::from)?;
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    federated_callback(&state, FederatedProvider::Google, query).await
}

async fn facebook_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    federated_callback(&state, FederatedProvider::Facebook, query).await
}

/// Complete a federated login.
///
/// Failures never surface as API errors here: the browser is mid-redirect,
/// so both the denied-consent case and any exchange failure land on the
/// front end's login error route.
async fn federated_callback(
    state: &AppState,
    provider: FederatedProvider,
    query: CallbackQuery,
) -> Response {
    let error_redirect = || Redirect::to(&state.config.login_error_url()).into_response();

    let Some(code) = query.code else {
        return error_redirect();
    };

    let result = async {
        let identity = state
            .oauth
            .exchange_code(provider, &code)
            .await
            .map_err(crate::services::auth::AuthError::from)?;
        state
            .auth
            .login_with_federated_identity(&identity)
            .await
            .map_err(AppError::from)
    }
    .await;

    match result.and_then(|user| session_headers(state, &user)) {
        Ok(headers) => (headers, Redirect::to(&state.config.client_url)).into_response(),
        Err(error) => {
            tracing::warn!(%error, %provider, "federated login failed");
            error_redirect()
        }
    }
}
