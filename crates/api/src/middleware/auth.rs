//! Session extraction.
//!
//! Handlers take a [`CurrentUser`] argument to require a valid session; the
//! extractor fails closed with 401 when the cookie is missing, expired, or
//! forged.

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;

use attire_core::UserId;

use crate::error::AppError;
use crate::services::token::{SESSION_COOKIE, cookie_value};
use crate::state::AppState;

/// The authenticated user of the current request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: UserId,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| cookie_value(header, SESSION_COOKIE))
            .ok_or(AppError::Unauthorized)?;

        let claims = state.tokens.verify(token)?;

        Ok(Self { id: claims.id })
    }
}
