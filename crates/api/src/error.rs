//! HTTP error mapping.
//!
//! Every handler returns `Result<_, AppError>`; domain errors convert in via
//! `From` and map to a status code here. 5xx responses hide the underlying
//! message and report to Sentry.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::oauth::OAuthError;
use crate::services::orders::OrderError;
use crate::services::stripe::StripeError;
use crate::services::token::TokenError;

/// Top-level error for HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or invalid request input.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid session.
    #[error("authentication required")]
    Unauthorized,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Stripe(#[from] StripeError),
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        Self::Unauthorized
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Auth(e) => auth_status(e),
            Self::Checkout(e) => checkout_status(e),
            Self::Order(e) => order_status(e),
            Self::Repository(e) => repository_status(e),
            Self::Stripe(e) => stripe_status(e),
        }
    }
}

fn auth_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::InvalidEmail(_) | AuthError::PasswordTooShort(_) | AuthError::NoPasswordSet => {
            StatusCode::BAD_REQUEST
        }
        AuthError::InvalidOtp | AuthError::IncorrectPassword => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::Hash => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::Oauth(e) => oauth_status(e),
        AuthError::Otp(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::Email(_) => StatusCode::BAD_GATEWAY,
        AuthError::Repository(e) => repository_status(e),
    }
}

fn oauth_status(error: &OAuthError) -> StatusCode {
    match error {
        OAuthError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        OAuthError::Http(_) | OAuthError::Exchange(_) | OAuthError::MissingEmail => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn checkout_status(error: &CheckoutError) -> StatusCode {
    match error {
        CheckoutError::Empty => StatusCode::BAD_REQUEST,
        CheckoutError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        CheckoutError::AlreadyProcessed => StatusCode::CONFLICT,
        CheckoutError::Stripe(e) => stripe_status(e),
        CheckoutError::Repository(e) => repository_status(e),
        CheckoutError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn order_status(error: &OrderError) -> StatusCode {
    match error {
        OrderError::NotFound => StatusCode::NOT_FOUND,
        OrderError::AlreadyCancelled | OrderError::AlreadyCompleted => StatusCode::CONFLICT,
        OrderError::Repository(e) => repository_status(e),
    }
}

fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn stripe_status(error: &StripeError) -> StatusCode {
    match error {
        StripeError::Amount(_) => StatusCode::BAD_REQUEST,
        StripeError::Http(_) | StripeError::Api { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            sentry::capture_error(&self);
            "internal server error".to_owned()
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_401() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_conflict_errors_map_to_409() {
        assert_eq!(
            AppError::Auth(AuthError::EmailTaken).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::AlreadyProcessed).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Order(OrderError::AlreadyCancelled).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let status = AppError::Auth(AuthError::Hash).status();
        assert!(status.is_server_error());
    }

    #[test]
    fn test_upstream_failures_map_to_502() {
        assert_eq!(
            AppError::Stripe(StripeError::Api {
                status: 402,
                message: "card declined".to_owned(),
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
