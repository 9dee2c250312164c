//! Shared application state.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::services::auth::AuthService;
use crate::services::checkout::CheckoutService;
use crate::services::email::{EmailError, EmailService};
use crate::services::oauth::OAuthService;
use crate::services::orders::OrderLifecycleService;
use crate::services::otp::OtpStore;
use crate::services::stripe::StripeClient;
use crate::services::token::TokenService;

/// Errors from wiring up the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Email(#[from] EmailError),

    /// An outbound HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Everything a handler needs, cheaply cloneable.
///
/// All clients are constructed once here and injected; nothing reaches for
/// process globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub pool: PgPool,
    pub tokens: TokenService,
    pub stripe: StripeClient,
    pub email: EmailService,
    pub oauth: OAuthService,
    pub auth: AuthService,
    pub checkout: CheckoutService,
    pub orders: OrderLifecycleService,
}

impl AppState {
    /// Wire up all services from configuration and a database pool.
    ///
    /// # Errors
    ///
    /// Returns `StateError` when the SMTP configuration is invalid or an
    /// outbound HTTP client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(&config.jwt);
        let stripe = StripeClient::new(&config.stripe)?;
        let email = EmailService::new(&config.email)?;
        let oauth = OAuthService::new(config.oauth.clone(), config.base_url.clone())?;
        let otp = OtpStore::new();

        let auth = AuthService::new(pool.clone(), otp, email.clone());
        let checkout = CheckoutService::new(pool.clone(), stripe.clone(), config.client_url.clone());
        let orders = OrderLifecycleService::new(pool.clone());

        Ok(Self {
            config: Arc::new(config),
            pool,
            tokens,
            stripe,
            email,
            oauth,
            auth,
            checkout,
            orders,
        })
    }
}
