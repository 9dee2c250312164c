//! HTTP surface.

pub mod auth;
pub mod cart;
pub mod newsletter;
pub mod orders;
pub mod products;
pub mod stripe;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the application router, minus health probes and outer layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/user", users::router())
        .nest("/product", products::router())
        .nest("/cart", cart::router())
        .nest("/order", orders::router())
        .nest("/stripe", stripe::router())
        .nest("/email", newsletter::router())
}
