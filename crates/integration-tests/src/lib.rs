//! Integration tests for the Attire backend.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and the API
//! sqlx migrate run --source crates/api/migrations
//! cargo run -p attire-api
//!
//! # Run the ignored tests against it
//! cargo test -p attire-integration-tests -- --ignored
//! ```
//!
//! Configuration comes from the environment: `API_BASE_URL` (default
//! `http://localhost:3000`), `DATABASE_URL`, and `JWT_SECRET` — the last
//! two must match the running server.
//!
//! Fixtures are seeded directly through sqlx with unique emails and order
//! numbers, so repeated runs against the same database do not collide.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use rand::Rng;
use reqwest::Client;
use sqlx::PgPool;

use attire_core::{CartItemId, OrderId, ProductId, UserId};

/// A seeded account plus the session cookie that authenticates it.
pub struct TestUser {
    pub id: UserId,
    pub email: String,
    /// Ready-to-send `Cookie` header value.
    pub cookie: String,
}

/// Shared handles for one test: HTTP client, server URL, and a pool for
/// seeding and asserting database state.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the configured server and database.
    ///
    /// # Panics
    ///
    /// Panics when `DATABASE_URL` is unset or unreachable.
    pub async fn new() -> Self {
        let base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must point at the test database");

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            pool,
        }
    }

    /// Insert a throwaway account and sign a session cookie for it.
    pub async fn seed_user(&self) -> TestUser {
        let email = format!(
            "integration-{}@example.com",
            rand::rng().random_range(0..u64::MAX)
        );
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO users (email, name) VALUES ($1, 'Integration Test') RETURNING id",
        )
        .bind(&email)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed user");

        let cookie = session_cookie(id, &email);
        TestUser {
            id: UserId::from(id),
            email,
            cookie,
        }
    }

    /// Insert a product with a single variant holding `stock` units.
    pub async fn seed_product(&self, color: &str, size: &str, stock: i32) -> ProductId {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO products (name, brand, category, style, price, sizes, colors) \
             VALUES ('Integration Tee', 'Attire', 'tops', 'casual', 49.90, $1, $2) \
             RETURNING id",
        )
        .bind(vec![size.to_owned()])
        .bind(vec![color.to_owned()])
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed product");

        sqlx::query(
            "INSERT INTO product_variants (product_id, color, size, stock) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(color)
        .bind(size)
        .bind(stock)
        .execute(&self.pool)
        .await
        .expect("Failed to seed variant");

        ProductId::from(id)
    }

    /// Insert a cart line for a seeded user.
    pub async fn seed_cart_item(
        &self,
        user: &TestUser,
        product_id: ProductId,
        color: &str,
        size: &str,
        quantity: i32,
    ) -> CartItemId {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO cart_items (user_id, product_id, color, size, quantity) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(user.id)
        .bind(product_id)
        .bind(color)
        .bind(size)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed cart item");

        CartItemId::from(id)
    }

    /// Insert a draft order header awaiting payment confirmation.
    pub async fn seed_draft_order(&self, user: &TestUser, order_no: &str) -> OrderId {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO orders (order_no, user_id, name, email, phone_number, \
                 street_address, postal_code, city, full_address, delivery_type, \
                 total_amount) \
             VALUES ($1, $2, 'Integration Test', $3, '91234567', '1 Test Street', \
                 '049999', 'Singapore', '1 Test Street, Singapore 049999', \
                 'standard', 49.90) \
             RETURNING id",
        )
        .bind(order_no)
        .bind(user.id)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed draft order");

        OrderId::from(id)
    }

    /// Stock remaining on a seeded variant.
    pub async fn variant_stock(&self, product_id: ProductId, color: &str, size: &str) -> i32 {
        sqlx::query_scalar(
            "SELECT stock FROM product_variants \
             WHERE product_id = $1 AND color = $2 AND size = $3",
        )
        .bind(product_id)
        .bind(color)
        .bind(size)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to read variant stock")
    }

    /// Number of order headers a user owns, draft or not.
    pub async fn order_count(&self, user: &TestUser) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count orders")
    }

    /// Number of cart lines a user owns.
    pub async fn cart_count(&self, user: &TestUser) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count cart items")
    }

    /// A unique order number for seeded fixtures.
    #[must_use]
    pub fn unique_order_no(&self) -> String {
        format!("ORD-ITEST-{}", rand::rng().random_range(0..u64::MAX))
    }
}

/// `Cookie` header value with a session token signed the way the server
/// signs them.
///
/// # Panics
///
/// Panics when `JWT_SECRET` is unset.
#[must_use]
pub fn session_cookie(user_id: i32, email: &str) -> String {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must match the running server");
    let now = Utc::now().timestamp();
    let claims = serde_json::json!({
        "id": user_id,
        "email": email,
        "iat": now,
        "exp": now + 3600,
    });

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign session token");

    format!("jwtToken={token}")
}
