//! Integration tests for the cart endpoints.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p attire-api)
//! - `DATABASE_URL` and `JWT_SECRET` matching the server
//!
//! Run with: cargo test -p attire-integration-tests -- --ignored

use reqwest::StatusCode;
use reqwest::header::COOKIE;
use serde_json::{Value, json};

use attire_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running api server and PostgreSQL"]
async fn test_duplicate_cart_add_conflicts() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user().await;
    let product_id = ctx.seed_product("Black", "M", 10).await;

    let body = json!({
        "productId": product_id,
        "color": "Black",
        "size": "M",
        "quantity": 1,
    });

    let resp = ctx
        .client
        .post(format!("{}/cart/add", ctx.base_url))
        .header(COOKIE, &user.cookie)
        .json(&body)
        .send()
        .await
        .expect("Failed to add cart item");
    assert_eq!(resp.status(), StatusCode::OK);

    // The same variant again is a conflict, not a quantity bump.
    let resp = ctx
        .client
        .post(format!("{}/cart/add", ctx.base_url))
        .header(COOKIE, &user.cookie)
        .json(&body)
        .send()
        .await
        .expect("Failed to re-add cart item");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    assert_eq!(ctx.cart_count(&user).await, 1);
}

#[tokio::test]
#[ignore = "Requires running api server and PostgreSQL"]
async fn test_decrease_floors_at_one() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user().await;
    let product_id = ctx.seed_product("White", "S", 10).await;
    let item_id = ctx
        .seed_cart_item(&user, product_id, "White", "S", 1)
        .await;

    let resp = ctx
        .client
        .patch(format!("{}/cart/{item_id}/decrease", ctx.base_url))
        .header(COOKIE, &user.cookie)
        .send()
        .await
        .expect("Failed to decrease quantity");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(
        body.get("error").and_then(Value::as_str),
        Some("quantity cannot go below 1")
    );

    // The line survives at quantity 1.
    let quantity: i32 = sqlx::query_scalar("SELECT quantity FROM cart_items WHERE id = $1")
        .bind(item_id)
        .fetch_one(&ctx.pool)
        .await
        .expect("Failed to read cart item");
    assert_eq!(quantity, 1);
}

#[tokio::test]
#[ignore = "Requires running api server and PostgreSQL"]
async fn test_cart_requires_session() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(format!("{}/cart/countCart", ctx.base_url))
        .send()
        .await
        .expect("Failed to call countCart");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
