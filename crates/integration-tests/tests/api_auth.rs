//! Integration tests for sessions and account routes.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p attire-api)
//! - `DATABASE_URL` and `JWT_SECRET` matching the server
//!
//! Run with: cargo test -p attire-integration-tests -- --ignored

use reqwest::StatusCode;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::Value;

use attire_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running api server and PostgreSQL"]
async fn test_profile_returns_seeded_account() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user().await;

    let resp = ctx
        .client
        .get(format!("{}/user/profile", ctx.base_url))
        .header(COOKIE, &user.cookie)
        .send()
        .await
        .expect("Failed to load profile");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse profile");
    assert_eq!(
        body.get("email").and_then(Value::as_str),
        Some(user.email.as_str())
    );
    assert_eq!(body.get("hasPassword").and_then(Value::as_bool), Some(false));
}

#[tokio::test]
#[ignore = "Requires running api server and PostgreSQL"]
async fn test_logout_user_expires_session_cookie() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user().await;

    let resp = ctx
        .client
        .post(format!("{}/user/logoutUser", ctx.base_url))
        .header(COOKIE, &user.cookie)
        .send()
        .await
        .expect("Failed to log out");

    assert_eq!(resp.status(), StatusCode::OK);
    let set_cookie = resp
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("logout must clear the session cookie");
    assert!(set_cookie.starts_with("jwtToken="));
    assert!(set_cookie.contains("Max-Age=0"));
}
