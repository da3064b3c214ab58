//! Integration tests for customer accounts.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (mff-cli migrate)
//! - The server running (cargo run -p mff-server)
//!
//! Run with: cargo test -p mff-integration-tests -- --ignored

use mff_integration_tests::{TEST_PASSWORD, TestClient, json_body, unique_email};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_register_me_logout() {
    let client = TestClient::new();
    let registered = client.register_customer().await;
    let email = registered["user"]["email"].as_str().unwrap().to_string();
    assert!(registered["user"].get("passwordHash").is_none());

    let resp = client.get("/api/auth/me").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["user"]["email"], email);

    let resp = client.post("/api/auth/logout").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get("/api/auth/me").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_duplicate_registration_is_conflict() {
    let client = TestClient::new();
    let email = unique_email("dupe");
    let body = json!({ "email": email, "password": TEST_PASSWORD });

    let resp = client.post("/api/auth/register").json(&body).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Email comparison ignores case
    let body = json!({ "email": email.to_uppercase(), "password": TEST_PASSWORD });
    let resp = TestClient::new()
        .post("/api/auth/register")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_login_with_wrong_password_is_unauthorized() {
    let client = TestClient::new();
    let email = unique_email("login");
    client
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();

    let fresh = TestClient::new();
    let resp = fresh
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": "not the password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = fresh
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_weak_password_is_rejected() {
    let resp = TestClient::new()
        .post("/api/auth/register")
        .json(&json!({ "email": unique_email("weak"), "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_forgot_password_does_not_reveal_accounts() {
    let client = TestClient::new();
    let unknown = client
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": unique_email("nobody") }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown = json_body(unknown).await;

    let email = unique_email("forgetful");
    TestClient::new()
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    let known = client
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(known.status(), StatusCode::OK);
    assert_eq!(json_body(known).await, unknown);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_reset_with_bogus_token_is_rejected() {
    let resp = TestClient::new()
        .post("/api/auth/reset-password")
        .json(&json!({ "token": "not-a-real-token", "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_dashboard_redirects_to_login_with_callback() {
    let resp = TestClient::new().get("/dashboard/orders").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()["location"],
        "/login?callbackUrl=%2Fdashboard%2Forders"
    );
}
