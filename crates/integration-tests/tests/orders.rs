//! Integration tests for orders, claiming and form progress.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (mff-cli migrate)
//! - The server running (cargo run -p mff-server)
//!
//! Run with: cargo test -p mff-integration-tests -- --ignored

use std::collections::BTreeSet;

use mff_integration_tests::{
    TEST_PASSWORD, TestClient, db_pool, json_body, sample_order, unique_email,
};
use reqwest::StatusCode;
use reqwest::header::COOKIE;
use serde_json::json;
use tokio::task::JoinSet;

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_anonymous_order_is_claimed_on_registration() {
    let client = TestClient::new();
    let order_id = client.create_order("Edith Moss").await;
    assert!(order_id.starts_with("MFF"));

    // The session that placed the order can reach it before any account exists
    let resp = client.get(&format!("/api/orders/{order_id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(json_body(resp).await["order"]["userId"].is_null());

    let registered = client.register_customer().await;
    assert_eq!(registered["claimedOrderId"], order_id);

    let resp = client.get("/api/orders").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let orders = json_body(resp).await;
    let ids: Vec<&str> = orders["orders"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|o| o["id"].as_str())
        .collect();
    assert_eq!(ids, vec![order_id.as_str()]);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_hand_set_current_order_cookie_is_not_trusted() {
    let placer = TestClient::new();
    let order_id = placer.create_order("Agnes Hale").await;
    let forged = format!("currentOrderId={order_id}");

    let intruder = TestClient::new();
    let resp = intruder
        .get(&format!("/api/orders/{order_id}"))
        .header(COOKIE, &forged)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = intruder
        .delete(&format!("/api/orders/{order_id}"))
        .header(COOKIE, &forged)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = intruder
        .post("/api/auth/register")
        .header(COOKIE, &forged)
        .json(&json!({
            "email": unique_email("intruder"),
            "password": TEST_PASSWORD,
            "name": "Intruder",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(json_body(resp).await["claimedOrderId"].is_null());

    // Still unclaimed and still reachable by the session that placed it
    let resp = placer.get(&format!("/api/orders/{order_id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(json_body(resp).await["order"]["userId"].is_null());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_other_customer_cannot_read_order() {
    let owner = TestClient::new();
    owner.register_customer().await;
    let order_id = owner.create_order("Harold Finch").await;

    let stranger = TestClient::new();
    stranger.register_customer().await;
    let resp = stranger
        .get(&format!("/api/orders/{order_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = TestClient::new()
        .get(&format!("/api/orders/{order_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_unknown_order_is_not_found() {
    let client = TestClient::new();
    client.register_customer().await;

    let resp = client.get("/api/orders/MFF9999999").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client.get("/api/orders/not-an-order").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_order_validation() {
    let client = TestClient::new();
    client.register_customer().await;

    let resp = client
        .post("/api/orders")
        .json(&json!({ "servicePlan": "Standard" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("deceasedName"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_update_and_delete_order() {
    let client = TestClient::new();
    client.register_customer().await;
    let order_id = client.create_order("Ivy Clarke").await;

    let mut details = sample_order("Ivy May Clarke");
    details["specialRequests"] = json!("Please include Abide With Me");
    let resp = client
        .put(&format!("/api/orders/{order_id}"))
        .json(&details)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["order"]["deceasedName"], "Ivy May Clarke");
    assert_eq!(body["order"]["status"], "pending");

    let resp = client
        .delete(&format!("/api/orders/{order_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(&format!("/api/orders/{order_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_delete_order_removes_saved_progress() {
    let client = TestClient::new();
    client.register_customer().await;
    let order_id = client.create_order("Rose Avery").await;

    let resp = client
        .put(&format!("/api/orders/{order_id}/progress"))
        .json(&json!({ "step": "musicChoices", "data": { "entrance": "Nimrod" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let pool = db_pool().await;
    assert_eq!(progress_rows(&pool, &order_id).await, 1);

    let resp = client
        .delete(&format!("/api/orders/{order_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(progress_rows(&pool, &order_id).await, 0);
}

async fn progress_rows(pool: &sqlx::PgPool, order_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM mff.form_progress WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_concurrent_checkouts_get_distinct_numbers() {
    const CHECKOUTS: usize = 12;

    let mut tasks = JoinSet::new();
    for i in 0..CHECKOUTS {
        tasks.spawn(async move {
            TestClient::new()
                .create_order(&format!("Concurrent Checkout {i}"))
                .await
        });
    }

    let mut suffixes = BTreeSet::new();
    while let Some(order_id) = tasks.join_next().await {
        let order_id = order_id.unwrap();
        let suffix: u64 = order_id.trim_start_matches("MFF").parse().unwrap();
        assert!(suffixes.insert(suffix), "duplicate order number {order_id}");
    }
    assert_eq!(suffixes.len(), CHECKOUTS);
}

// ============================================================================
// Form progress
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_progress_merges_steps() {
    let client = TestClient::new();
    client.register_customer().await;
    let order_id = client.create_order("Walter Grey").await;
    let path = format!("/api/orders/{order_id}/progress");

    let resp = client.get(&path).send().await.unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["data"], json!({}));
    assert_eq!(body["revision"], 0);

    for (step, data) in [
        ("deceasedDetails", json!({ "nickname": "Wally" })),
        ("musicFormat", json!({ "format": "live" })),
    ] {
        let resp = client
            .put(&path)
            .json(&json!({ "step": step, "data": data }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client.get(&path).send().await.unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["data"]["deceasedDetails"]["nickname"], "Wally");
    assert_eq!(body["data"]["musicFormat"]["format"], "live");
    assert_eq!(body["revision"], 2);

    let resp = client
        .get(&format!("{path}?step=musicFormat"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["data"], json!({ "format": "live" }));

    let resp = client
        .get(&format!("{path}?step=neverSaved"))
        .send()
        .await
        .unwrap();
    assert!(json_body(resp).await["data"].is_null());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_only_one_preference_step_is_kept() {
    let client = TestClient::new();
    client.register_customer().await;
    let order_id = client.create_order("Rose Hall").await;
    let path = format!("/api/orders/{order_id}/progress");

    client
        .put(&path)
        .json(&json!({ "step": "catholicPreference", "data": { "hymn": "Ave Maria" } }))
        .send()
        .await
        .unwrap();
    let resp = client
        .put(&path)
        .json(&json!({ "step": "secularOrCivilPreference", "data": { "reading": "Do not stand at my grave" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let data = &json_body(resp).await["data"];
    assert!(data.get("catholicPreference").is_none());
    assert!(data.get("secularOrCivilPreference").is_some());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_stale_revision_is_conflict() {
    let client = TestClient::new();
    client.register_customer().await;
    let order_id = client.create_order("Ada Price").await;
    let path = format!("/api/orders/{order_id}/progress");

    let resp = client
        .put(&path)
        .json(&json!({ "step": "deceasedDetails", "data": {}, "revision": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .put(&path)
        .json(&json!({ "step": "musicFormat", "data": {}, "revision": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

// ============================================================================
// Wizard
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_wizard_state_survives_between_requests() {
    let client = TestClient::new();

    let resp = client
        .post("/api/wizard/actions")
        .json(&json!({ "type": "setMusicFormat", "value": "live" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get("/api/wizard").send().await.unwrap();
    assert_eq!(json_body(resp).await["state"]["musicFormat"], "live");

    let resp = client.delete("/api/wizard").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get("/api/wizard").send().await.unwrap();
    assert!(json_body(resp).await["state"]["musicFormat"].is_null());
}
