//! Integration tests for the admin API and pages.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (mff-cli migrate)
//! - The server running (cargo run -p mff-server)
//! - An admin account in `MFF_TEST_ADMIN_EMAIL` / `MFF_TEST_ADMIN_PASSWORD`
//!
//! Run with: cargo test -p mff-integration-tests -- --ignored

use mff_integration_tests::{TestClient, json_body};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use uuid::Uuid;

async fn admin_client() -> TestClient {
    let client = TestClient::new();
    client.login_admin().await;
    client
}

fn item_ids(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["id"].as_str().map(str::to_string))
        .collect()
}

// ============================================================================
// Access control
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_api_requires_admin_credential() {
    let customer = TestClient::new();
    customer.register_customer().await;

    for path in ["/api/admin/orders", "/api/admin/faqs", "/api/admin/admins"] {
        let resp = customer.get(path).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_bootstrap_registration_is_closed() {
    let resp = TestClient::new()
        .post("/api/admin/auth/register")
        .json(&json!({
            "email": format!("intruder-{}@mff.test", Uuid::new_v4().simple()),
            "password": "a long enough password",
            "name": "Intruder",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_admin_pages() {
    let anonymous = TestClient::new();
    let resp = anonymous.get("/admin").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/admin/login");

    let admin = admin_client().await;
    let resp = admin.get("/admin").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Recent orders"));

    let resp = admin.get("/admin/login").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

// ============================================================================
// Content
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_faq_crud_and_public_visibility() {
    let admin = admin_client().await;
    let question = format!("Integration question {}?", Uuid::new_v4().simple());

    let resp = admin
        .post("/api/admin/faqs")
        .json(&json!({ "question": question, "answer": "Yes.", "order": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let item = json_body(resp).await["item"].clone();
    let id = item["id"].as_str().unwrap().to_string();
    assert_eq!(item["isActive"], true);
    assert_eq!(item["order"], 3);

    let public = TestClient::new();
    let resp = public.get("/api/content/faqs").send().await.unwrap();
    assert!(item_ids(&json_body(resp).await).contains(&id));

    // Hidden items stay in the admin list but leave the public one
    let resp = admin
        .put(&format!("/api/admin/faqs/{id}"))
        .json(&json!({ "question": question, "answer": "Yes, any time.", "isActive": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let item = json_body(resp).await["item"].clone();
    assert_eq!(item["answer"], "Yes, any time.");
    assert_eq!(item["order"], 3);

    let resp = public.get("/api/content/faqs").send().await.unwrap();
    assert!(!item_ids(&json_body(resp).await).contains(&id));
    let resp = admin.get("/api/admin/faqs").send().await.unwrap();
    assert!(item_ids(&json_body(resp).await).contains(&id));

    let resp = admin
        .delete(&format!("/api/admin/faqs/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = admin
        .get(&format!("/api/admin/faqs/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_content_validation() {
    let admin = admin_client().await;

    let resp = admin
        .post("/api/admin/pricing")
        .json(&json!({ "name": "Broken", "price": "-5" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = admin
        .post("/api/admin/videos")
        .json(&json!({ "title": "No link", "videoUrl": "javascript:alert(1)" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_unknown_public_collection_is_not_found() {
    let resp = TestClient::new()
        .get("/api/content/testimonials")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_status_workflow() {
    let customer = TestClient::new();
    customer.register_customer().await;
    let order_id = customer.create_order("Norah Bell").await;

    let admin = admin_client().await;
    let status_path = format!("/api/admin/orders/{order_id}/status");

    let resp = admin
        .put(&status_path)
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["order"]["status"], "confirmed");

    let resp = admin
        .get("/api/admin/orders?status=confirmed")
        .send()
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert!(body["orders"]
        .as_array()
        .unwrap()
        .iter()
        .all(|o| o["status"] == "confirmed"));

    let resp = admin
        .put(&status_path)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Terminal orders stay put, for staff and customer alike
    let resp = admin
        .put(&status_path)
        .json(&json!({ "status": "pending" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = customer
        .put(&format!("/api/orders/{order_id}"))
        .json(&mff_integration_tests::sample_order("Norah Bell"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = admin
        .put(&status_path)
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_upload_is_served_back() {
    let admin = admin_client().await;
    let png = b"\x89PNG\r\n\x1a\n0000".to_vec();

    let form = Form::new().part("file", Part::bytes(png.clone()).file_name("hero.png"));
    let resp = admin
        .post("/api/admin/uploads")
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let url = json_body(resp).await["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));

    let resp = TestClient::new().get(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.bytes().await.unwrap().to_vec(), png);

    let form = Form::new().part("file", Part::bytes(b"<svg/>".to_vec()).file_name("x.svg"));
    let resp = admin
        .post("/api/admin/uploads")
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
