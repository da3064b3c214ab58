//! Integration tests for Music For Funerals.
//!
//! These run against a live server and database. Every test is `#[ignore]`d
//! so a plain `cargo test` stays offline.
//!
//! # Running Tests
//!
//! ```bash
//! mff-cli migrate
//! MFF_ADMIN_PASSWORD='...' mff-cli admin create -e admin@mff.test -n "Test Admin"
//! cargo run -p mff-server &
//!
//! MFF_TEST_ADMIN_EMAIL=admin@mff.test MFF_TEST_ADMIN_PASSWORD='...' \
//!     cargo test -p mff-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `MFF_TEST_BASE_URL` - Server under test (default: `http://localhost:3000`)
//! - `MFF_TEST_ADMIN_EMAIL`, `MFF_TEST_ADMIN_PASSWORD` - Existing admin account
//! - `MFF_DATABASE_URL` (or `DATABASE_URL`) - The server's database, for tests
//!   that check rows directly
//!
//! # Rate limits
//!
//! Sign-in endpoints are rate limited per client IP. Each [`TestClient`]
//! sends its own random `X-Forwarded-For` address so parallel tests do not
//! share a bucket.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

/// Password used for every customer the tests register.
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("MFF_TEST_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// An address nobody else will use, for registration.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@mff.test", Uuid::new_v4().simple())
}

/// A minimal valid order body.
#[must_use]
pub fn sample_order(deceased_name: &str) -> Value {
    json!({
        "servicePlan": "Standard",
        "planPrice": "249.00",
        "deceasedName": deceased_name,
        "deceasedDateOfBirth": "1941-03-02",
        "deceasedDateOfDeath": "2026-09-30",
        "directorName": "Pat Lowe",
        "directorEmail": "pat@lowe-funerals.test",
    })
}

/// Connect to the database the server under test uses.
pub async fn db_pool() -> PgPool {
    let url = std::env::var("MFF_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("MFF_DATABASE_URL or DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// A cookie-keeping HTTP client with its own client IP.
pub struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    /// A fresh client with an empty cookie jar.
    #[must_use]
    pub fn new() -> Self {
        let bytes = *Uuid::new_v4().as_bytes();
        let ip = format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2]);

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(&ip).unwrap());

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    #[must_use]
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Register a new customer and keep the resulting credential cookie.
    pub async fn register_customer(&self) -> Value {
        let email = unique_email("customer");
        let resp = self
            .post("/api/auth/register")
            .json(&json!({ "email": email, "password": TEST_PASSWORD, "name": "Test Customer" }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED);
        json_body(resp).await
    }

    /// Sign in as the admin named by `MFF_TEST_ADMIN_EMAIL`.
    pub async fn login_admin(&self) {
        let email = std::env::var("MFF_TEST_ADMIN_EMAIL").expect("MFF_TEST_ADMIN_EMAIL not set");
        let password =
            std::env::var("MFF_TEST_ADMIN_PASSWORD").expect("MFF_TEST_ADMIN_PASSWORD not set");

        let resp = self
            .post("/api/admin/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to log in admin");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    /// Create an order and return its number.
    pub async fn create_order(&self, deceased_name: &str) -> String {
        let resp = self
            .post("/api/orders")
            .json(&sample_order(deceased_name))
            .send()
            .await
            .expect("Failed to create order");
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json_body(resp).await;
        body["order"]["id"].as_str().unwrap().to_string()
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a response body as JSON.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("Response was not JSON")
}
