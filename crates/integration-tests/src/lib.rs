//! Black-box tests for the Strive API.
//!
//! # Running Tests
//!
//! ```bash
//! strive migrate
//! strive user create -e "$STRIVE_STAFF_EMAIL" -p "$STRIVE_STAFF_PASSWORD" \
//!     --first-name Test --last-name Admin -r admin
//! cargo run -p strive-api &
//! cargo test -p strive-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `STRIVE_API_URL` - base URL of the running server (default `http://localhost:8080`)
//! - `STRIVE_STAFF_EMAIL` / `STRIVE_STAFF_PASSWORD` - an ADMIN account for staff-only routes

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STRIVE_API_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Absolute URL for an API path such as `/api/products`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A plain HTTP client.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// A freshly registered customer.
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: i64,
    pub email: String,
    pub token: String,
}

/// An email nobody has registered yet.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// Register a new customer and return its id and token.
pub async fn register_customer(client: &Client) -> Account {
    let email = unique_email("customer");
    let resp = client
        .post(url("/api/auth/register"))
        .json(&json!({
            "email": email,
            "password": "secret-pass-1",
            "firstName": "Test",
            "lastName": "Customer",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse register response");
    Account {
        user_id: body["userId"].as_i64().expect("userId missing"),
        email,
        token: body["token"].as_str().expect("token missing").to_string(),
    }
}

/// Log in with the staff account from the environment.
pub async fn staff_token(client: &Client) -> String {
    let email = std::env::var("STRIVE_STAFF_EMAIL").expect("STRIVE_STAFF_EMAIL not set");
    let password = std::env::var("STRIVE_STAFF_PASSWORD").expect("STRIVE_STAFF_PASSWORD not set");

    let resp = client
        .post(url("/api/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in as staff");
    assert_eq!(resp.status(), StatusCode::OK, "staff login failed");

    let body: Value = resp.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("token missing").to_string()
}

/// Create a product as staff and return its JSON.
pub async fn create_product(client: &Client, staff: &str, name: &str, price: &str) -> Value {
    let resp = client
        .post(url("/api/products"))
        .bearer_auth(staff)
        .json(&json!({
            "name": name,
            "description": "Created by integration tests",
            "price": price,
            "stocks": [{ "size": "42", "stock": 5 }],
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse product")
}
