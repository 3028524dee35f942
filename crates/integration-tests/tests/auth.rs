//! Health, authentication and account tests.
//!
//! Run with: `cargo test -p strive-integration-tests -- --ignored`

use reqwest::StatusCode;
use serde_json::{Value, json};

use strive_integration_tests::{client, register_customer, staff_token, unique_email, url};

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health_endpoints() {
    let client = client();

    let resp = client.get(url("/health")).send().await.expect("health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");

    let resp = client.get(url("/health/ready")).send().await.expect("ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_register_then_login() {
    let client = client();
    let account = register_customer(&client).await;

    let resp = client
        .post(url("/api/auth/login"))
        .json(&json!({ "email": account.email, "password": "secret-pass-1" }))
        .send()
        .await
        .expect("login");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["userId"].as_i64(), Some(account.user_id));
    assert_eq!(body["role"], "CUSTOMER");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_register_duplicate_email() {
    let client = client();
    let account = register_customer(&client).await;

    let resp = client
        .post(url("/api/auth/register"))
        .json(&json!({
            "email": account.email,
            "password": "another-pass",
            "firstName": "Again",
            "lastName": "Customer",
        }))
        .send()
        .await
        .expect("register");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_login_wrong_password() {
    let client = client();
    let account = register_customer(&client).await;

    let resp = client
        .post(url("/api/auth/login"))
        .json(&json!({ "email": account.email, "password": "not-the-password" }))
        .send()
        .await
        .expect("login");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_reset_password_unknown_token() {
    let resp = client()
        .post(url("/api/auth/reset-password"))
        .json(&json!({ "token": "not-a-token", "newPassword": "whatever-1" }))
        .send()
        .await
        .expect("reset");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_customer_cannot_read_other_user() {
    let client = client();
    let first = register_customer(&client).await;
    let second = register_customer(&client).await;

    let resp = client
        .get(url(&format!("/api/users/{}", second.user_id)))
        .bearer_auth(&first.token)
        .send()
        .await
        .expect("get user");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .get(url(&format!("/api/users/{}", first.user_id)))
        .bearer_auth(&first.token)
        .send()
        .await
        .expect("get self");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_missing_token_is_unauthorized() {
    let resp = client()
        .get(url("/api/users"))
        .send()
        .await
        .expect("list users");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_employee_lifecycle() {
    let client = client();
    let staff = staff_token(&client).await;

    let resp = client
        .post(url("/api/users/employees"))
        .bearer_auth(&staff)
        .json(&json!({
            "email": unique_email("employee"),
            "password": "manager-pass",
            "firstName": "Mona",
            "lastName": "Manager",
        }))
        .send()
        .await
        .expect("create employee");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let employee: Value = resp.json().await.expect("json");
    assert_eq!(employee["role"], "MANAGER");
    let id = employee["id"].as_i64().expect("id");

    let resp = client
        .put(url(&format!("/api/users/employees/{id}")))
        .bearer_auth(&staff)
        .json(&json!({ "role": "ADMIN" }))
        .send()
        .await
        .expect("update employee");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("json");
    assert_eq!(updated["role"], "ADMIN");

    let resp = client
        .delete(url(&format!("/api/users/employees/{id}")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("delete employee");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_notification_preferences_defaults_and_update() {
    let client = client();
    let account = register_customer(&client).await;
    let path = format!("/api/notification-preferences/user/{}", account.user_id);

    let resp = client
        .get(url(&path))
        .bearer_auth(&account.token)
        .send()
        .await
        .expect("get preferences");
    assert_eq!(resp.status(), StatusCode::OK);
    let prefs: Value = resp.json().await.expect("json");
    assert_eq!(prefs["promotions"], false);
    assert_eq!(prefs["orderUpdates"], true);

    let resp = client
        .put(url(&path))
        .bearer_auth(&account.token)
        .json(&json!({ "promotions": true }))
        .send()
        .await
        .expect("update preferences");
    assert_eq!(resp.status(), StatusCode::OK);
    let prefs: Value = resp.json().await.expect("json");
    assert_eq!(prefs["promotions"], true);
    assert_eq!(prefs["orderUpdates"], true);
}
