//! Address book, order placement, status changes and the finance rollup.
//!
//! Run with: `cargo test -p strive-integration-tests -- --ignored`

use reqwest::StatusCode;
use serde_json::{Value, json};

use strive_integration_tests::{client, create_product, register_customer, staff_token, url};

fn shipping() -> Value {
    json!({
        "recipientName": "Test Customer",
        "recipientPhone": "555-0100",
        "streetAddress": "1 Track Lane",
        "city": "Portland",
        "country": "US",
    })
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_address_default_flag_moves() {
    let client = client();
    let customer = register_customer(&client).await;

    for name in ["Home", "Work"] {
        let mut body = shipping();
        body["userId"] = json!(customer.user_id);
        body["name"] = json!(name);
        body["isDefault"] = json!(true);
        let resp = client
            .post(url("/api/addresses"))
            .bearer_auth(&customer.token)
            .json(&body)
            .send()
            .await
            .expect("create address");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let addresses: Value = client
        .get(url(&format!("/api/addresses/user/{}", customer.user_id)))
        .bearer_auth(&customer.token)
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("json");
    let defaults: Vec<&Value> = addresses
        .as_array()
        .expect("array")
        .iter()
        .filter(|a| a["isDefault"] == true)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0]["name"], "Work");
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_place_order_and_change_status() {
    let client = client();
    let staff = staff_token(&client).await;
    let customer = register_customer(&client).await;
    let product = create_product(&client, &staff, "Order Shoe", "60.00").await;

    let resp = client
        .post(url("/api/orders"))
        .bearer_auth(&customer.token)
        .json(&json!({
            "userId": customer.user_id,
            "orderAddress": shipping(),
            "totalAmount": "120.00",
            "paymentMethod": "CARD",
            "cardLastFour": "4242",
            "items": [{
                "productId": product["id"],
                "quantity": 2,
                "size": "42",
                "price": "60.00",
            }],
        }))
        .send()
        .await
        .expect("place order");
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("json");
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(order["orderAddress"]["city"], "Portland");
    let order_id = order["id"].as_i64().expect("id");

    let resp = client
        .patch(url(&format!("/api/orders/{order_id}/status")))
        .bearer_auth(&customer.token)
        .json(&json!({ "status": "SHIPPED" }))
        .send()
        .await
        .expect("customer status change");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .patch(url(&format!("/api/orders/{order_id}/status")))
        .bearer_auth(&staff)
        .json(&json!({ "status": "LOST" }))
        .send()
        .await
        .expect("bad status");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .patch(url(&format!("/api/orders/{order_id}/status")))
        .bearer_auth(&staff)
        .json(&json!({ "status": "DELIVERED" }))
        .send()
        .await
        .expect("deliver");
    assert_eq!(resp.status(), StatusCode::OK);
    let delivered: Value = resp.json().await.expect("json");
    assert_eq!(delivered["status"], "DELIVERED");

    let mine: Value = client
        .get(url(&format!("/api/orders/user/{}", customer.user_id)))
        .bearer_auth(&customer.token)
        .send()
        .await
        .expect("my orders")
        .json()
        .await
        .expect("json");
    assert_eq!(mine[0]["id"].as_i64(), Some(order_id));
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_order_validation() {
    let client = client();
    let customer = register_customer(&client).await;
    let other = register_customer(&client).await;

    let resp = client
        .post(url("/api/orders"))
        .bearer_auth(&customer.token)
        .json(&json!({
            "userId": customer.user_id,
            "orderAddress": shipping(),
            "totalAmount": "0.00",
            "items": [],
        }))
        .send()
        .await
        .expect("empty order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(url("/api/orders"))
        .bearer_auth(&customer.token)
        .json(&json!({
            "userId": other.user_id,
            "orderAddress": shipping(),
            "totalAmount": "10.00",
            "items": [{ "productId": 1, "quantity": 1, "price": "10.00" }],
        }))
        .send()
        .await
        .expect("order for someone else");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_finance_endpoints() {
    let client = client();
    let staff = staff_token(&client).await;

    let resp = client
        .get(url("/api/finances/overview"))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("overview");
    assert_eq!(resp.status(), StatusCode::OK);
    let overview: Value = resp.json().await.expect("json");
    assert!(overview.get("recentTransactions").is_some());

    let resp = client
        .get(url("/api/finances/transactions?limit=500"))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("transactions");
    assert_eq!(resp.status(), StatusCode::OK);
    let transactions: Value = resp.json().await.expect("json");
    assert!(transactions.as_array().map_or(0, Vec::len) <= 100);

    let resp = client
        .get(url(
            "/api/finances/metrics?startDate=2024-02-01&endDate=2024-01-01",
        ))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("metrics");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let customer = register_customer(&client).await;
    let resp = client
        .get(url("/api/finances/overview"))
        .bearer_auth(&customer.token)
        .send()
        .await
        .expect("customer overview");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
