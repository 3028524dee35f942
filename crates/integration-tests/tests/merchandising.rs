//! Banners and featured categories.
//!
//! Run with: `cargo test -p strive-integration-tests -- --ignored`

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use strive_integration_tests::{client, staff_token, url};

fn banner(title: &str) -> Value {
    json!({
        "title": title,
        "subtitle": "Season sale",
        "highlight": "Up to 30% off",
        "icon": "tag",
        "backgroundColor": "#ff6600",
    })
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_banner_lifecycle() {
    let client = client();
    let staff = staff_token(&client).await;

    let resp = client
        .post(url("/api/banners"))
        .bearer_auth(&staff)
        .json(&banner("Spring"))
        .send()
        .await
        .expect("create banner");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("json");
    let id = created["id"].as_i64().expect("id");
    assert!(created["displayOrder"].as_i64().expect("order") >= 1);

    let resp = client
        .patch(url(&format!("/api/banners/{id}/active")))
        .bearer_auth(&staff)
        .json(&json!({ "active": false }))
        .send()
        .await
        .expect("deactivate");
    assert_eq!(resp.status(), StatusCode::OK);

    let active: Value = client
        .get(url("/api/banners/active"))
        .send()
        .await
        .expect("active")
        .json()
        .await
        .expect("json");
    assert!(
        active
            .as_array()
            .expect("array")
            .iter()
            .all(|b| b["id"].as_i64() != Some(id))
    );

    let resp = client
        .patch(url(&format!("/api/banners/{id}/order")))
        .bearer_auth(&staff)
        .json(&json!({ "displayOrder": "1" }))
        .send()
        .await
        .expect("move");
    assert_eq!(resp.status(), StatusCode::OK);
    let moved: Value = resp.json().await.expect("json");
    assert_eq!(moved["displayOrder"], 1);

    let resp = client
        .delete(url(&format!("/api/banners/{id}")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("delete");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(url(&format!("/api/banners/{id}")))
        .send()
        .await
        .expect("get deleted");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(
        body["message"],
        format!("Banner not found with id: {id}")
    );
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_banner_field_limits() {
    let client = client();
    let staff = staff_token(&client).await;

    let resp = client
        .post(url("/api/banners"))
        .bearer_auth(&staff)
        .json(&banner(&"x".repeat(51)))
        .send()
        .await
        .expect("create");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_featured_category_add_step_remove() {
    let client = client();
    let staff = staff_token(&client).await;

    let resp = client
        .post(url("/api/categories"))
        .bearer_auth(&staff)
        .json(&json!({ "name": format!("Featured {}", Uuid::new_v4().simple()) }))
        .send()
        .await
        .expect("category");
    let category: Value = resp.json().await.expect("json");
    let category_id = category["id"].as_i64().expect("id");

    let resp = client
        .post(url("/api/featured-categories"))
        .bearer_auth(&staff)
        .json(&json!({ "categoryId": category_id }))
        .send()
        .await
        .expect("feature");
    if resp.status() == StatusCode::BAD_REQUEST {
        // The list is already full from earlier runs.
        return;
    }
    assert_eq!(resp.status(), StatusCode::CREATED);
    let slot: Value = resp.json().await.expect("json");
    let slot_id = slot["id"].as_i64().expect("id");

    let resp = client
        .post(url("/api/featured-categories"))
        .bearer_auth(&staff)
        .json(&json!({ "categoryId": category_id }))
        .send()
        .await
        .expect("feature again");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .put(url(&format!("/api/featured-categories/{slot_id}/order")))
        .bearer_auth(&staff)
        .json(&json!({ "direction": "sideways" }))
        .send()
        .await
        .expect("bad direction");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .put(url(&format!("/api/featured-categories/{slot_id}/order")))
        .bearer_auth(&staff)
        .json(&json!({ "direction": "up" }))
        .send()
        .await
        .expect("step up");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .delete(url(&format!("/api/featured-categories/{slot_id}")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("remove");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let listed: Value = client
        .get(url("/api/featured-categories"))
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("json");
    let orders: Vec<i64> = listed
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|s| s["displayOrder"].as_i64())
        .collect();
    let dense: Vec<i64> = (1..=i64::try_from(orders.len()).expect("len")).collect();
    assert_eq!(orders, dense);

    client
        .delete(url(&format!("/api/categories/{category_id}")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("cleanup");
}
