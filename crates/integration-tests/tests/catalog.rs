//! Catalog tests: categories, products, images, search and reviews.
//!
//! Run with: `cargo test -p strive-integration-tests -- --ignored`

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use uuid::Uuid;

use strive_integration_tests::{client, create_product, register_customer, staff_token, url};

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_category_tree_and_parent_checks() {
    let client = client();
    let staff = staff_token(&client).await;

    let resp = client
        .post(url("/api/categories"))
        .bearer_auth(&staff)
        .json(&json!({ "name": format!("Root {}", Uuid::new_v4().simple()) }))
        .send()
        .await
        .expect("create root");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let root: Value = resp.json().await.expect("json");
    let root_id = root["id"].as_i64().expect("id");

    let resp = client
        .post(url("/api/categories"))
        .bearer_auth(&staff)
        .json(&json!({ "name": "Child", "parentId": root_id }))
        .send()
        .await
        .expect("create child");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let child: Value = resp.json().await.expect("json");
    let child_id = child["id"].as_i64().expect("id");

    let tree: Value = client
        .get(url("/api/categories"))
        .send()
        .await
        .expect("tree")
        .json()
        .await
        .expect("json");
    let node = tree
        .as_array()
        .expect("array")
        .iter()
        .find(|n| n["id"].as_i64() == Some(root_id))
        .expect("root listed");
    assert_eq!(node["children"][0]["id"].as_i64(), Some(child_id));

    // Moving the root under its own child would detach the subtree.
    let resp = client
        .put(url(&format!("/api/categories/{root_id}")))
        .bearer_auth(&staff)
        .json(&json!({ "name": "Root", "parentId": child_id }))
        .send()
        .await
        .expect("cyclic update");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(url("/api/categories"))
        .bearer_auth(&staff)
        .json(&json!({ "name": "Orphan", "parentId": 999_999_999 }))
        .send()
        .await
        .expect("orphan");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .delete(url(&format!("/api/categories/{root_id}")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("delete");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_customer_cannot_create_category() {
    let client = client();
    let customer = register_customer(&client).await;

    let resp = client
        .post(url("/api/categories"))
        .bearer_auth(&customer.token)
        .json(&json!({ "name": "Nope" }))
        .send()
        .await
        .expect("create");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_product_multipart_images_and_reorder() {
    let client = client();
    let staff = staff_token(&client).await;

    let product = json!({
        "name": "Upload Runner",
        "price": "120.00",
        "stocks": [{ "size": "41", "stock": 2 }],
    });
    let form = Form::new()
        .text("product", product.to_string())
        .part(
            "images",
            Part::bytes(b"first".to_vec())
                .file_name("a.png")
                .mime_str("image/png")
                .expect("mime"),
        )
        .part(
            "images",
            Part::bytes(b"second".to_vec())
                .file_name("b.png")
                .mime_str("image/png")
                .expect("mime"),
        );

    let resp = client
        .post(url("/api/products"))
        .bearer_auth(&staff)
        .multipart(form)
        .send()
        .await
        .expect("create with images");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("json");
    let id = created["id"].as_i64().expect("id");
    let images = created["images"].as_array().expect("images");
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["displayOrder"], 1);

    let first = images[0]["id"].as_i64().expect("image id");
    let second = images[1]["id"].as_i64().expect("image id");
    let resp = client
        .put(url(&format!("/api/products/{id}/images/reorder")))
        .bearer_auth(&staff)
        .json(&json!([second, first]))
        .send()
        .await
        .expect("reorder");
    assert_eq!(resp.status(), StatusCode::OK);
    let reordered: Value = resp.json().await.expect("json");
    assert_eq!(reordered["images"][0]["id"].as_i64(), Some(second));

    let resp = client
        .delete(url(&format!("/api/products/{id}/images/{first}")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("delete image");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .delete(url(&format!("/api/products/{id}")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("delete product");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(url(&format!("/api/products/{id}")))
        .send()
        .await
        .expect("get deleted");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_product_status_and_featured_toggle() {
    let client = client();
    let staff = staff_token(&client).await;
    let product = create_product(&client, &staff, "Status Shoe", "50.00").await;
    let id = product["id"].as_i64().expect("id");

    let resp = client
        .put(url(&format!("/api/products/{id}/status?status=inactive")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("status");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["status"], "INACTIVE");

    let resp = client
        .put(url(&format!("/api/products/{id}/status?status=archived")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("bad status");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let featured: Value = client
        .put(url(&format!("/api/products/{id}/featured")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("feature")
        .json()
        .await
        .expect("json");
    assert_eq!(featured["isFeatured"], true);

    let unfeatured: Value = client
        .put(url(&format!("/api/products/{id}/featured")))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("unfeature")
        .json()
        .await
        .expect("json");
    assert_eq!(unfeatured["isFeatured"], false);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_paginated_search() {
    let client = client();
    let staff = staff_token(&client).await;
    let marker = Uuid::new_v4().simple().to_string();
    for (name, price) in [("Alpha", "10.00"), ("Bravo", "30.00"), ("Charlie", "20.00")] {
        create_product(&client, &staff, &format!("{name} {marker}"), price).await;
    }

    let resp = client
        .get(url(&format!(
            "/api/products/paginated?name={marker}&sort=price-low-high&page=0&size=2"
        )))
        .send()
        .await
        .expect("search");
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = resp.json().await.expect("json");
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);
    let content = page["content"].as_array().expect("content");
    assert_eq!(content.len(), 2);
    assert_eq!(content[0]["price"], "10.00");
    assert_eq!(content[1]["price"], "20.00");

    let resp = client
        .get(url("/api/products/paginated?categoryIds=1,x"))
        .send()
        .await
        .expect("bad filter");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_review_upsert_and_rating() {
    let client = client();
    let staff = staff_token(&client).await;
    let customer = register_customer(&client).await;
    let product = create_product(&client, &staff, "Reviewed Shoe", "75.00").await;
    let product_id = product["id"].as_i64().expect("id");

    let rating: Value = client
        .get(url(&format!("/api/reviews/product/{product_id}/rating")))
        .send()
        .await
        .expect("rating")
        .json()
        .await
        .expect("json");
    assert!(rating.is_null());

    for stars in [2, 4] {
        let resp = client
            .post(url("/api/reviews"))
            .bearer_auth(&customer.token)
            .json(&json!({
                "productId": product_id,
                "userId": customer.user_id,
                "rating": stars,
                "comment": "Fits well",
            }))
            .send()
            .await
            .expect("review");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let reviews: Value = client
        .get(url(&format!("/api/reviews/product/{product_id}")))
        .send()
        .await
        .expect("reviews")
        .json()
        .await
        .expect("json");
    assert_eq!(reviews.as_array().map(Vec::len), Some(1));
    assert_eq!(reviews[0]["rating"], 4);
    assert_eq!(reviews[0]["userName"], "Test Customer");

    let resp = client
        .post(url("/api/reviews"))
        .bearer_auth(&customer.token)
        .json(&json!({
            "productId": product_id,
            "userId": customer.user_id,
            "rating": 6,
        }))
        .send()
        .await
        .expect("bad rating");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
