mod common;

use common::{login, BASE_URL};
use reqwest::StatusCode;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

#[tokio::test]
async fn test_get_products_lists_catalog() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{BASE_URL}/api/product"))
        .send()
        .await
        .expect("Failed to send get products request");

    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse products JSON");
    let products = body.as_array().expect("Products should be an array");
    assert!(products.len() >= 2);
}

#[tokio::test]
async fn test_category_filter_narrows_results() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{BASE_URL}/api/product?category=Sneakers"))
        .send()
        .await
        .expect("Failed to send filtered request");

    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse products JSON");
    let products = body.as_array().expect("Products should be an array");
    assert!(!products.is_empty());
    assert!(products
        .iter()
        .all(|product| product["category"].as_str() == Some("Sneakers")));
}

#[tokio::test]
async fn test_search_matches_title() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{BASE_URL}/api/product?search=Velocity"))
        .send()
        .await
        .expect("Failed to send search request");

    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse products JSON");
    let products = body.as_array().expect("Products should be an array");
    assert!(products
        .iter()
        .any(|product| product["title"].as_str() == Some("Velocity Runner")));
}

#[tokio::test]
async fn test_price_filter_excludes_expensive_products() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{BASE_URL}/api/product?max_price=2000"))
        .send()
        .await
        .expect("Failed to send filtered request");

    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse products JSON");
    let products = body.as_array().expect("Products should be an array");
    assert!(products
        .iter()
        .all(|product| product["selling_price"].as_f64().unwrap_or(f64::MAX) <= 2000.0));
}

#[tokio::test]
async fn test_product_detail_includes_variant_matrix() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{BASE_URL}/api/product/1"))
        .send()
        .await
        .expect("Failed to send product detail request");

    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse product detail JSON");
    assert_eq!(body["product"]["slug"].as_str(), Some("velocity-runner"));

    let variants = body["variants"].as_array().expect("variants missing");
    assert!(variants.len() >= 2);
    let first_sizes = variants[0]["sizes"].as_array().expect("sizes missing");
    assert!(!first_sizes.is_empty());
    assert!(first_sizes[0]["sku"].is_string());
}

#[tokio::test]
async fn test_create_product_requires_seller_role() {
    let client = reqwest::Client::new();

    let payload = json!({
        "title": "Unauthorized Boot",
        "category": "Boots",
        "sub_category": "Hiking",
        "gender": "men",
        "mrp": 5999.0,
        "selling_price": 4499.0,
        "variants": []
    });

    // No token at all.
    let response = client
        .post(format!("{BASE_URL}/api/seller/product"))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Customer token is not enough.
    let headers = login(&client, "user").await;
    let response = client
        .post(format!("{BASE_URL}/api/seller/product"))
        .headers(headers)
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_seller_creates_product_with_variants() {
    let client = reqwest::Client::new();
    let headers = login(&client, "seller").await;

    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock went backwards")
        .as_nanos()
        % 1_000_000_000;

    let payload = json!({
        "title": format!("Trail Strider {suffix}"),
        "category": "Sneakers",
        "sub_category": "Trail",
        "gender": "unisex",
        "mrp": 6999.0,
        "selling_price": 5499.0,
        "variants": [
            {
                "color_name": "Olive",
                "hex_code": "#556B2F",
                "images": ["/api/image/placeholder.jpg"],
                "sizes": [
                    { "size": "UK 9", "sku": format!("TS-OLV-UK9-{suffix}"), "stock": 7 },
                    { "size": "UK 10", "sku": format!("TS-OLV-UK10-{suffix}"), "stock": 3, "price_override": 5299.0 }
                ]
            }
        ]
    });

    let response = client
        .post(format!("{BASE_URL}/api/seller/product"))
        .headers(headers)
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create response JSON");
    let product_id = body["product_id"].as_i64().expect("product_id missing");

    let detail = client
        .get(format!("{BASE_URL}/api/product/{product_id}"))
        .send()
        .await
        .expect("Failed to fetch created product");
    assert_eq!(detail.status(), StatusCode::OK);

    let detail = detail
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse created product JSON");
    let variants = detail["variants"].as_array().expect("variants missing");
    assert_eq!(variants.len(), 1);
    assert_eq!(
        variants[0]["sizes"]
            .as_array()
            .expect("sizes missing")
            .len(),
        2
    );
}
