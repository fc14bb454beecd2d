mod common;

use common::{login, stock_of, BASE_URL};
use reqwest::StatusCode;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

fn shipping_address() -> serde_json::Value {
    json!({
        "name": "Asha Rao",
        "address": "14 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "pincode": "560001",
        "phone": "9876543210"
    })
}

#[tokio::test]
async fn test_checkout_decrements_stock_and_creates_pending_order() {
    let client = reqwest::Client::new();
    let headers = login(&client, "user").await;

    let stock_before = stock_of(&client, 1, "VR-BLK-UK7").await;
    assert!(stock_before >= 2, "seed stock too low for this test");

    let response = client
        .post(format!("{BASE_URL}/api/checkout"))
        .headers(headers)
        .json(&json!({
            "products": [
                { "product_id": 1, "quantity": 2, "size": "UK 7", "color": "Black" }
            ],
            "total_amount": 5998.0,
            "delivery_charges": 0.0,
            "final_amount": 5998.0,
            "shipping_address": shipping_address(),
            "payment_method": "cod"
        }))
        .send()
        .await
        .expect("Failed to send checkout request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse checkout response JSON");

    let order = &body["order"];
    let code = order["order_code"].as_str().expect("order_code missing");
    assert!(code.starts_with("ORD-"));
    assert_eq!(order["status"].as_str(), Some("pending"));

    let items = body["items"].as_array().expect("items missing");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"].as_str(), Some("pending"));
    assert_eq!(items[0]["color"].as_str(), Some("Black"));
    assert_eq!(items[0]["size"].as_str(), Some("UK 7"));

    let stock_after = stock_of(&client, 1, "VR-BLK-UK7").await;
    assert_eq!(stock_after, stock_before - 2);
}

#[tokio::test]
async fn test_checkout_with_insufficient_stock_leaves_no_trace() {
    let client = reqwest::Client::new();
    let headers = login(&client, "user").await;

    // The seeded White / UK 7 size has zero stock.
    let stock_before = stock_of(&client, 1, "VR-WHT-UK7").await;

    let response = client
        .post(format!("{BASE_URL}/api/checkout"))
        .headers(headers.clone())
        .json(&json!({
            "products": [
                { "product_id": 1, "quantity": 1, "size": "UK 7", "color": "White" }
            ],
            "total_amount": 2999.0,
            "delivery_charges": 0.0,
            "final_amount": 2999.0,
            "shipping_address": shipping_address(),
            "payment_method": "cod"
        }))
        .send()
        .await
        .expect("Failed to send checkout request");

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let stock_after = stock_of(&client, 1, "VR-WHT-UK7").await;
    assert_eq!(stock_after, stock_before);

    // No order ended up with a White line item.
    let orders = client
        .get(format!("{BASE_URL}/api/orders"))
        .headers(headers)
        .send()
        .await
        .expect("Failed to fetch orders")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse orders JSON");
    let white_items = orders
        .as_array()
        .expect("Orders should be an array")
        .iter()
        .flat_map(|entry| entry["items"].as_array().cloned().unwrap_or_default())
        .filter(|item| item["color"].as_str() == Some("White"))
        .count();
    assert_eq!(white_items, 0);
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_rejected() {
    let client = reqwest::Client::new();
    let headers = login(&client, "user").await;

    let response = client
        .post(format!("{BASE_URL}/api/checkout"))
        .headers(headers)
        .json(&json!({
            "products": [],
            "total_amount": 100.0,
            "delivery_charges": 0.0,
            "final_amount": 100.0,
            "shipping_address": shipping_address(),
            "payment_method": "cod"
        }))
        .send()
        .await
        .expect("Failed to send checkout request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse checkout response JSON");
    assert_eq!(body["error"].as_str(), Some("Cart is empty"));
}

#[tokio::test]
async fn test_checkout_with_zero_total_is_rejected() {
    let client = reqwest::Client::new();
    let headers = login(&client, "user").await;

    let response = client
        .post(format!("{BASE_URL}/api/checkout"))
        .headers(headers)
        .json(&json!({
            "products": [
                { "product_id": 2, "quantity": 1, "size": "UK 5", "color": "Red" }
            ],
            "total_amount": 0.0,
            "delivery_charges": 0.0,
            "final_amount": 0.0,
            "shipping_address": shipping_address(),
            "payment_method": "cod"
        }))
        .send()
        .await
        .expect("Failed to send checkout request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_without_phone_is_rejected() {
    let client = reqwest::Client::new();
    let headers = login(&client, "user").await;

    let mut address = shipping_address();
    address["phone"] = json!("");

    let response = client
        .post(format!("{BASE_URL}/api/checkout"))
        .headers(headers)
        .json(&json!({
            "products": [
                { "product_id": 2, "quantity": 1, "size": "UK 5", "color": "Red" }
            ],
            "total_amount": 1499.0,
            "delivery_charges": 0.0,
            "final_amount": 1499.0,
            "shipping_address": address,
            "payment_method": "cod"
        }))
        .send()
        .await
        .expect("Failed to send checkout request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_parallel_checkouts_never_oversell() {
    let client = reqwest::Client::new();
    let seller_headers = login(&client, "seller").await;

    // A dedicated product keeps this stampede away from the other tests.
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock went backwards")
        .as_nanos()
        % 1_000_000_000;
    let sku = format!("FP-BLU-UK6-{suffix}");
    let create_response = client
        .post(format!("{BASE_URL}/api/seller/product"))
        .headers(seller_headers)
        .json(&json!({
            "title": format!("Flash Pair {suffix}"),
            "category": "Sneakers",
            "sub_category": "Limited",
            "gender": "unisex",
            "mrp": 2999.0,
            "selling_price": 1999.0,
            "variants": [
                {
                    "color_name": "Blue",
                    "hex_code": "#1F4E9C",
                    "images": ["/api/image/placeholder.jpg"],
                    "sizes": [
                        { "size": "UK 6", "sku": sku.clone(), "stock": 5 }
                    ]
                }
            ]
        }))
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(create_response.status(), StatusCode::CREATED);

    let product_id = create_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create response JSON")["product_id"]
        .as_i64()
        .expect("product_id missing");

    let headers = login(&client, "user").await;
    let payload = json!({
        "products": [
            { "product_id": product_id, "quantity": 2, "size": "UK 6", "color": "Blue" }
        ],
        "total_amount": 3998.0,
        "delivery_charges": 0.0,
        "final_amount": 3998.0,
        "shipping_address": shipping_address(),
        "payment_method": "cod"
    });

    // Ten buyers race for five units in pairs; at most two can win.
    let mut handles = Vec::new();
    for _ in 0..10 {
        let client = client.clone();
        let headers = headers.clone();
        let payload = payload.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(format!("{BASE_URL}/api/checkout"))
                .headers(headers)
                .json(&payload)
                .send()
                .await
                .expect("Failed to send checkout request")
                .status()
        }));
    }

    let mut successes: i64 = 0;
    for handle in handles {
        if handle.await.expect("Checkout task panicked") == StatusCode::CREATED {
            successes += 1;
        }
    }

    assert!(
        successes * 2 <= 5,
        "sold {} units from a stock of 5",
        successes * 2
    );

    let stock_after = stock_of(&client, product_id as i32, &sku).await;
    assert!(stock_after >= 0);
    assert_eq!(stock_after, 5 - successes * 2);
}

#[tokio::test]
async fn test_checkout_falls_back_to_first_variant_for_unknown_color() {
    let client = reqwest::Client::new();
    let headers = login(&client, "user").await;

    let stock_before = stock_of(&client, 2, "LS-RED-UK5").await;
    assert!(stock_before >= 1, "seed stock too low for this test");

    // "Crimson" does not exist; the first (Red) variant is used instead.
    let response = client
        .post(format!("{BASE_URL}/api/checkout"))
        .headers(headers)
        .json(&json!({
            "products": [
                { "product_id": 2, "quantity": 1, "size": "UK 5", "color": "Crimson" }
            ],
            "total_amount": 1499.0,
            "delivery_charges": 0.0,
            "final_amount": 1499.0,
            "shipping_address": shipping_address(),
            "payment_method": "prepaid"
        }))
        .send()
        .await
        .expect("Failed to send checkout request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse checkout response JSON");
    let items = body["items"].as_array().expect("items missing");
    assert_eq!(items[0]["color"].as_str(), Some("Red"));

    let stock_after = stock_of(&client, 2, "LS-RED-UK5").await;
    assert_eq!(stock_after, stock_before - 1);
}
