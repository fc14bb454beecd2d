use reqwest::header;
use reqwest::StatusCode;
use serde_json::json;

pub const BASE_URL: &str = "http://127.0.0.1:3000";

/// Logs in one of the seeded accounts ("user", "seller", "admin", all with
/// the seed password) and returns a ready-to-use Authorization header map.
pub async fn login(client: &reqwest::Client, username: &str) -> header::HeaderMap {
    let login_payload = json!({
        "username": username,
        "password": "Secret15"
    });

    let login_response = client
        .post(format!("{BASE_URL}/login"))
        .json(&login_payload)
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(login_response.status(), StatusCode::OK);

    let login_body = login_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login response JSON");

    let token = login_body["token"]
        .as_str()
        .expect("Token not found in login response");

    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token))
            .expect("Failed to create Authorization header"),
    );
    headers
}

/// Reads the current stock of one SKU through the public product detail
/// endpoint.
pub async fn stock_of(client: &reqwest::Client, product_id: i32, sku: &str) -> i64 {
    let response = client
        .get(format!("{BASE_URL}/api/product/{product_id}"))
        .send()
        .await
        .expect("Failed to fetch product detail");
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse product detail JSON");

    body["variants"]
        .as_array()
        .expect("variants should be an array")
        .iter()
        .flat_map(|variant| {
            variant["sizes"]
                .as_array()
                .expect("sizes should be an array")
        })
        .find(|size| size["sku"].as_str() == Some(sku))
        .and_then(|size| size["stock"].as_i64())
        .unwrap_or_else(|| panic!("SKU {sku} not found on product {product_id}"))
}
