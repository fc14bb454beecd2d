mod common;

use common::BASE_URL;
use reqwest::StatusCode;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

#[tokio::test]
async fn test_login_returns_token() {
    let client = reqwest::Client::new();

    let login_response = client
        .post(format!("{BASE_URL}/login"))
        .json(&json!({
            "username": "user",
            "password": "Secret15"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(login_response.status(), StatusCode::OK);

    let body = login_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login response JSON");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_rejected() {
    let client = reqwest::Client::new();

    let login_response = client
        .post(format!("{BASE_URL}/login"))
        .json(&json!({
            "username": "user",
            "password": "NotTheSeedPassword"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(login_response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_new_user() {
    let client = reqwest::Client::new();

    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock went backwards")
        .as_nanos();
    let username = format!("shopper_{}", suffix % 1_000_000_000);

    let register_response = client
        .post(format!("{BASE_URL}/register"))
        .json(&json!({
            "username": username,
            "password": "Secret15pass"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(register_response.status(), StatusCode::CREATED);

    // The fresh account can log in right away.
    let login_response = client
        .post(format!("{BASE_URL}/login"))
        .json(&json!({
            "username": username,
            "password": "Secret15pass"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(login_response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_with_short_password_is_rejected() {
    let client = reqwest::Client::new();

    let register_response = client
        .post(format!("{BASE_URL}/register"))
        .json(&json!({
            "username": "short_pw_user",
            "password": "abc"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(register_response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{BASE_URL}/api/cart"))
        .send()
        .await
        .expect("Failed to send get cart request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
