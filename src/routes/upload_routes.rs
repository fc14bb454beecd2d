use axum::{
    extract::{Multipart, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::entities::user::Role;
use crate::middleware::{
    auth::{auth_middleware, AuthState},
    logging::{to_response, ApiError},
};

//ROUTERS
pub fn public_image_router() -> Router {
    Router::new().route("/image/:file", get(serve_image))
}

pub fn upload_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new().route("/image", post(upload)).layer(
        middleware::from_fn_with_state(
            AuthState {
                db,
                role: Role::Seller,
            },
            auth_middleware,
        ),
    )
}

//ROUTES
/// Streams a stored product image. File names are uuid-with-extension, so a
/// strict pattern check keeps path traversal out.
pub async fn serve_image(Path(file): Path<String>) -> Response {
    if !STORED_NAME_REGEX.is_match(&file) {
        let tmp = "Invalid image name".to_string();
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": tmp
                })),
            ),
            Err(ApiError::General(tmp)),
        );
    }

    let path = format!("./uploads/{}", file);
    let opened = match tokio::fs::File::open(&path).await {
        Ok(opened) => opened,
        Err(err) => {
            return to_response(
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({
                        "error": "Not found"
                    })),
                ),
                Err(ApiError::General(err.to_string())),
            )
        }
    };

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let stream = ReaderStream::new(opened);
    let body = axum::body::Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    to_response((headers, body), Ok(()))
}

/// Accepts one image per request and answers with the url the seller can put
/// into a color variant's image list.
async fn upload(mut multipart: Multipart) -> Response {
    let field = match multipart.next_field().await.unwrap_or(None) {
        Some(field) => field,
        None => {
            let tmp = "No file field in the request";
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": tmp
                    })),
                ),
                Err(ApiError::General(tmp.to_string())),
            );
        }
    };

    let content_type = match field.content_type() {
        Some(content_type) => content_type.to_owned(),
        None => {
            let tmp = "Content type is not set.";
            return to_response(
                (StatusCode::BAD_REQUEST, Json(json!({"error": tmp}))),
                Err(ApiError::General(tmp.to_string())),
            );
        }
    };

    let extension = match allowed_content_types().get(content_type.as_str()) {
        Some(&ext) => ext,
        None => {
            let tmp = "Unsupported content type.";
            return to_response(
                (StatusCode::BAD_REQUEST, Json(json!({"error": tmp}))),
                Err(ApiError::General(tmp.to_string())),
            );
        }
    };

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Failed to read file bytes."
                    })),
                ),
                Err(ApiError::General(format!("Multipart error: {err}"))),
            );
        }
    };
    if data.len() > file_size_limit() {
        let tmp = "Payload too large";
        return to_response(
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "error": tmp
                })),
            ),
            Err(ApiError::General(tmp.to_string())),
        );
    }

    let name = format!("{}.{}", Uuid::new_v4(), extension);
    match tokio::fs::write(format!("./uploads/{}", name), data).await {
        Ok(_) => to_response(
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "File uploaded successfully.",
                    "url": format!("/api/image/{}", name)
                })),
            ),
            Ok(()),
        ),
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to upload file to the server"
                })),
            ),
            Err(ApiError::General(err.to_string())),
        ),
    }
}

//utils
fn allowed_content_types() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("image/jpeg", "jpg"),
        ("image/png", "png"),
        ("image/webp", "webp"),
    ])
}

static STORED_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-f0-9-]{36}\.(jpg|png|webp)$").unwrap());

fn file_size_limit() -> usize {
    dotenvy::dotenv().ok();
    std::env::var("FILE_SIZE_LIMIT")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(5 * 1024 * 1024)
}
