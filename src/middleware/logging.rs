use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{error, info};

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();
    match response.extensions().get::<Result<(), ApiError>>() {
        Some(Ok(_)) | None => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
        Some(Err(value)) => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value.to_string(),
            "Failed to process request"
        ),
    }

    response
}

#[derive(Clone, Debug)]
pub enum ApiError {
    TransactionCreationFailed,
    General(String),
    DbError(String),
}

impl ToString for ApiError {
    fn to_string(&self) -> String {
        match self {
            ApiError::TransactionCreationFailed => "Failed to create transaction".into(),
            ApiError::General(value) => value.clone(),
            ApiError::DbError(value) => format!("Database error: {value}"),
        }
    }
}

pub fn to_response<T: IntoResponse>(
    response: T,               //The response that we are sending + StatusCode
    ext: Result<(), ApiError>, //The extension, that we want to give logging middleware
) -> Response {
    let mut response = response.into_response();

    response.extensions_mut().insert(ext);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_carries_the_failure_text() {
        assert_eq!(
            ApiError::TransactionCreationFailed.to_string(),
            "Failed to create transaction"
        );
        assert_eq!(ApiError::General("no such file".into()).to_string(), "no such file");
        assert_eq!(
            ApiError::DbError("constraint failed".into()).to_string(),
            "Database error: constraint failed"
        );
    }

    #[test]
    fn to_response_attaches_the_extension() {
        let response = to_response(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Err(ApiError::TransactionCreationFailed),
        );
        let ext = response
            .extensions()
            .get::<Result<(), ApiError>>()
            .expect("extension missing");
        assert!(matches!(ext, Err(ApiError::TransactionCreationFailed)));
    }
}
