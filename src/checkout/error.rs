use axum::http::StatusCode;
use sea_orm::DbErr;
use thiserror::Error;

/// Everything that can go wrong between "cart submitted" and "order
/// committed". Validation variants are caller errors; the rest map to 5xx.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Product with id {0} was not found")]
    ItemNotFound(i32),
    #[error("Not enough stock for \"{title}\" ({color}, {size}): requested {requested}, available {available}")]
    OutOfStock {
        title: String,
        color: String,
        size: String,
        requested: i32,
        available: i32,
    },
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Order amount must be greater than 0")]
    InvalidAmount,
    #[error("Shipping address must include a name and a phone number")]
    IncompleteAddress,
    #[error("Failed to generate a unique order code")]
    DuplicateIdentifier,
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl CheckoutError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ItemNotFound(_) => StatusCode::NOT_FOUND,
            Self::OutOfStock { .. } => StatusCode::CONFLICT,
            Self::EmptyCart | Self::InvalidAmount | Self::IncompleteAddress => {
                StatusCode::BAD_REQUEST
            }
            Self::DuplicateIdentifier | Self::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
