use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::checkout::{self, validator, CheckoutError, CheckoutRequest};
use crate::entities::{cart, cart::Entity as CartEntity, user::Role};
use crate::middleware::auth::{auth_middleware, AuthState, Claims};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn cart_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/:id", patch(patch_entry).delete(remove_entry))
        .route("/checkout", post(place_order))
        .layer(axum::middleware::from_fn_with_state(
            AuthState {
                db,
                role: Role::User,
            },
            auth_middleware,
        ))
}

//ROUTES
async fn get_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match CartEntity::find()
        .filter(cart::Column::UserId.eq(claims.user_id))
        .all(&*db)
        .await
    {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

/// Adds a line to the cart, snapshotting price, title and image at add time.
/// An existing line for the same product+color+size just gets its quantity
/// bumped.
async fn add_to_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddToCart>,
) -> impl IntoResponse {
    debug!("->> Called `add_to_cart` with payload: {:?}", payload);

    if payload.quantity < 1 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Quantity should be greater than 0"
            })),
        );
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    // Resolve against the live catalog the same way checkout does, so the
    // snapshot carries the resolved color, price and image.
    let request = validator::ItemRequest {
        product_id: payload.product_id,
        quantity: payload.quantity,
        size: payload.size,
        color: payload.color,
    };
    let resolved = match validator::validate_items(&txn, std::slice::from_ref(&request)).await {
        Ok(mut items) => match items.pop() {
            Some(item) => item,
            None => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                );
            }
        },
        Err(err) => {
            return (err.status_code(), Json(json!({"error": err.to_string()})));
        }
    };

    let existing = CartEntity::find()
        .filter(cart::Column::UserId.eq(claims.user_id))
        .filter(cart::Column::ProductId.eq(resolved.product_id))
        .filter(cart::Column::Color.eq(&resolved.color))
        .filter(cart::Column::Size.eq(&resolved.size))
        .one(&txn)
        .await;

    let result: Result<(), DbErr> = match existing {
        Ok(Some(entry)) => {
            let quantity = entry.quantity + resolved.quantity;
            let mut entry: cart::ActiveModel = entry.into();
            entry.quantity = Set(quantity);
            entry.update(&txn).await.map(|_| ())
        }
        Ok(None) => {
            let new_entry = cart::ActiveModel {
                user_id: Set(claims.user_id),
                product_id: Set(resolved.product_id),
                quantity: Set(resolved.quantity),
                size: Set(resolved.size),
                color: Set(resolved.color),
                unit_price: Set(resolved.unit_price),
                title: Set(resolved.title),
                image: Set(resolved.image),
                ..Default::default()
            };
            CartEntity::insert(new_entry).exec(&txn).await.map(|_| ())
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(_) => match txn.commit().await {
            Ok(_) => (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Added successfully"
                })),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            ),
        },
        Err(err) => {
            debug!("Cart add failed: {:?}", err);
            let _ = txn.rollback().await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            )
        }
    }
}

async fn patch_entry(
    Path(id): Path<i32>,
    Extension(claims): Extension<Claims>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchCart>,
) -> impl IntoResponse {
    // u32 on the wire so negatives are rejected by deserialization; the
    // upper half of that range does not fit the column.
    let quantity = match i32::try_from(payload.quantity) {
        Ok(quantity) => quantity,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Quantity is out of range"
                })),
            );
        }
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    match CartEntity::find_by_id(id)
        .filter(cart::Column::UserId.eq(claims.user_id))
        .one(&txn)
        .await
    {
        Ok(Some(entry)) => {
            let mut entry: cart::ActiveModel = entry.into();

            let result: Result<(), DbErr> = match quantity {
                0 => entry.delete(&txn).await.map(|_| ()),
                quantity => {
                    entry.quantity = Set(quantity);
                    entry.update(&txn).await.map(|_| ())
                }
            };
            match result {
                Ok(_) => {
                    let _ = txn.commit().await;
                    (
                        StatusCode::OK,
                        Json(json!({
                            "message": "Resource patched successfully"
                        })),
                    )
                }
                Err(_) => {
                    let _ = txn.rollback().await;
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Failed to patch this resource"
                        })),
                    )
                }
            }
        }
        Ok(None) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("No related entry with {} id was found.", id)
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        ),
    }
}

async fn remove_entry(
    Path(id): Path<i32>,
    Extension(claims): Extension<Claims>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    match CartEntity::find_by_id(id)
        .filter(cart::Column::UserId.eq(claims.user_id))
        .one(&txn)
        .await
    {
        Ok(Some(entry)) => {
            let entry: cart::ActiveModel = entry.into();
            match entry.delete(&txn).await {
                Ok(_) => {
                    let _ = txn.commit().await;
                    (
                        StatusCode::OK,
                        Json(json!({
                            "message": "Resource deleted successfully"
                        })),
                    )
                }
                Err(_) => {
                    let _ = txn.rollback().await;
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Failed to delete this resource"
                        })),
                    )
                }
            }
        }
        Ok(None) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("No related entry with {} id was found.", id)
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        ),
    }
}

/// Clears the whole cart. Clearing an already empty cart succeeds with
/// nothing to do.
async fn clear_cart(
    Extension(claims): Extension<Claims>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    match CartEntity::delete_many()
        .filter(cart::Column::UserId.eq(claims.user_id))
        .exec(&*db)
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({
                "message": "Cart cleared",
                "removed": result.rows_affected
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        ),
    }
}

/// Checkout. Everything runs in one transaction; on any error the stock
/// decrements, the order rows and the cart all stay untouched.
async fn place_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CheckoutRequest>,
) -> Response {
    debug!(
        "->> Called `place_order` for user {} with {} lines",
        claims.user_id,
        payload.products.len()
    );

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    match checkout::place_order(&txn, claims.user_id, payload).await {
        Ok((order, items)) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "message": "Order placed successfully",
                        "order": order,
                        "items": items
                    })),
                ),
                Ok(()),
            ),
            Err(err) => to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            ),
        },
        Err(err) => {
            debug!("Checkout failed: {err}");
            let _ = txn.rollback().await;
            let detail = match &err {
                CheckoutError::Db(db_err) => ApiError::DbError(db_err.to_string()),
                _ => ApiError::General(err.to_string()),
            };
            to_response(
                (
                    err.status_code(),
                    Json(json!({
                        "error": err.to_string()
                    })),
                ),
                Err(detail),
            )
        }
    }
}

//structs
#[derive(Deserialize, Debug)]
struct AddToCart {
    product_id: i32,
    quantity: i32,
    size: String,
    color: Option<String>,
}

#[derive(Deserialize)]
struct PatchCart {
    quantity: u32,
}
