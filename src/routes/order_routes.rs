use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::checkout::status::{derive_order_status, transition_allowed};
use crate::entities::{
    order::{self, Entity as OrderEntity, Status},
    order_item::{self, Entity as OrderItemEntity},
    user::Role,
};
use crate::middleware::auth::{auth_middleware, AuthState, Claims};

//ROUTERS
pub fn user_order_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/orders", get(get_own_orders))
        .route("/order/:code", get(get_own_order))
        .layer(axum::middleware::from_fn_with_state(
            AuthState {
                db,
                role: Role::User,
            },
            auth_middleware,
        ))
}

pub fn seller_order_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/orders", get(get_seller_orders))
        .route("/order/status", put(update_item_status))
        .route("/order/tracking", put(update_tracking))
        .layer(axum::middleware::from_fn_with_state(
            AuthState {
                db,
                role: Role::Seller,
            },
            auth_middleware,
        ))
}

pub fn admin_order_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/orders", get(get_all_orders))
        .layer(axum::middleware::from_fn_with_state(
            AuthState {
                db,
                role: Role::Admin,
            },
            auth_middleware,
        ))
}

//ROUTES
async fn get_own_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let orders = match OrderEntity::find()
        .filter(order::Column::UserId.eq(claims.user_id))
        .order_by_desc(order::Column::Id)
        .all(&*db)
        .await
    {
        Ok(orders) => orders,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            )
                .into_response();
        }
    };

    match attach_items(&db, orders).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

async fn get_own_order(
    Path(code): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match OrderEntity::find()
        .filter(order::Column::OrderCode.eq(&code))
        .filter(order::Column::UserId.eq(claims.user_id))
        .one(&*db)
        .await
    {
        Ok(Some(found)) => {
            let items = match OrderItemEntity::find()
                .filter(order_item::Column::OrderId.eq(found.id))
                .all(&*db)
                .await
            {
                Ok(items) => items,
                Err(_) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "Internal server error."
                        })),
                    )
                        .into_response();
                }
            };
            (
                StatusCode::OK,
                Json(json!({
                    "order": found,
                    "items": items
                })),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No order with code {} was found", code)
            })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

/// Orders that contain at least one of the caller's line items; each order
/// is returned with only the caller's items.
async fn get_seller_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let items = match OrderItemEntity::find()
        .filter(order_item::Column::SellerId.eq(claims.user_id))
        .all(&*db)
        .await
    {
        Ok(items) => items,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            )
                .into_response();
        }
    };

    let mut by_order: HashMap<i32, Vec<order_item::Model>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }

    let order_ids: Vec<i32> = by_order.keys().copied().collect();
    let orders = match OrderEntity::find()
        .filter(order::Column::Id.is_in(order_ids))
        .order_by_desc(order::Column::Id)
        .all(&*db)
        .await
    {
        Ok(orders) => orders,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            )
                .into_response();
        }
    };

    let body: Vec<serde_json::Value> = orders
        .into_iter()
        .map(|found| {
            let items = by_order.remove(&found.id).unwrap_or_default();
            json!({
                "order": found,
                "items": items
            })
        })
        .collect();

    (StatusCode::OK, Json(body)).into_response()
}

/// Seller advances one line item. The order level status is recomputed from
/// all items afterwards; it is never set directly.
async fn update_item_status(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateItemStatus>,
) -> impl IntoResponse {
    debug!(
        "->> Called `update_item_status` on order {} product {}",
        payload.order_code, payload.product_id
    );

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

    let found = match OrderEntity::find()
        .filter(order::Column::OrderCode.eq(&payload.order_code))
        .one(&txn)
        .await
    {
        Ok(Some(found)) => found,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No order with code {} was found", payload.order_code)
                })),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            );
        }
    };

    let items = match OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(found.id))
        .order_by_asc(order_item::Column::Id)
        .all(&txn)
        .await
    {
        Ok(items) => items,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            );
        }
    };

    let target = match items
        .iter()
        .find(|item| item.product_id == payload.product_id)
    {
        Some(target) => target.clone(),
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!(
                        "No line item for product {} in this order",
                        payload.product_id
                    )
                })),
            );
        }
    };

    if target.seller_id != claims.user_id {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "You can only update your own line items"
            })),
        );
    }

    if !transition_allowed(target.status, payload.status) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!(
                    "Cannot move item from {} to {}",
                    target.status.to_string(),
                    payload.status.to_string()
                )
            })),
        );
    }

    let statuses: Vec<Status> = items
        .iter()
        .map(|item| {
            if item.id == target.id {
                payload.status
            } else {
                item.status
            }
        })
        .collect();
    let derived = match derive_order_status(&statuses) {
        Some(derived) => derived,
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            );
        }
    };

    let mut target: order_item::ActiveModel = target.into();
    target.status = Set(payload.status);
    if let Err(err) = target.update(&txn).await {
        debug!("Item status update failed: {:?}", err);
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        );
    }

    let mut found: order::ActiveModel = found.into();
    found.status = Set(derived);
    match found.update(&txn).await {
        Ok(updated) => match txn.commit().await {
            Ok(_) => (
                StatusCode::OK,
                Json(json!({
                    "message": "Resource patched successfully",
                    "item_status": payload.status,
                    "order_status": updated.status
                })),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            ),
        },
        Err(_) => {
            let _ = txn.rollback().await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            )
        }
    }
}

async fn update_tracking(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateTracking>,
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

    let found = match OrderEntity::find()
        .filter(order::Column::OrderCode.eq(&payload.order_code))
        .one(&txn)
        .await
    {
        Ok(Some(found)) => found,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No order with code {} was found", payload.order_code)
                })),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            );
        }
    };

    let owns_item = match OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(found.id))
        .filter(order_item::Column::SellerId.eq(claims.user_id))
        .one(&txn)
        .await
    {
        Ok(item) => item.is_some(),
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            );
        }
    };
    if !owns_item {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "You have no line items in this order"
            })),
        );
    }

    let mut found: order::ActiveModel = found.into();
    found.tracking_number = Set(Some(payload.tracking_number));
    match found.update(&txn).await {
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
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            )
        }
    }
}

async fn get_all_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    let orders = match OrderEntity::find()
        .order_by_desc(order::Column::Id)
        .all(&*db)
        .await
    {
        Ok(orders) => orders,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            )
                .into_response();
        }
    };

    match attach_items(&db, orders).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

//utilities
/// Batch fetches line items for a page of orders and zips them together.
async fn attach_items(
    db: &DatabaseConnection,
    orders: Vec<order::Model>,
) -> Result<Vec<serde_json::Value>, sea_orm::DbErr> {
    let order_ids: Vec<i32> = orders.iter().map(|found| found.id).collect();
    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;

    let mut by_order: HashMap<i32, Vec<order_item::Model>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|found| {
            let items = by_order.remove(&found.id).unwrap_or_default();
            json!({
                "order": found,
                "items": items
            })
        })
        .collect())
}

//structs
#[derive(Deserialize, Clone, Debug)]
struct UpdateItemStatus {
    order_code: String,
    product_id: i32,
    status: Status,
}

#[derive(Deserialize, Clone, Debug)]
struct UpdateTracking {
    order_code: String,
    tracking_number: String,
}
