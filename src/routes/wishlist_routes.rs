use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::entities::{
    product::{self, Entity as ProductEntity},
    user::Role,
    wishlist::{self, Entity as WishlistEntity},
};
use crate::middleware::auth::{auth_middleware, AuthState, Claims};

//ROUTERS
pub fn wishlist_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/wishlist/:id", axum::routing::delete(remove_from_wishlist))
        .layer(axum::middleware::from_fn_with_state(
            AuthState {
                db,
                role: Role::User,
            },
            auth_middleware,
        ))
}

//ROUTES
async fn get_wishlist(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match WishlistEntity::find()
        .filter(wishlist::Column::UserId.eq(claims.user_id))
        .find_also_related(ProductEntity)
        .all(&*db)
        .await
    {
        Ok(entries) => {
            let body: Vec<serde_json::Value> = entries
                .into_iter()
                .map(|(entry, found)| {
                    json!({
                        "entry": entry,
                        "product": found
                    })
                })
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

async fn add_to_wishlist(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddToWishlist>,
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

    match ProductEntity::find_by_id(payload.product_id)
        .filter(product::Column::IsDeleted.eq(false))
        .one(&txn)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No product with {} id was found", payload.product_id)
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
    }

    let already_there = WishlistEntity::find()
        .filter(wishlist::Column::UserId.eq(claims.user_id))
        .filter(wishlist::Column::ProductId.eq(payload.product_id))
        .one(&txn)
        .await;
    match already_there {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "Product is already in the wishlist"
                })),
            );
        }
        Ok(None) => {}
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            );
        }
    }

    let new_entry = wishlist::ActiveModel {
        user_id: Set(claims.user_id),
        product_id: Set(payload.product_id),
        ..Default::default()
    };
    match WishlistEntity::insert(new_entry).exec(&txn).await {
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
        Err(_) => {
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

async fn remove_from_wishlist(
    Path(id): Path<i32>,
    Extension(claims): Extension<Claims>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    match WishlistEntity::find_by_id(id)
        .filter(wishlist::Column::UserId.eq(claims.user_id))
        .one(&*db)
        .await
    {
        Ok(Some(entry)) => match entry.delete(&*db).await {
            Ok(_) => (
                StatusCode::OK,
                Json(json!({
                    "message": "Resource deleted successfully"
                })),
            ),
            Err(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Failed to delete this resource"
                })),
            ),
        },
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

//structs
#[derive(Deserialize, Clone, Debug)]
struct AddToWishlist {
    product_id: i32,
}
