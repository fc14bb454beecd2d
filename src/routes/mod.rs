pub mod auth_routes;
pub mod cart_routes;
pub mod order_routes;
pub mod product_routes;
pub mod upload_routes;
pub mod wishlist_routes;

use axum::{middleware, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware::logging::logging_middleware;
use {
    auth_routes::{admin_users_routes, auth_routes},
    cart_routes::cart_routes,
    order_routes::{admin_order_routes, seller_order_routes, user_order_routes},
    product_routes::{product_routes, seller_product_routes},
    upload_routes::{public_image_router, upload_routes},
    wishlist_routes::wishlist_routes,
};

pub fn api_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .merge(auth_routes())
        .nest("/api", product_routes())
        .nest("/api", public_image_router())
        .nest("/api", cart_routes(db.clone()))
        .nest("/api", wishlist_routes(db.clone()))
        .nest("/api", user_order_routes(db.clone()))
        .nest("/api/seller", seller_product_routes(db.clone()))
        .nest("/api/seller", seller_order_routes(db.clone()))
        .nest("/api/seller", upload_routes(db.clone()))
        .nest("/api/admin", admin_users_routes(db.clone()))
        .nest("/api/admin", admin_order_routes(db.clone()))
        .layer(middleware::from_fn(logging_middleware))
        .layer(Extension(db))
}
