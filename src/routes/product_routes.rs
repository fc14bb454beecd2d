use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::entities::{
    color_variant,
    product::{self, Entity as ProductEntity, Gender},
    size_variant,
    user::Role,
};
use crate::middleware::auth::{auth_middleware, AuthState, Claims};

//ROUTERS
pub fn product_routes() -> Router {
    Router::new()
        .route("/product", get(get_products))
        .route("/product/:id", get(get_product))
}

pub fn seller_product_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/product", post(create_product))
        .route("/product/:id", patch(patch_product).delete(delete_product))
        .route("/stock", patch(patch_stock))
        .layer(axum::middleware::from_fn_with_state(
            AuthState {
                db,
                role: Role::Seller,
            },
            auth_middleware,
        ))
}

//ROUTES
async fn get_products(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(query): Query<ProductsQuery>,
) -> impl IntoResponse {
    let mut condition = Condition::all()
        .add(product::Column::IsDeleted.eq(false))
        .add(product::Column::IsArchived.eq(false));

    if let Some(category) = query.category {
        condition = condition.add(product::Column::Category.eq(category));
    }
    if let Some(sub_category) = query.sub_category {
        condition = condition.add(product::Column::SubCategory.eq(sub_category));
    }
    if let Some(gender) = query.gender {
        condition = condition.add(product::Column::Gender.eq(gender));
    }
    if let Some(search) = query.search {
        condition = condition.add(product::Column::Title.contains(search));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(product::Column::SellingPrice.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(product::Column::SellingPrice.lte(max_price));
    }

    match ProductEntity::find()
        .filter(condition)
        .order_by_asc(product::Column::Id)
        .all(&*db)
        .await
    {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error."
            })),
        )
            .into_response(),
    }
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    let product = match ProductEntity::find_by_id(id)
        .filter(product::Column::IsDeleted.eq(false))
        .one(&*db)
        .await
    {
        Ok(Some(product)) => product,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No product with {} id was found", id)
                })),
            )
                .into_response();
        }
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

    let variants = match color_variant::Entity::find()
        .filter(color_variant::Column::ProductId.eq(product.id))
        .filter(color_variant::Column::IsArchived.eq(false))
        .order_by_asc(color_variant::Column::Id)
        .all(&*db)
        .await
    {
        Ok(variants) => variants,
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

    let mut variants_json = Vec::with_capacity(variants.len());
    for variant in variants {
        let sizes = match size_variant::Entity::find()
            .filter(size_variant::Column::ColorVariantId.eq(variant.id))
            .order_by_asc(size_variant::Column::Id)
            .all(&*db)
            .await
        {
            Ok(sizes) => sizes,
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
        variants_json.push(json!({
            "variant": variant,
            "sizes": sizes,
        }));
    }

    (
        StatusCode::OK,
        Json(json!({
            "product": product,
            "variants": variants_json,
        })),
    )
        .into_response()
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProduct>,
) -> impl IntoResponse {
    debug!("->> Called `create_product()` with title `{}`", payload.title);

    if payload.selling_price <= 0.0 || payload.mrp <= 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Prices should be greater than 0"
            })),
        );
    }
    if payload
        .variants
        .iter()
        .flat_map(|variant| variant.sizes.iter())
        .any(|size| size.stock < 0)
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Stock cannot be negative"
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

    let new_product = product::ActiveModel {
        title: Set(payload.title.clone()),
        slug: Set(slugify(&payload.title)),
        category: Set(payload.category),
        sub_category: Set(payload.sub_category),
        gender: Set(payload.gender),
        mrp: Set(payload.mrp),
        selling_price: Set(payload.selling_price),
        seller_id: Set(claims.user_id),
        is_deleted: Set(false),
        is_archived: Set(false),
        ..Default::default()
    };

    let product = match new_product.insert(&txn).await {
        Ok(product) => product,
        Err(err) => {
            debug!("Product insert failed: {:?}", err);
            let _ = txn.rollback().await;
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "Product with this title already exists"
                })),
            );
        }
    };

    for variant in payload.variants {
        let new_variant = color_variant::ActiveModel {
            product_id: Set(product.id),
            color_name: Set(variant.color_name),
            hex_code: Set(variant.hex_code),
            images: Set(json!(variant.images)),
            is_archived: Set(false),
            ..Default::default()
        };
        let created = match new_variant.insert(&txn).await {
            Ok(created) => created,
            Err(_) => {
                let _ = txn.rollback().await;
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                );
            }
        };

        for size in variant.sizes {
            let new_size = size_variant::ActiveModel {
                color_variant_id: Set(created.id),
                size: Set(size.size),
                sku: Set(size.sku),
                stock: Set(size.stock),
                price_override: Set(size.price_override),
                ..Default::default()
            };
            if let Err(err) = new_size.insert(&txn).await {
                debug!("Size insert failed: {:?}", err);
                let _ = txn.rollback().await;
                return (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": "SKU already exists"
                    })),
                );
            }
        }
    }

    match txn.commit().await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Product created successfully",
                "product_id": product.id
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        ),
    }
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchProduct>,
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

    match ProductEntity::find_by_id(id)
        .filter(product::Column::IsDeleted.eq(false))
        .one(&txn)
        .await
    {
        Ok(Some(found)) => {
            if found.seller_id != claims.user_id {
                return (
                    StatusCode::FORBIDDEN,
                    Json(json!({
                        "error": "You can only edit your own products"
                    })),
                );
            }

            let mut found: product::ActiveModel = found.into();
            if let Some(title) = payload.title {
                if !title.is_empty() {
                    found.slug = Set(slugify(&title));
                    found.title = Set(title);
                }
            }
            if let Some(category) = payload.category {
                found.category = Set(category);
            }
            if let Some(sub_category) = payload.sub_category {
                found.sub_category = Set(sub_category);
            }
            if let Some(gender) = payload.gender {
                found.gender = Set(gender);
            }
            if let Some(mrp) = payload.mrp {
                found.mrp = Set(mrp);
            }
            if let Some(selling_price) = payload.selling_price {
                found.selling_price = Set(selling_price);
            }
            if let Some(is_archived) = payload.is_archived {
                found.is_archived = Set(is_archived);
            }

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
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Failed to patch this resource"
                        })),
                    )
                }
            }
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No product with {} id was found", id)
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

/// Soft delete. Orders snapshot product data, so rows referenced by orders
/// must survive; the flag just hides the product from the storefront.
async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
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

    match ProductEntity::find_by_id(id)
        .filter(product::Column::IsDeleted.eq(false))
        .one(&txn)
        .await
    {
        Ok(Some(found)) => {
            if found.seller_id != claims.user_id {
                return (
                    StatusCode::FORBIDDEN,
                    Json(json!({
                        "error": "You can only delete your own products"
                    })),
                );
            }

            let mut found: product::ActiveModel = found.into();
            found.is_deleted = Set(true);
            match found.update(&txn).await {
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
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No product with {} id was found", id)
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

/// Restock path. Sets the absolute stock level for one SKU; decrements
/// during checkout go through the reconciler instead.
async fn patch_stock(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchStock>,
) -> impl IntoResponse {
    if payload.stock < 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Stock cannot be negative"
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

    let size = match size_variant::Entity::find()
        .filter(size_variant::Column::Sku.eq(&payload.sku))
        .one(&txn)
        .await
    {
        Ok(Some(size)) => size,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No size variant with SKU {} was found", payload.sku)
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

    // Walk up to the product to check ownership.
    let owns = match color_variant::Entity::find_by_id(size.color_variant_id)
        .find_also_related(ProductEntity)
        .one(&txn)
        .await
    {
        Ok(Some((_, Some(product)))) => product.seller_id == claims.user_id,
        Ok(_) => false,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error."
                })),
            );
        }
    };
    if !owns {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "You can only restock your own products"
            })),
        );
    }

    let mut size: size_variant::ActiveModel = size.into();
    size.stock = Set(payload.stock);
    match size.update(&txn).await {
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

//utilities
static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

fn slugify(title: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

//structs
#[derive(Deserialize)]
struct ProductsQuery {
    category: Option<String>,
    sub_category: Option<String>,
    gender: Option<Gender>,
    search: Option<String>,
    min_price: Option<f32>,
    max_price: Option<f32>,
}

#[derive(Deserialize, Clone, Debug)]
struct CreateProduct {
    title: String,
    category: String,
    sub_category: String,
    gender: Gender,
    mrp: f32,
    selling_price: f32,
    variants: Vec<CreateVariant>,
}

#[derive(Deserialize, Clone, Debug)]
struct CreateVariant {
    color_name: String,
    hex_code: String,
    images: Vec<String>,
    sizes: Vec<CreateSize>,
}

#[derive(Deserialize, Clone, Debug)]
struct CreateSize {
    size: String,
    sku: String,
    stock: i32,
    price_override: Option<f32>,
}

#[derive(Deserialize, Clone, Debug)]
struct PatchProduct {
    title: Option<String>,
    category: Option<String>,
    sub_category: Option<String>,
    gender: Option<Gender>,
    mrp: Option<f32>,
    selling_price: Option<f32>,
    is_archived: Option<bool>,
}

#[derive(Deserialize, Clone, Debug)]
struct PatchStock {
    sku: String,
    stock: i32,
}
