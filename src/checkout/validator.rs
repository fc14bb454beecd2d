use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::collections::HashMap;

use crate::checkout::error::CheckoutError;
use crate::entities::{color_variant, product, size_variant};

/// One requested cart line, as submitted by the client.
#[derive(Deserialize, Clone, Debug)]
pub struct ItemRequest {
    pub product_id: i32,
    pub quantity: i32,
    pub size: String,
    pub color: Option<String>,
}

/// A cart line resolved against the live catalog. Carries everything the
/// assembler needs to snapshot and the reconciler needs to decrement.
#[derive(Clone, Debug)]
pub struct ValidatedItem {
    pub product_id: i32,
    pub seller_id: i32,
    pub size_variant_id: i32,
    pub quantity: i32,
    pub unit_price: f32,
    pub title: String,
    pub image: String,
    pub size: String,
    pub color: String,
}

/// Resolves every requested line against the live product rows. Read only;
/// stock is checked against its *current* value, so a line that fit the cart
/// an hour ago can still fail here.
pub async fn validate_items<C: ConnectionTrait>(
    conn: &C,
    requests: &[ItemRequest],
) -> Result<Vec<ValidatedItem>, CheckoutError> {
    let mut validated = Vec::with_capacity(requests.len());

    for request in requests {
        if request.quantity < 1 {
            return Err(CheckoutError::InvalidAmount);
        }

        let product = product::Entity::find_by_id(request.product_id)
            .filter(product::Column::IsDeleted.eq(false))
            .filter(product::Column::IsArchived.eq(false))
            .one(conn)
            .await?
            .ok_or(CheckoutError::ItemNotFound(request.product_id))?;

        let variants = color_variant::Entity::find()
            .filter(color_variant::Column::ProductId.eq(product.id))
            .filter(color_variant::Column::IsArchived.eq(false))
            .order_by_asc(color_variant::Column::Id)
            .all(conn)
            .await?;

        // Lookup keyed by normalized name; unknown or omitted colors fall
        // back to the first variant.
        let by_name: HashMap<String, &color_variant::Model> = variants
            .iter()
            .map(|variant| (variant.color_name.to_lowercase(), variant))
            .collect();
        let variant = request
            .color
            .as_ref()
            .and_then(|name| by_name.get(&name.to_lowercase()).copied())
            .or(variants.first())
            .ok_or(CheckoutError::ItemNotFound(request.product_id))?;

        let size = size_variant::Entity::find()
            .filter(size_variant::Column::ColorVariantId.eq(variant.id))
            .filter(size_variant::Column::Size.eq(&request.size))
            .one(conn)
            .await?
            .ok_or(CheckoutError::ItemNotFound(request.product_id))?;

        if size.stock < request.quantity {
            return Err(CheckoutError::OutOfStock {
                title: product.title.clone(),
                color: variant.color_name.clone(),
                size: size.size.clone(),
                requested: request.quantity,
                available: size.stock,
            });
        }

        let unit_price = match size.price_override {
            Some(price) if price > 0.0 => price,
            _ => product.selling_price,
        };

        validated.push(ValidatedItem {
            product_id: product.id,
            seller_id: product.seller_id,
            size_variant_id: size.id,
            quantity: request.quantity,
            unit_price,
            title: product.title.clone(),
            image: variant.first_image().unwrap_or_default(),
            size: size.size,
            color: variant.color_name.clone(),
        });
    }

    Ok(validated)
}
