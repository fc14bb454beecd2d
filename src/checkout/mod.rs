//! Order placement. One transaction wraps the whole flow: validate the
//! submitted lines against live stock, assemble the order draft, stamp a
//! unique order code, persist the order and its items, decrement stock with
//! conditional updates, clear the cart. Any failure rolls the lot back.

pub mod assembler;
pub mod error;
pub mod order_code;
pub mod reconciler;
pub mod status;
pub mod validator;

pub use error::CheckoutError;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde::Deserialize;

use crate::checkout::assembler::ShippingAddress;
use crate::checkout::validator::ItemRequest;
use crate::entities::{cart, order, order_item};

#[derive(Deserialize, Clone, Debug)]
pub struct CheckoutRequest {
    pub products: Vec<ItemRequest>,
    pub total_amount: f32,
    pub delivery_charges: f32,
    pub final_amount: f32,
    pub shipping_address: ShippingAddress,
    pub payment_method: order::PaymentMethod,
    pub coupon_code: Option<String>,
    pub coupon_discount: Option<f32>,
}

/// Runs the full checkout inside the caller's transaction. The caller
/// commits on `Ok` and rolls back on `Err`; this function never commits.
pub async fn place_order<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    payload: CheckoutRequest,
) -> Result<(order::Model, Vec<order_item::Model>), CheckoutError> {
    let validated = validator::validate_items(conn, &payload.products).await?;

    let draft = assembler::assemble(
        validated,
        payload.total_amount,
        payload.delivery_charges,
        payload.final_amount,
        payload.shipping_address,
        payload.payment_method,
        payload.coupon_code,
        payload.coupon_discount,
    )?;

    // The code column is the only unique column on orders, so a unique
    // violation on this insert is a code collision with a concurrent
    // checkout. Regenerate and try again, bounded.
    let order = order_code::with_unique_code(|code| {
        let attempt = order::ActiveModel {
            order_code: Set(code),
            user_id: Set(user_id),
            total_amount: Set(draft.total_amount),
            delivery_charges: Set(draft.delivery_charges),
            final_amount: Set(draft.final_amount),
            ship_name: Set(draft.shipping_address.name.clone()),
            ship_address: Set(draft.shipping_address.address.clone()),
            ship_city: Set(draft.shipping_address.city.clone()),
            ship_state: Set(draft.shipping_address.state.clone()),
            ship_pincode: Set(draft.shipping_address.pincode.clone()),
            ship_phone: Set(draft.shipping_address.phone.clone()),
            payment_method: Set(draft.payment_method),
            payment_status: Set(draft.payment_status),
            status: Set(draft.status),
            order_date: Set(draft.order_date),
            expected_delivery: Set(draft.expected_delivery),
            tracking_number: Set(None),
            coupon_code: Set(draft.coupon_code.clone()),
            coupon_discount: Set(draft.coupon_discount),
            ..Default::default()
        };
        async move {
            match attempt.insert(conn).await {
                Ok(placed) => Ok(Some(placed)),
                Err(err) if is_code_collision(&err) => Ok(None),
                Err(err) => Err(err.into()),
            }
        }
    })
    .await?;

    let mut items = Vec::with_capacity(draft.items.len());
    for line in &draft.items {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            seller_id: Set(line.seller_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            title: Set(line.title.clone()),
            image: Set(line.image.clone()),
            size: Set(line.size.clone()),
            color: Set(line.color.clone()),
            status: Set(order::Status::Pending),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        items.push(item);
    }

    // Conditional decrements; a conflict here aborts the transaction, so
    // the order above and any earlier decrements all revert together.
    reconciler::apply_decrements(conn, &draft.items).await?;

    // Deleting zero rows is fine; clearing an empty cart is a no-op.
    cart::Entity::delete_many()
        .filter(cart::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    Ok((order, items))
}

fn is_code_collision(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
