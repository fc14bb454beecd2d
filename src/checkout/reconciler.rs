use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::checkout::error::CheckoutError;
use crate::checkout::validator::ValidatedItem;
use crate::entities::size_variant;

/// Decrements stock for every order line with a conditional update:
///
///   UPDATE size_variants SET stock = stock - qty
///   WHERE id = ? AND stock >= qty
///
/// Zero affected rows means another checkout got there first. Runs inside
/// the checkout transaction, so one failing line rolls back the whole order
/// together with any decrements already applied. Stock can never go
/// negative.
pub async fn apply_decrements<C: ConnectionTrait>(
    conn: &C,
    items: &[ValidatedItem],
) -> Result<(), CheckoutError> {
    for item in items {
        let result = size_variant::Entity::update_many()
            .col_expr(
                size_variant::Column::Stock,
                Expr::col(size_variant::Column::Stock).sub(item.quantity),
            )
            .filter(size_variant::Column::Id.eq(item.size_variant_id))
            .filter(size_variant::Column::Stock.gte(item.quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let available = size_variant::Entity::find_by_id(item.size_variant_id)
                .one(conn)
                .await?
                .map(|size| size.stock)
                .unwrap_or(0);
            return Err(CheckoutError::OutOfStock {
                title: item.title.clone(),
                color: item.color.clone(),
                size: item.size.clone(),
                requested: item.quantity,
                available,
            });
        }
    }

    Ok(())
}
