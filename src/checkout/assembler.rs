use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::error::CheckoutError;
use crate::checkout::validator::ValidatedItem;
use crate::entities::order::{PaymentMethod, PaymentStatus, Status};

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ShippingAddress {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
}

/// An order ready to be persisted. Pure data, nothing written yet; every
/// item starts out pending.
#[derive(Clone, Debug)]
pub struct OrderDraft {
    pub total_amount: f32,
    pub delivery_charges: f32,
    pub final_amount: f32,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: Status,
    pub order_date: NaiveDateTime,
    pub expected_delivery: NaiveDateTime,
    pub coupon_code: Option<String>,
    pub coupon_discount: Option<f32>,
    pub items: Vec<ValidatedItem>,
}

/// Builds the order draft from validated lines. Construction only; a failure
/// here leaves no trace anywhere (no stock touched, no cart cleared).
pub fn assemble(
    items: Vec<ValidatedItem>,
    total_amount: f32,
    delivery_charges: f32,
    final_amount: f32,
    shipping_address: ShippingAddress,
    payment_method: PaymentMethod,
    coupon_code: Option<String>,
    coupon_discount: Option<f32>,
) -> Result<OrderDraft, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if total_amount <= 0.0 || final_amount <= 0.0 {
        return Err(CheckoutError::InvalidAmount);
    }
    if shipping_address.name.trim().is_empty() || shipping_address.phone.trim().is_empty() {
        return Err(CheckoutError::IncompleteAddress);
    }

    let order_date = Utc::now().naive_utc();

    Ok(OrderDraft {
        total_amount,
        delivery_charges,
        final_amount,
        shipping_address,
        payment_method,
        payment_status: PaymentStatus::Pending,
        status: Status::Pending,
        order_date,
        expected_delivery: order_date + Duration::days(7),
        coupon_code,
        coupon_discount,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Asha Rao".to_string(),
            address: "14 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            phone: "9876543210".to_string(),
        }
    }

    fn item() -> ValidatedItem {
        ValidatedItem {
            product_id: 1,
            seller_id: 2,
            size_variant_id: 1,
            quantity: 2,
            unit_price: 2999.0,
            title: "Velocity Runner".to_string(),
            image: "/image/velocity-runner-black-1.jpg".to_string(),
            size: "UK 7".to_string(),
            color: "Black".to_string(),
        }
    }

    #[test]
    fn builds_pending_order_with_week_long_delivery_window() {
        let draft = assemble(
            vec![item()],
            5998.0,
            0.0,
            5998.0,
            address(),
            PaymentMethod::Cod,
            None,
            None,
        )
        .unwrap();

        assert_eq!(draft.status, Status::Pending);
        assert_eq!(draft.payment_status, PaymentStatus::Pending);
        assert_eq!(draft.expected_delivery - draft.order_date, Duration::days(7));
        assert_eq!(draft.items.len(), 1);
    }

    #[test]
    fn rejects_empty_cart() {
        let result = assemble(
            vec![],
            100.0,
            0.0,
            100.0,
            address(),
            PaymentMethod::Cod,
            None,
            None,
        );
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let result = assemble(
            vec![item()],
            0.0,
            0.0,
            100.0,
            address(),
            PaymentMethod::Cod,
            None,
            None,
        );
        assert!(matches!(result, Err(CheckoutError::InvalidAmount)));

        let result = assemble(
            vec![item()],
            100.0,
            0.0,
            -5.0,
            address(),
            PaymentMethod::Cod,
            None,
            None,
        );
        assert!(matches!(result, Err(CheckoutError::InvalidAmount)));
    }

    #[test]
    fn rejects_address_without_name_or_phone() {
        let mut nameless = address();
        nameless.name = "  ".to_string();
        let result = assemble(
            vec![item()],
            100.0,
            0.0,
            100.0,
            nameless,
            PaymentMethod::Prepaid,
            None,
            None,
        );
        assert!(matches!(result, Err(CheckoutError::IncompleteAddress)));

        let mut phoneless = address();
        phoneless.phone = String::new();
        let result = assemble(
            vec![item()],
            100.0,
            0.0,
            100.0,
            phoneless,
            PaymentMethod::Prepaid,
            None,
            None,
        );
        assert!(matches!(result, Err(CheckoutError::IncompleteAddress)));
    }
}
