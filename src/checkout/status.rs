use crate::entities::order::Status;

/// Recomputes the order level status from its item statuses. First matching
/// rule wins:
///
/// 1. all delivered  -> Delivered
/// 2. all cancelled  -> Cancelled
/// 3. any shipped    -> Shipped
/// 4. any confirmed  -> Confirmed
/// 5. otherwise      -> Pending
///
/// Orders always carry at least one item; an empty slice yields `None`.
pub fn derive_order_status(items: &[Status]) -> Option<Status> {
    if items.is_empty() {
        return None;
    }

    let derived = if items.iter().all(|status| *status == Status::Delivered) {
        Status::Delivered
    } else if items.iter().all(|status| *status == Status::Cancelled) {
        Status::Cancelled
    } else if items.iter().any(|status| *status == Status::Shipped) {
        Status::Shipped
    } else if items.iter().any(|status| *status == Status::Confirmed) {
        Status::Confirmed
    } else {
        Status::Pending
    };

    Some(derived)
}

/// Seller-driven item transitions. Delivered and Cancelled are terminal.
pub fn transition_allowed(from: Status, to: Status) -> bool {
    matches!(
        (from, to),
        (Status::Pending, Status::Confirmed)
            | (Status::Confirmed, Status::Shipped)
            | (Status::Shipped, Status::Delivered)
            | (Status::Pending, Status::Cancelled)
            | (Status::Confirmed, Status::Cancelled)
            | (Status::Shipped, Status::Cancelled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use Status::*;

    #[test]
    fn single_item_order_mirrors_its_item() {
        assert_eq!(derive_order_status(&[Pending]), Some(Pending));
        assert_eq!(derive_order_status(&[Confirmed]), Some(Confirmed));
        assert_eq!(derive_order_status(&[Shipped]), Some(Shipped));
        assert_eq!(derive_order_status(&[Delivered]), Some(Delivered));
        assert_eq!(derive_order_status(&[Cancelled]), Some(Cancelled));
    }

    #[test]
    fn all_delivered_wins_over_everything() {
        assert_eq!(
            derive_order_status(&[Delivered, Delivered, Delivered]),
            Some(Delivered)
        );
    }

    #[test]
    fn all_cancelled_resolves_to_cancelled() {
        assert_eq!(derive_order_status(&[Cancelled, Cancelled]), Some(Cancelled));
    }

    #[test]
    fn any_shipped_beats_confirmed_and_pending() {
        assert_eq!(
            derive_order_status(&[Pending, Shipped, Confirmed]),
            Some(Shipped)
        );
        assert_eq!(derive_order_status(&[Shipped, Delivered]), Some(Shipped));
    }

    #[test]
    fn confirmed_beats_pending() {
        assert_eq!(derive_order_status(&[Pending, Confirmed]), Some(Confirmed));
    }

    #[test]
    fn delivered_plus_cancelled_falls_through_to_pending() {
        // Neither "all delivered" nor "all cancelled" nor "any shipped"
        // matches, and nothing is confirmed.
        assert_eq!(derive_order_status(&[Delivered, Cancelled]), Some(Pending));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(derive_order_status(&[]), None);
    }

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(transition_allowed(Pending, Confirmed));
        assert!(transition_allowed(Confirmed, Shipped));
        assert!(transition_allowed(Shipped, Delivered));
    }

    #[test]
    fn cancellation_is_allowed_until_delivery() {
        assert!(transition_allowed(Pending, Cancelled));
        assert!(transition_allowed(Confirmed, Cancelled));
        assert!(transition_allowed(Shipped, Cancelled));
        assert!(!transition_allowed(Delivered, Cancelled));
    }

    #[test]
    fn terminal_states_and_skips_are_rejected() {
        assert!(!transition_allowed(Cancelled, Confirmed));
        assert!(!transition_allowed(Delivered, Shipped));
        assert!(!transition_allowed(Pending, Shipped));
        assert!(!transition_allowed(Pending, Delivered));
        assert!(!transition_allowed(Confirmed, Confirmed));
    }
}
