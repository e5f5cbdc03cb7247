//! Order status state machine.
//!
//! ```text
//!   pending ⇄ accepted ⇄ in_progress ─→ completed
//!      │          │           │
//!      └──────────┴───────────┴──────→ cancelled
//! ```
//!
//! Any non-terminal status may move to any other status. `completed` and
//! `cancelled` are terminal for admin-driven changes, even though the backend
//! may still update the payment side of a completed order on its own.

use crate::error::TransitionError;
use crate::types::{Order, OrderPaymentStatus, OrderStatus};

/// Statuses an operator can pick from the status selector
pub const SELECTABLE: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Accepted,
    OrderStatus::InProgress,
    OrderStatus::Completed,
];

/// Targets offered for `order`: the selectable statuses minus the current one,
/// nothing at all once the order is terminal.
#[must_use]
pub fn offered_targets(order: &Order) -> Vec<OrderStatus> {
    if order.status.is_terminal() {
        return Vec::new();
    }

    SELECTABLE
        .into_iter()
        .filter(|status| *status != order.status)
        .collect()
}

/// Cancellation sits behind its own confirmation rather than the selector.
#[must_use]
pub const fn can_cancel(order: &Order) -> bool {
    !order.status.is_terminal()
}

/// Checks a requested change against the state machine.
///
/// # Errors
///
/// - [`TransitionError::Terminal`] if the order is completed or cancelled
/// - [`TransitionError::Unchanged`] if `target` is the current status
pub fn validate_transition(order: &Order, target: OrderStatus) -> Result<(), TransitionError> {
    if order.status.is_terminal() {
        return Err(TransitionError::Terminal(order.status));
    }

    if order.status == target {
        return Err(TransitionError::Unchanged(target));
    }

    debug_assert!(target == OrderStatus::Cancelled || offered_targets(order).contains(&target));
    Ok(())
}

/// New snapshot after the backend confirmed a change.
///
/// Only the echoed status is applied. The requested value is deliberately
/// not consulted: the backend may have adjusted it or another session may
/// have written in between.
#[must_use]
pub fn apply_echo(order: &Order, echoed: OrderStatus) -> Order {
    order.with_status(echoed)
}

/// Advisory shown when an operator moves an order to `completed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    /// Order being completed
    pub order_id: crate::types::OrderId,
    /// The order is paid, so completing it opens payment release
    pub release_eligible: bool,
}

impl CompletionNotice {
    /// Builds the advisory for `order`
    #[must_use]
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            release_eligible: order.payment_status == OrderPaymentStatus::Paid,
        }
    }

    /// Operator-facing text
    #[must_use]
    pub fn message(&self) -> String {
        let mut text = format!(
            "Completing order {} lets the client leave a review.",
            self.order_id
        );
        if self.release_eligible {
            text.push_str(" The order is paid, so its payment becomes eligible for release to the freelancer.");
        }
        text
    }
}
