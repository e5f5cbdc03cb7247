//! Payment release gate.
//!
//! A release is offered only when the payment succeeded, its payout is still
//! pending, and the freelancer can receive funds. The gate is evaluated twice:
//! on the loaded snapshot to decide whether to offer the action, and again on
//! a freshly fetched snapshot right before the release request goes out.

use crate::error::ReleaseError;
use crate::types::{Payment, PaymentStatus, PayoutStatus};

/// Whether `payment` may be released
#[must_use]
pub fn can_release(payment: &Payment) -> bool {
    check_release(payment).is_ok()
}

/// Same predicate as [`can_release`], naming the first unmet condition.
///
/// # Errors
///
/// - [`ReleaseError::NotSucceeded`] unless `status == succeeded`
/// - [`ReleaseError::PayoutNotPending`] unless `payoutStatus == pending`
/// - [`ReleaseError::NoPayoutDestination`] if the freelancer has none
pub fn check_release(payment: &Payment) -> Result<(), ReleaseError> {
    if payment.status != PaymentStatus::Succeeded {
        return Err(ReleaseError::NotSucceeded(payment.status));
    }

    if payment.payout_status != PayoutStatus::Pending {
        return Err(ReleaseError::PayoutNotPending(payment.payout_status));
    }

    if !payment.order.freelancer.payout_destination_configured {
        return Err(ReleaseError::NoPayoutDestination);
    }

    Ok(())
}
