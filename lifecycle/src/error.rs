//! Error types for the admin lifecycle

use crate::types::{OrderId, OrderStatus, PaymentId, PaymentStatus, PayoutStatus};
use thiserror::Error;

/// Errors reported by the backend collaborator
///
/// Every variant is handled the same way by the reducers: the local snapshot
/// is left untouched, the message is surfaced, nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Transport(String),

    /// The response could not be decoded
    #[error("Unexpected response from backend: {0}")]
    InvalidResponse(String),

    /// The backend refused the change (invalid transition, validation failure)
    #[error("Rejected by backend (status {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Credentials missing, expired or lacking the admin role
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The entity no longer exists (stale local reference)
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Reasons an order status change is refused before reaching the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The order is not part of the loaded snapshots
    #[error("Order {0} is not loaded")]
    NotLoaded(OrderId),

    /// Completed and cancelled orders accept no further admin changes
    #[error("Order is {0}; no further status changes are allowed")]
    Terminal(OrderStatus),

    /// The order already has the requested status
    #[error("Order is already {0}")]
    Unchanged(OrderStatus),

    /// A status change for this order has not resolved yet
    #[error("A status change for order {0} is already in progress")]
    InFlight(OrderId),
}

/// Reasons a payment release is not offered or is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseError {
    /// The payment is not part of the loaded snapshots
    #[error("Payment {0} is not loaded")]
    NotLoaded(PaymentId),

    /// Only succeeded payments hold releasable funds
    #[error("Payment is {0}; only succeeded payments can be released")]
    NotSucceeded(PaymentStatus),

    /// The payout already happened
    #[error("Payout is already {0}")]
    PayoutNotPending(PayoutStatus),

    /// The freelancer cannot receive funds
    #[error("Freelancer has no payout destination configured")]
    NoPayoutDestination,

    /// A release for this payment has not resolved yet
    #[error("A release for payment {0} is already in progress")]
    InFlight(PaymentId),
}
