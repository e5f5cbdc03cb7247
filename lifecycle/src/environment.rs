//! Backend collaborator injected into the admin reducers.

use crate::error::BackendError;
use crate::listing::{OrderQuery, PaymentQuery};
use crate::types::{OrderId, OrderPage, OrderStatus, Payment, PaymentId, PaymentPage, StatusEcho};
use std::future::Future;

/// Result alias for backend calls
pub type BackendResult<T> = Result<T, BackendError>;

/// The REST backend holding orders and payments.
///
/// Implemented over HTTP by `marketplace-admin-client` and in memory by
/// `marketplace-admin-testing`.
pub trait AdminBackend: Send + Sync {
    /// List one page of orders.
    ///
    /// # Errors
    ///
    /// Any [`BackendError`]; the caller keeps its current page.
    fn list_orders(
        &self,
        query: &OrderQuery,
    ) -> impl Future<Output = BackendResult<OrderPage>> + Send;

    /// Request a status change and return the status the backend stored.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The backend rejects the transition → [`BackendError::Rejected`]
    /// - The order no longer exists → [`BackendError::NotFound`]
    /// - The request fails in transit → [`BackendError::Transport`]
    fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = BackendResult<StatusEcho>> + Send;

    /// List one page of payments.
    ///
    /// # Errors
    ///
    /// Any [`BackendError`]; the caller keeps its current page.
    fn list_payments(
        &self,
        query: &PaymentQuery,
    ) -> impl Future<Output = BackendResult<PaymentPage>> + Send;

    /// Fetch the current snapshot of one payment.
    ///
    /// # Errors
    ///
    /// [`BackendError::NotFound`] for an unknown id, otherwise any
    /// [`BackendError`].
    fn fetch_payment(
        &self,
        payment_id: &PaymentId,
    ) -> impl Future<Output = BackendResult<Payment>> + Send;

    /// Release the held funds of a payment to the freelancer.
    ///
    /// Irreversible. Not retried by the caller.
    ///
    /// # Errors
    ///
    /// Any [`BackendError`]; the payment is then assumed unchanged.
    fn release_payment(
        &self,
        payment_id: &PaymentId,
    ) -> impl Future<Output = BackendResult<()>> + Send;
}

/// Dependencies of the admin reducers
#[derive(Clone, Debug)]
pub struct AdminEnvironment<B>
where
    B: AdminBackend + Clone,
{
    /// REST backend
    pub backend: B,
}

impl<B> AdminEnvironment<B>
where
    B: AdminBackend + Clone,
{
    /// Creates an environment around `backend`
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }
}
