//! In-memory backend for fast, deterministic tests.
//!
//! [`InMemoryBackend`] holds orders and payments in memory and behaves like
//! the REST backend for the operations the admin reducers use. Tests can:
//! - inject failures per operation ([`InMemoryBackend::fail`])
//! - override the status echoed by a status update
//! - change a payment behind the admin's back (concurrent writer)
//! - hold an operation until the test resumes it
//! - inspect every call that was made

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use chrono::{DateTime, Utc};
use order_lifecycle::{
    AdminBackend, BackendError, BackendResult, ListFilters, ListQuery, Order, OrderId, OrderPage,
    OrderQuery, OrderStatus, Pagination, Payment, PaymentId, PaymentPage, PaymentQuery,
    PaymentStatus, PayoutStatus, SortDirection, StatusEcho,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Backend operations, for failure injection and call counting
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /api/admin/orders`
    ListOrders,
    /// `PUT /api/admin/orders/{id}/status`
    UpdateOrderStatus,
    /// `GET /api/admin/payments`
    ListPayments,
    /// `GET /api/admin/payments/{id}`
    FetchPayment,
    /// `POST /api/payments/release/{id}`
    ReleasePayment,
}

/// A recorded backend call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    /// Orders list with its query
    ListOrders(OrderQuery),
    /// Status update
    UpdateOrderStatus {
        /// Target order
        order_id: OrderId,
        /// Requested status
        status: OrderStatus,
    },
    /// Payments list with its query
    ListPayments(PaymentQuery),
    /// Single payment fetch
    FetchPayment(PaymentId),
    /// Release
    ReleasePayment(PaymentId),
}

impl Call {
    /// Operation this call belongs to
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::ListOrders(_) => Operation::ListOrders,
            Self::UpdateOrderStatus { .. } => Operation::UpdateOrderStatus,
            Self::ListPayments(_) => Operation::ListPayments,
            Self::FetchPayment(_) => Operation::FetchPayment,
            Self::ReleasePayment(_) => Operation::ReleasePayment,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    orders: Vec<Order>,
    payments: Vec<Payment>,
    failures: HashMap<Operation, VecDeque<BackendError>>,
    echo_override: Option<OrderStatus>,
    holds: HashMap<Operation, Arc<Semaphore>>,
    calls: Vec<Call>,
}

/// In-memory stand-in for the REST backend
///
/// Clones share the same data, so a test keeps one handle for assertions
/// while the store owns another.
///
/// # Example
///
/// ```
/// use marketplace_admin_testing::{fixtures, mocks::{InMemoryBackend, Operation}};
/// use order_lifecycle::{BackendError, OrderStatus};
///
/// let backend = InMemoryBackend::new()
///     .with_orders(vec![fixtures::order("o-1", OrderStatus::Accepted)]);
/// backend.fail(Operation::UpdateOrderStatus, BackendError::Transport("down".into()));
/// assert_eq!(backend.call_count(Operation::UpdateOrderStatus), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed orders
    #[must_use]
    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.inner.lock().unwrap().orders = orders;
        self
    }

    /// Seed payments
    #[must_use]
    pub fn with_payments(self, payments: Vec<Payment>) -> Self {
        self.inner.lock().unwrap().payments = payments;
        self
    }

    /// Make the next call of `operation` fail with `error`
    ///
    /// Failures queue up: calling this twice fails the next two calls.
    pub fn fail(&self, operation: Operation, error: BackendError) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Echo `status` from every status update instead of the stored value
    pub fn echo_status(&self, status: OrderStatus) {
        self.inner.lock().unwrap().echo_override = Some(status);
    }

    /// Change a stored payment, as another admin session would
    pub fn update_payment(&self, payment_id: &PaymentId, change: impl FnOnce(&mut Payment)) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(payment) = inner.payments.iter_mut().find(|p| &p.id == payment_id) {
            change(payment);
        }
    }

    /// Block calls of `operation` until the returned [`Hold`] is released
    /// (or [`InMemoryBackend::resume`] is called)
    pub fn hold(&self, operation: Operation) -> Hold {
        let gate = Arc::new(Semaphore::new(0));
        self.inner
            .lock()
            .unwrap()
            .holds
            .insert(operation, Arc::clone(&gate));
        Hold { gate }
    }

    /// Stop blocking new calls of `operation`; calls already held stay held
    pub fn stop_holding(&self, operation: Operation) {
        self.inner.lock().unwrap().holds.remove(&operation);
    }

    /// Stop blocking `operation` and let held calls proceed
    pub fn resume(&self, operation: Operation) {
        if let Some(gate) = self.inner.lock().unwrap().holds.remove(&operation) {
            gate.close();
        }
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of calls of `operation`
    #[must_use]
    pub fn call_count(&self, operation: Operation) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Stored order
    #[must_use]
    pub fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.inner
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| &o.id == order_id)
            .cloned()
    }

    /// Stored payment
    #[must_use]
    pub fn payment(&self, payment_id: &PaymentId) -> Option<Payment> {
        self.inner
            .lock()
            .unwrap()
            .payments
            .iter()
            .find(|p| &p.id == payment_id)
            .cloned()
    }

    /// Record `call`, then wait for a hold and pop an injected failure
    async fn enter(&self, call: Call) -> BackendResult<()> {
        let operation = call.operation();
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(call);
            inner.holds.get(&operation).cloned()
        };

        if let Some(gate) = gate {
            // Closed on resume; the error is the signal to proceed
            let _ = gate.acquire().await;
        }

        let mut inner = self.inner.lock().unwrap();
        match inner
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Calls blocked by [`InMemoryBackend::hold`]
#[derive(Debug)]
pub struct Hold {
    gate: Arc<Semaphore>,
}

impl Hold {
    /// Let every call blocked by this hold proceed
    pub fn release(&self) {
        self.gate.close();
    }
}

fn page_of<T: Clone, F: ListFilters>(
    rows: &[T],
    query: &ListQuery<F>,
    keep: impl Fn(&T) -> bool,
) -> (Vec<T>, Pagination) {
    let matching: Vec<T> = rows.iter().filter(|row| keep(row)).cloned().collect();
    let limit = query.limit.max(1) as usize;
    let total = matching.len();
    let pages = total.div_ceil(limit).max(1);
    let start = (query.page.max(1) as usize - 1) * limit;

    let rows = matching.into_iter().skip(start).take(limit).collect();
    #[allow(clippy::cast_possible_truncation)] // test data stays tiny
    let pagination = Pagination {
        page: query.page,
        pages: pages as u32,
        total: total as u64,
    };
    (rows, pagination)
}

fn matches_search(needle: &str, haystack: &[Option<&str>]) -> bool {
    let needle = needle.trim().to_lowercase();
    needle.is_empty()
        || haystack
            .iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&needle))
}

/// Only `createdAt` is sortable here; other fields keep seed order
fn sort_by_created<T>(
    rows: &mut [T],
    sort_by: &str,
    order: SortDirection,
    created: impl Fn(&T) -> Option<DateTime<Utc>>,
) {
    if sort_by != "createdAt" {
        return;
    }
    rows.sort_by_key(created);
    if order == SortDirection::Desc {
        rows.reverse();
    }
}

impl AdminBackend for InMemoryBackend {
    async fn list_orders(&self, query: &OrderQuery) -> BackendResult<OrderPage> {
        self.enter(Call::ListOrders(query.clone())).await?;

        let mut orders = self.inner.lock().unwrap().orders.clone();
        sort_by_created(&mut orders, &query.sort_by, query.order, |o| o.created_at);

        let (orders, pagination) = page_of(&orders, query, |order| {
            query.filters.status.is_none_or(|s| s == order.status)
                && matches_search(
                    &query.search,
                    &[
                        Some(order.id.as_str()),
                        order.client.name.as_deref(),
                        order.freelancer.name.as_deref(),
                    ],
                )
        });
        Ok(OrderPage { orders, pagination })
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> BackendResult<StatusEcho> {
        self.enter(Call::UpdateOrderStatus {
            order_id: order_id.clone(),
            status,
        })
        .await?;

        let mut inner = self.inner.lock().unwrap();
        let stored = inner.echo_override.unwrap_or(status);
        let order = inner
            .orders
            .iter_mut()
            .find(|o| &o.id == order_id)
            .ok_or_else(|| BackendError::NotFound(format!("Order {order_id} not found")))?;
        order.status = stored;
        Ok(StatusEcho { status: stored })
    }

    async fn list_payments(&self, query: &PaymentQuery) -> BackendResult<PaymentPage> {
        self.enter(Call::ListPayments(query.clone())).await?;

        let mut payments = self.inner.lock().unwrap().payments.clone();
        sort_by_created(&mut payments, &query.sort_by, query.order, |p| p.created_at);

        let (payments, pagination) = page_of(&payments, query, |payment| {
            query.filters.status.is_none_or(|s| s == payment.status)
                && query
                    .filters
                    .payout_status
                    .is_none_or(|s| s == payment.payout_status)
                && matches_search(
                    &query.search,
                    &[
                        Some(payment.id.as_str()),
                        Some(payment.order.id.as_str()),
                        payment.order.freelancer.name.as_deref(),
                    ],
                )
        });
        Ok(PaymentPage {
            payments,
            pagination,
        })
    }

    async fn fetch_payment(&self, payment_id: &PaymentId) -> BackendResult<Payment> {
        self.enter(Call::FetchPayment(payment_id.clone())).await?;

        self.payment(payment_id)
            .ok_or_else(|| BackendError::NotFound(format!("Payment {payment_id} not found")))
    }

    async fn release_payment(&self, payment_id: &PaymentId) -> BackendResult<()> {
        self.enter(Call::ReleasePayment(payment_id.clone())).await?;

        let mut inner = self.inner.lock().unwrap();
        let payment = inner
            .payments
            .iter_mut()
            .find(|p| &p.id == payment_id)
            .ok_or_else(|| BackendError::NotFound(format!("Payment {payment_id} not found")))?;

        if payment.status != PaymentStatus::Succeeded || payment.payout_status != PayoutStatus::Pending
        {
            return Err(BackendError::Rejected {
                status: 400,
                message: "Payment is not eligible for release".to_string(),
            });
        }

        *payment = payment.released();
        Ok(())
    }
}
