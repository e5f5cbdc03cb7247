//! # Marketplace Admin Testing
//!
//! Testing utilities for the marketplace admin reducers.
//!
//! This crate provides:
//! - [`mocks::InMemoryBackend`]: the REST backend in memory, with failure
//!   injection, call recording and holds
//! - [`fixtures`]: orders, payments and preloaded screen states
//! - [`ReducerTest`]: Given-When-Then reducer harness
//! - [`properties`]: proptest strategies for the domain types
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_admin_testing::{fixtures, helpers, mocks::InMemoryBackend};
//!
//! #[tokio::test]
//! async fn completes_an_order() {
//!     let backend = InMemoryBackend::new()
//!         .with_orders(vec![fixtures::order("o-1", OrderStatus::Accepted)]);
//!     let store = helpers::order_store(backend, vec![fixtures::order("o-1", OrderStatus::Accepted)]);
//!
//!     store
//!         .send(OrderAction::RequestTransition {
//!             order_id: OrderId::new("o-1"),
//!             target: OrderStatus::Completed,
//!         })
//!         .await?
//!         .wait()
//!         .await;
//! }
//! ```

pub mod fixtures;
pub mod mocks;
mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Store builders and test setup
pub mod helpers {
    use crate::fixtures;
    use crate::mocks::InMemoryBackend;
    use marketplace_admin_runtime::Store;
    use order_lifecycle::{
        AdminEnvironment, Order, OrderAction, OrderReducer, OrdersState, Payment, PaymentAction,
        PaymentReducer, PaymentsState,
    };

    /// Store driving the orders screen against an in-memory backend
    pub type OrderStore = Store<
        OrdersState,
        OrderAction,
        AdminEnvironment<InMemoryBackend>,
        OrderReducer<InMemoryBackend>,
    >;

    /// Store driving the payments screen against an in-memory backend
    pub type PaymentStore = Store<
        PaymentsState,
        PaymentAction,
        AdminEnvironment<InMemoryBackend>,
        PaymentReducer<InMemoryBackend>,
    >;

    /// Orders store whose screen already shows `loaded`
    #[must_use]
    pub fn order_store(backend: InMemoryBackend, loaded: Vec<Order>) -> OrderStore {
        Store::new(
            fixtures::orders_state(loaded),
            OrderReducer::new(),
            AdminEnvironment::new(backend),
        )
    }

    /// Payments store whose screen already shows `loaded`
    #[must_use]
    pub fn payment_store(backend: InMemoryBackend, loaded: Vec<Payment>) -> PaymentStore {
        Store::new(
            fixtures::payments_state(loaded),
            PaymentReducer::new(),
            AdminEnvironment::new(backend),
        )
    }

    /// Route `tracing` output through the test harness's captured stdout
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest
pub mod properties {
    use crate::fixtures;
    use order_lifecycle::{Order, OrderStatus, Payment, PaymentStatus, PayoutStatus};
    use proptest::prelude::*;

    /// Any order status
    pub fn any_order_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    /// Any payment status
    pub fn any_payment_status() -> impl Strategy<Value = PaymentStatus> {
        prop::sample::select(PaymentStatus::ALL.to_vec())
    }

    /// Any payout status
    pub fn any_payout_status() -> impl Strategy<Value = PayoutStatus> {
        prop::sample::select(PayoutStatus::ALL.to_vec())
    }

    /// An order in any status
    pub fn any_order() -> impl Strategy<Value = Order> {
        any_order_status().prop_map(|status| fixtures::order("o-prop", status))
    }

    /// A payment in any combination of status, payout status and destination
    pub fn any_payment() -> impl Strategy<Value = Payment> {
        (any_payment_status(), any_payout_status(), any::<bool>()).prop_map(
            |(status, payout, configured)| fixtures::payment("p-prop", status, payout, configured),
        )
    }
}
