//! # Order Lifecycle
//!
//! Order status state machine and payment release gate for the marketplace
//! admin back office.
//!
//! - [`transitions`]: which status changes an operator may request
//! - [`release`]: when held funds may be released to a freelancer
//! - [`listing`]: list queries (pagination, search, sort, filters)
//! - [`orders`] / [`payments`]: the reducers driving each admin screen
//! - [`environment`]: the [`AdminBackend`] collaborator the reducers call
//!
//! Orders and payments are held as immutable snapshots of what the backend
//! last reported. Status values echoed by the backend are authoritative.
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_admin_runtime::Store;
//! use order_lifecycle::{AdminEnvironment, OrderAction, OrderReducer, OrdersState};
//!
//! let store = Store::new(
//!     OrdersState::default(),
//!     OrderReducer::new(),
//!     AdminEnvironment::new(backend),
//! );
//! store.send(OrderAction::Load).await?.wait().await;
//! ```

pub mod environment;
pub mod error;
pub mod listing;
pub mod orders;
pub mod payments;
pub mod release;
pub mod transitions;
pub mod types;

pub use environment::{AdminBackend, AdminEnvironment, BackendResult};
pub use error::{BackendError, ReleaseError, TransitionError};
pub use listing::{
    ListFilters, ListQuery, Listing, OrderFilters, OrderQuery, PaymentFilters, PaymentQuery,
    QueryChange, SortDirection,
};
pub use orders::{OrderAction, OrderReducer, OrdersState};
pub use payments::{PaymentAction, PaymentReducer, PaymentsState};
pub use release::{can_release, check_release};
pub use transitions::{CompletionNotice, can_cancel, offered_targets, validate_transition};
pub use types::{
    Money, Order, OrderId, OrderPage, OrderPaymentStatus, OrderStatus, Pagination, Payment,
    PaymentId, PaymentOrderRef, PaymentPage, PaymentStatus, PayoutStatus, StatusEcho,
    UnknownStatus, UserId, UserRef,
};
