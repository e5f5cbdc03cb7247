//! Orders screen: the order list and the order lifecycle controller.
//!
//! The reducer validates a status change against the state machine, marks the
//! order busy, and describes the `PUT` as an effect. The local snapshot only
//! changes once the backend echoes the stored status back.

use crate::environment::{AdminBackend, AdminEnvironment};
use crate::error::{BackendError, TransitionError};
use crate::listing::{Listing, OrderFilters, OrderQuery, QueryChange};
use crate::transitions::{self, CompletionNotice};
use crate::types::{Order, OrderId, OrderPage, OrderStatus};
use marketplace_admin_core::effect::Effect;
use marketplace_admin_core::reducer::Reducer;
use marketplace_admin_core::{SmallVec, smallvec};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

/// State of the orders screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrdersState {
    /// Current page of orders
    pub listing: Listing<Order, OrderFilters>,
    /// Orders with a status change in flight
    pub busy: HashSet<OrderId>,
    /// Last error surfaced to the operator
    pub last_error: Option<String>,
    /// Advisory recorded when an order is moved to `completed`
    pub notice: Option<CompletionNotice>,
    /// Notice shown before each in-flight completion, restored if it fails
    pub replaced_notices: HashMap<OrderId, Option<CompletionNotice>>,
}

impl OrdersState {
    /// Loaded snapshot of `order_id`
    #[must_use]
    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.listing.rows.iter().find(|order| &order.id == order_id)
    }

    /// Whether a status change for `order_id` is in flight
    #[must_use]
    pub fn is_busy(&self, order_id: &OrderId) -> bool {
        self.busy.contains(order_id)
    }

    /// Targets to offer for `order_id` right now; empty while busy
    #[must_use]
    pub fn offered_targets(&self, order_id: &OrderId) -> Vec<OrderStatus> {
        if self.is_busy(order_id) {
            return Vec::new();
        }
        self.order(order_id)
            .map(transitions::offered_targets)
            .unwrap_or_default()
    }

    /// Whether to offer cancellation for `order_id` right now
    #[must_use]
    pub fn can_cancel(&self, order_id: &OrderId) -> bool {
        !self.is_busy(order_id) && self.order(order_id).is_some_and(transitions::can_cancel)
    }
}

/// Actions of the orders screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderAction {
    // ========== List ==========
    /// Edit the list query and reload
    ChangeQuery(QueryChange<OrderFilters>),

    /// Reload the current query
    Load,

    /// A page of orders arrived
    PageLoaded {
        /// Load this page answers
        generation: u64,
        /// The page
        page: OrderPage,
    },

    /// Loading a page failed
    LoadFailed {
        /// Load this failure answers
        generation: u64,
        /// Cause
        error: BackendError,
    },

    // ========== Lifecycle ==========
    /// Move an order to one of its offered targets
    RequestTransition {
        /// Order to change
        order_id: OrderId,
        /// Requested status
        target: OrderStatus,
    },

    /// Cancel an order (already confirmed by the operator)
    RequestCancel {
        /// Order to cancel
        order_id: OrderId,
    },

    /// The backend stored a new status
    StatusUpdated {
        /// Order that changed
        order_id: OrderId,
        /// Status as echoed by the backend
        echoed: OrderStatus,
    },

    /// The backend refused or never answered a status change
    TransitionFailed {
        /// Order that was being changed
        order_id: OrderId,
        /// Cause
        error: BackendError,
    },

    /// Clear `last_error` and the completion notice
    DismissMessages,
}

/// Reducer of the orders screen
#[derive(Debug)]
pub struct OrderReducer<B> {
    _backend: PhantomData<B>,
}

impl<B> OrderReducer<B> {
    /// Creates a new order reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B> Default for OrderReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for OrderReducer<B> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<B> OrderReducer<B>
where
    B: AdminBackend + Clone + 'static,
{
    /// Validates a change request against the loaded snapshot
    fn validate(
        state: &OrdersState,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> Result<(), TransitionError> {
        let order = state
            .order(order_id)
            .ok_or_else(|| TransitionError::NotLoaded(order_id.clone()))?;

        if state.is_busy(order_id) {
            return Err(TransitionError::InFlight(order_id.clone()));
        }

        transitions::validate_transition(order, target)
    }

    fn load_effect(state: &mut OrdersState, env: &AdminEnvironment<B>) -> Effect<OrderAction> {
        let generation = state.listing.begin_load();
        let query: OrderQuery = state.listing.query.clone();
        let backend = env.backend.clone();

        Effect::future(async move {
            match backend.list_orders(&query).await {
                Ok(page) => Some(OrderAction::PageLoaded { generation, page }),
                Err(error) => Some(OrderAction::LoadFailed { generation, error }),
            }
        })
    }

    fn restore_notice(state: &mut OrdersState, order_id: &OrderId) {
        if let Some(previous) = state.replaced_notices.remove(order_id) {
            state.notice = previous;
        }
    }

    fn transition_effect(
        state: &mut OrdersState,
        env: &AdminEnvironment<B>,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Effect<OrderAction> {
        if let Err(error) = Self::validate(state, &order_id, target) {
            tracing::warn!(order_id = %order_id, target = %target, "Status change rejected: {error}");
            state.last_error = Some(error.to_string());
            return Effect::None;
        }

        if target == OrderStatus::Completed {
            let notice = state.order(&order_id).map(CompletionNotice::for_order);
            let previous = std::mem::replace(&mut state.notice, notice);
            state.replaced_notices.insert(order_id.clone(), previous);
        }

        state.busy.insert(order_id.clone());
        state.last_error = None;
        tracing::debug!(order_id = %order_id, target = %target, "Requesting status change");

        let backend = env.backend.clone();
        Effect::future(async move {
            match backend.update_order_status(&order_id, target).await {
                Ok(echo) => Some(OrderAction::StatusUpdated {
                    order_id,
                    echoed: echo.status,
                }),
                Err(error) => Some(OrderAction::TransitionFailed { order_id, error }),
            }
        })
    }
}

impl<B> Reducer for OrderReducer<B>
where
    B: AdminBackend + Clone + 'static,
{
    type State = OrdersState;
    type Action = OrderAction;
    type Environment = AdminEnvironment<B>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== List ==========
            OrderAction::ChangeQuery(change) => {
                let query = std::mem::take(&mut state.listing.query);
                state.listing.query = query.apply(change);
                smallvec![Self::load_effect(state, env)]
            },

            OrderAction::Load => smallvec![Self::load_effect(state, env)],

            OrderAction::PageLoaded { generation, page } => {
                if !state
                    .listing
                    .accept(generation, page.orders, page.pagination)
                {
                    tracing::debug!(generation, "Dropping stale orders page");
                }
                smallvec![Effect::None]
            },

            OrderAction::LoadFailed { generation, error } => {
                if state.listing.fail(generation) {
                    tracing::error!("Loading orders failed: {error}");
                    state.last_error = Some(error.to_string());
                }
                smallvec![Effect::None]
            },

            // ========== Lifecycle ==========
            OrderAction::RequestTransition { order_id, target } => {
                smallvec![Self::transition_effect(state, env, order_id, target)]
            },

            OrderAction::RequestCancel { order_id } => {
                smallvec![Self::transition_effect(
                    state,
                    env,
                    order_id,
                    OrderStatus::Cancelled
                )]
            },

            OrderAction::StatusUpdated { order_id, echoed } => {
                state.busy.remove(&order_id);
                if echoed != OrderStatus::Completed {
                    Self::restore_notice(state, &order_id);
                }
                state.replaced_notices.remove(&order_id);

                let next = state
                    .order(&order_id)
                    .map(|order| transitions::apply_echo(order, echoed));
                match next {
                    Some(next) => {
                        state
                            .listing
                            .replace_row(|order| order.id == order_id, next);
                        tracing::debug!(order_id = %order_id, status = %echoed, "Order status updated");
                    },
                    None => {
                        tracing::debug!(order_id = %order_id, "Updated order no longer on the page");
                    },
                }
                smallvec![Effect::None]
            },

            OrderAction::TransitionFailed { order_id, error } => {
                state.busy.remove(&order_id);
                Self::restore_notice(state, &order_id);
                tracing::error!(order_id = %order_id, "Status change failed: {error}");
                state.last_error = Some(error.to_string());
                smallvec![Effect::None]
            },

            OrderAction::DismissMessages => {
                state.last_error = None;
                state.notice = None;
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::BackendResult;
    use crate::listing::PaymentQuery;
    use crate::types::{
        Money, OrderPaymentStatus, Pagination, Payment, PaymentId, PaymentPage, StatusEcho,
        UserRef,
    };
    use std::future::Future;

    /// Backend that must never be reached
    #[derive(Clone)]
    struct Unreachable;

    impl AdminBackend for Unreachable {
        fn list_orders(
            &self,
            _query: &OrderQuery,
        ) -> impl Future<Output = BackendResult<OrderPage>> + Send {
            async { Err(BackendError::Transport("unreachable".to_string())) }
        }

        fn update_order_status(
            &self,
            _order_id: &OrderId,
            _status: OrderStatus,
        ) -> impl Future<Output = BackendResult<StatusEcho>> + Send {
            async { Err(BackendError::Transport("unreachable".to_string())) }
        }

        fn list_payments(
            &self,
            _query: &PaymentQuery,
        ) -> impl Future<Output = BackendResult<PaymentPage>> + Send {
            async { Err(BackendError::Transport("unreachable".to_string())) }
        }

        fn fetch_payment(
            &self,
            _payment_id: &PaymentId,
        ) -> impl Future<Output = BackendResult<Payment>> + Send {
            async { Err(BackendError::Transport("unreachable".to_string())) }
        }

        fn release_payment(
            &self,
            _payment_id: &PaymentId,
        ) -> impl Future<Output = BackendResult<()>> + Send {
            async { Err(BackendError::Transport("unreachable".to_string())) }
        }
    }

    fn order(id: &str, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(id),
            status,
            payment_status: OrderPaymentStatus::Paid,
            price: Money::from_cents(2_500),
            client: UserRef::new("c-1"),
            freelancer: UserRef::new("f-1"),
            created_at: None,
        }
    }

    fn loaded(orders: Vec<Order>) -> OrdersState {
        let mut state = OrdersState::default();
        let generation = state.listing.begin_load();
        state
            .listing
            .accept(generation, orders, Pagination::default());
        state
    }

    fn reduce(state: &mut OrdersState, action: OrderAction) -> SmallVec<[Effect<OrderAction>; 4]> {
        OrderReducer::<Unreachable>::new().reduce(
            state,
            action,
            &AdminEnvironment::new(Unreachable),
        )
    }

    #[test]
    fn request_marks_busy_and_describes_the_call() {
        let mut state = loaded(vec![order("o-1", OrderStatus::Accepted)]);

        let effects = reduce(
            &mut state,
            OrderAction::RequestTransition {
                order_id: OrderId::new("o-1"),
                target: OrderStatus::Completed,
            },
        );

        assert!(matches!(effects[0], Effect::Future(_)));
        assert!(state.is_busy(&OrderId::new("o-1")));
        assert!(state.offered_targets(&OrderId::new("o-1")).is_empty());
        assert_eq!(
            state.order(&OrderId::new("o-1")).map(|o| o.status),
            Some(OrderStatus::Accepted)
        );
        assert!(state.notice.as_ref().is_some_and(|n| n.release_eligible));
    }

    #[test]
    fn terminal_order_is_rejected_without_a_call() {
        let mut state = loaded(vec![order("o-1", OrderStatus::Cancelled)]);
        let before = state.listing.clone();

        let effects = reduce(
            &mut state,
            OrderAction::RequestTransition {
                order_id: OrderId::new("o-1"),
                target: OrderStatus::Pending,
            },
        );

        assert!(matches!(effects[0], Effect::None));
        assert_eq!(state.listing, before);
        assert!(!state.is_busy(&OrderId::new("o-1")));
        assert!(state.last_error.is_some());
    }

    #[test]
    fn second_request_while_in_flight_is_rejected() {
        let mut state = loaded(vec![order("o-1", OrderStatus::Pending)]);
        let id = OrderId::new("o-1");

        reduce(
            &mut state,
            OrderAction::RequestTransition {
                order_id: id.clone(),
                target: OrderStatus::Accepted,
            },
        );
        let effects = reduce(&mut state, OrderAction::RequestCancel { order_id: id.clone() });

        assert!(matches!(effects[0], Effect::None));
        assert_eq!(
            state.last_error,
            Some(TransitionError::InFlight(id).to_string())
        );
    }

    #[test]
    fn echo_replaces_status_even_when_it_differs_from_the_request() {
        let mut state = loaded(vec![order("o-1", OrderStatus::Pending)]);
        let id = OrderId::new("o-1");
        reduce(
            &mut state,
            OrderAction::RequestTransition {
                order_id: id.clone(),
                target: OrderStatus::InProgress,
            },
        );

        reduce(
            &mut state,
            OrderAction::StatusUpdated {
                order_id: id.clone(),
                echoed: OrderStatus::Accepted,
            },
        );

        assert_eq!(state.order(&id).map(|o| o.status), Some(OrderStatus::Accepted));
        assert!(!state.is_busy(&id));
    }

    #[test]
    fn failure_leaves_snapshot_untouched() {
        let mut state = loaded(vec![order("o-1", OrderStatus::InProgress)]);
        let id = OrderId::new("o-1");
        let before = state.listing.clone();
        reduce(
            &mut state,
            OrderAction::RequestTransition {
                order_id: id.clone(),
                target: OrderStatus::Completed,
            },
        );

        reduce(
            &mut state,
            OrderAction::TransitionFailed {
                order_id: id.clone(),
                error: BackendError::Rejected {
                    status: 400,
                    message: "Invalid status transition".to_string(),
                },
            },
        );

        assert_eq!(state.listing, before);
        assert!(!state.is_busy(&id));
        assert!(
            state
                .last_error
                .as_deref()
                .is_some_and(|e| e.contains("Invalid status transition"))
        );
    }

    #[test]
    fn query_change_resets_page_and_reloads() {
        let mut state = OrdersState::default();
        reduce(&mut state, OrderAction::ChangeQuery(QueryChange::Page(4)));
        assert_eq!(state.listing.query.page, 4);

        let effects = reduce(
            &mut state,
            OrderAction::ChangeQuery(QueryChange::Filters(OrderFilters {
                status: Some(OrderStatus::Pending),
            })),
        );
        assert_eq!(state.listing.query.page, 1);
        assert_eq!(state.listing.generation(), 2);
        assert!(state.listing.loading);
        assert!(matches!(effects[0], Effect::Future(_)));
    }

    #[test]
    fn stale_page_does_not_overwrite_newer_one() {
        let mut state = OrdersState::default();
        reduce(&mut state, OrderAction::Load);
        reduce(&mut state, OrderAction::Load);

        reduce(
            &mut state,
            OrderAction::PageLoaded {
                generation: 2,
                page: OrderPage {
                    orders: vec![order("new", OrderStatus::Pending)],
                    pagination: Pagination::default(),
                },
            },
        );
        reduce(
            &mut state,
            OrderAction::PageLoaded {
                generation: 1,
                page: OrderPage {
                    orders: vec![order("old", OrderStatus::Pending)],
                    pagination: Pagination::default(),
                },
            },
        );

        assert!(state.order(&OrderId::new("new")).is_some());
        assert!(state.order(&OrderId::new("old")).is_none());
    }
}
