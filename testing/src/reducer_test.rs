//! Given-When-Then harness for the admin reducers.
//!
//! Runs a reducer synchronously: effects are returned for inspection, never
//! executed. Use a [`Store`](marketplace_admin_runtime::Store) when the
//! backend response should flow back in.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use marketplace_admin_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S, &S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent reducer test
///
/// # Example
///
/// ```ignore
/// use marketplace_admin_testing::{ReducerTest, assertions, fixtures, mocks::InMemoryBackend};
///
/// ReducerTest::new(OrderReducer::<InMemoryBackend>::new())
///     .with_env(AdminEnvironment::new(InMemoryBackend::new()))
///     .given_state(fixtures::orders_state(vec![fixtures::order("o-1", OrderStatus::Cancelled)]))
///     .when_action(OrderAction::RequestCancel { order_id: OrderId::new("o-1") })
///     .then_state_unchanged_except(|state| state.last_error = None)
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone + PartialEq + std::fmt::Debug + 'static,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    ///
    /// Call repeatedly to replay a sequence, e.g. a request followed by the
    /// backend's answer. Effect assertions see the effects of the last action.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions
            .push(Box::new(move |_before, after| assertion(after)));
        self
    }

    /// Assert the state equals the initial state once `normalize` has been
    /// applied to the resulting state (Then)
    ///
    /// `normalize` clears the fields the scenario is allowed to touch, such
    /// as `last_error`.
    #[must_use]
    pub fn then_state_unchanged_except<F>(mut self, normalize: F) -> Self
    where
        F: FnOnce(&mut S) + 'static,
    {
        self.state_assertions.push(Box::new(move |before, after| {
            let mut after = after.clone();
            normalize(&mut after);
            assert_eq!(&after, before, "State changed beyond the allowed fields");
        }));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let initial = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut state = initial.clone();
        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&initial, &state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use marketplace_admin_core::effect::Effect;

    /// Assert that the reducer asked for no backend call
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` was returned.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that the reducer described a backend call
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::mocks::InMemoryBackend;
    use order_lifecycle::{
        AdminEnvironment, BackendError, OrderAction, OrderId, OrderReducer, OrderStatus,
        PaymentAction, PaymentId, PaymentReducer, PaymentStatus, PayoutStatus,
    };

    fn env() -> AdminEnvironment<InMemoryBackend> {
        AdminEnvironment::new(InMemoryBackend::new())
    }

    #[test]
    fn cancel_request_on_pending_order_describes_call() {
        ReducerTest::new(OrderReducer::<InMemoryBackend>::new())
            .with_env(env())
            .given_state(fixtures::orders_state(vec![fixtures::order(
                "o-1",
                OrderStatus::Pending,
            )]))
            .when_action(OrderAction::RequestCancel {
                order_id: OrderId::new("o-1"),
            })
            .then_state(|state| {
                assert!(state.is_busy(&OrderId::new("o-1")));
                assert!(!state.can_cancel(&OrderId::new("o-1")));
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn completed_order_stays_put() {
        ReducerTest::new(OrderReducer::<InMemoryBackend>::new())
            .with_env(env())
            .given_state(fixtures::orders_state(vec![fixtures::order(
                "o-1",
                OrderStatus::Completed,
            )]))
            .when_action(OrderAction::RequestTransition {
                order_id: OrderId::new("o-1"),
                target: OrderStatus::InProgress,
            })
            .then_state_unchanged_except(|state| state.last_error = None)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn backend_failure_restores_prior_state() {
        ReducerTest::new(OrderReducer::<InMemoryBackend>::new())
            .with_env(env())
            .given_state(fixtures::orders_state(vec![fixtures::order(
                "o-1",
                OrderStatus::Accepted,
            )]))
            .when_action(OrderAction::RequestTransition {
                order_id: OrderId::new("o-1"),
                target: OrderStatus::InProgress,
            })
            .when_action(OrderAction::TransitionFailed {
                order_id: OrderId::new("o-1"),
                error: BackendError::Transport("connection reset".to_string()),
            })
            .then_state_unchanged_except(|state| state.last_error = None)
            .then_state(|state| {
                assert_eq!(
                    state.last_error.as_deref(),
                    Some("Network error: connection reset")
                );
            })
            .run();
    }

    #[test]
    fn failed_completion_withdraws_its_notice() {
        ReducerTest::new(OrderReducer::<InMemoryBackend>::new())
            .with_env(env())
            .given_state(fixtures::orders_state(vec![fixtures::order(
                "o-1",
                OrderStatus::InProgress,
            )]))
            .when_action(OrderAction::RequestTransition {
                order_id: OrderId::new("o-1"),
                target: OrderStatus::Completed,
            })
            .when_action(OrderAction::TransitionFailed {
                order_id: OrderId::new("o-1"),
                error: BackendError::Rejected {
                    status: 400,
                    message: "Invalid status transition".to_string(),
                },
            })
            .then_state_unchanged_except(|state| state.last_error = None)
            .then_state(|state| {
                assert!(state.notice.is_none());
                assert!(state.replaced_notices.is_empty());
            })
            .run();
    }

    #[test]
    fn failed_completion_keeps_an_earlier_notice() {
        let mut given = fixtures::orders_state(vec![
            fixtures::order("o-1", OrderStatus::Completed),
            fixtures::order("o-2", OrderStatus::Accepted),
        ]);
        given.notice = given
            .order(&OrderId::new("o-1"))
            .map(order_lifecycle::CompletionNotice::for_order);

        ReducerTest::new(OrderReducer::<InMemoryBackend>::new())
            .with_env(env())
            .given_state(given)
            .when_action(OrderAction::RequestTransition {
                order_id: OrderId::new("o-2"),
                target: OrderStatus::Completed,
            })
            .when_action(OrderAction::TransitionFailed {
                order_id: OrderId::new("o-2"),
                error: BackendError::Transport("connection reset".to_string()),
            })
            .then_state_unchanged_except(|state| state.last_error = None)
            .then_state(|state| {
                assert_eq!(
                    state.notice.as_ref().map(|n| n.order_id.clone()),
                    Some(OrderId::new("o-1"))
                );
            })
            .run();
    }

    #[test]
    fn completion_echoed_as_another_status_withdraws_its_notice() {
        ReducerTest::new(OrderReducer::<InMemoryBackend>::new())
            .with_env(env())
            .given_state(fixtures::orders_state(vec![fixtures::order(
                "o-1",
                OrderStatus::InProgress,
            )]))
            .when_action(OrderAction::RequestTransition {
                order_id: OrderId::new("o-1"),
                target: OrderStatus::Completed,
            })
            .when_action(OrderAction::StatusUpdated {
                order_id: OrderId::new("o-1"),
                echoed: OrderStatus::InProgress,
            })
            .then_state_unchanged_except(|state| state.last_error = None)
            .run();
    }

    #[test]
    fn release_without_payout_destination_is_not_dispatched() {
        ReducerTest::new(PaymentReducer::<InMemoryBackend>::new())
            .with_env(env())
            .given_state(fixtures::payments_state(vec![fixtures::payment(
                "p-1",
                PaymentStatus::Succeeded,
                PayoutStatus::Pending,
                false,
            )]))
            .when_action(PaymentAction::RequestRelease {
                payment_id: PaymentId::new("p-1"),
            })
            .then_state_unchanged_except(|state| state.last_error = None)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::<OrderAction>::None], 1);
        assertions::assert_effects_count::<OrderAction>(&[], 0);
        assertions::assert_no_effects::<OrderAction>(&[Effect::None]);
    }
}
