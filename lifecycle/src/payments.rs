//! Payments screen: the payment list and the release gate controller.
//!
//! # Release flow
//!
//! 1. Operator confirms a release of a payment the gate offers
//! 2. Payment is marked releasing (busy)
//! 3. Effect re-fetches the payment and re-checks the gate on the fresh snapshot
//! 4. If the gate still holds, `POST /api/payments/release/{id}` is sent
//! 5. Success replaces the snapshot with `(transferred, completed)`
//!
//! A refusal at step 3 replaces the local snapshot with the fresh one. A
//! backend failure at any step leaves the local snapshot as it was. Nothing is
//! retried.

use crate::environment::{AdminBackend, AdminEnvironment};
use crate::error::{BackendError, ReleaseError};
use crate::listing::{Listing, PaymentFilters, PaymentQuery, QueryChange};
use crate::release;
use crate::types::{Payment, PaymentId, PaymentPage};
use marketplace_admin_core::effect::Effect;
use marketplace_admin_core::reducer::Reducer;
use marketplace_admin_core::{SmallVec, smallvec};
use std::collections::HashSet;
use std::marker::PhantomData;

/// State of the payments screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaymentsState {
    /// Current page of payments
    pub listing: Listing<Payment, PaymentFilters>,
    /// Payments with a release in flight
    pub releasing: HashSet<PaymentId>,
    /// Last error surfaced to the operator
    pub last_error: Option<String>,
}

impl PaymentsState {
    /// Loaded snapshot of `payment_id`
    #[must_use]
    pub fn payment(&self, payment_id: &PaymentId) -> Option<&Payment> {
        self.listing
            .rows
            .iter()
            .find(|payment| &payment.id == payment_id)
    }

    /// Whether a release for `payment_id` is in flight
    #[must_use]
    pub fn is_releasing(&self, payment_id: &PaymentId) -> bool {
        self.releasing.contains(payment_id)
    }

    /// Whether to offer the release action for `payment_id` right now
    #[must_use]
    pub fn can_release(&self, payment_id: &PaymentId) -> bool {
        !self.is_releasing(payment_id) && self.payment(payment_id).is_some_and(release::can_release)
    }
}

/// Actions of the payments screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentAction {
    // ========== List ==========
    /// Edit the list query and reload
    ChangeQuery(QueryChange<PaymentFilters>),

    /// Reload the current query
    Load,

    /// A page of payments arrived
    PageLoaded {
        /// Load this page answers
        generation: u64,
        /// The page
        page: PaymentPage,
    },

    /// Loading a page failed
    LoadFailed {
        /// Load this failure answers
        generation: u64,
        /// Cause
        error: BackendError,
    },

    // ========== Release ==========
    /// Release a payment (already confirmed by the operator)
    RequestRelease {
        /// Payment to release
        payment_id: PaymentId,
    },

    /// The fresh snapshot no longer passes the gate; nothing was sent
    ReleaseRefused {
        /// Snapshot fetched right before dispatch
        fresh: Payment,
        /// First unmet condition
        reason: ReleaseError,
    },

    /// The backend acknowledged the release
    Released {
        /// Snapshot the release was dispatched against
        payment: Payment,
    },

    /// Fetching or releasing failed
    ReleaseFailed {
        /// Payment that was being released
        payment_id: PaymentId,
        /// Cause
        error: BackendError,
    },

    /// Clear `last_error`
    DismissError,
}

/// Reducer of the payments screen
#[derive(Debug)]
pub struct PaymentReducer<B> {
    _backend: PhantomData<B>,
}

impl<B> PaymentReducer<B> {
    /// Creates a new payment reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B> Default for PaymentReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for PaymentReducer<B> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<B> PaymentReducer<B>
where
    B: AdminBackend + Clone + 'static,
{
    /// Validates a release request against the loaded snapshot
    fn validate(state: &PaymentsState, payment_id: &PaymentId) -> Result<(), ReleaseError> {
        let payment = state
            .payment(payment_id)
            .ok_or_else(|| ReleaseError::NotLoaded(payment_id.clone()))?;

        if state.is_releasing(payment_id) {
            return Err(ReleaseError::InFlight(payment_id.clone()));
        }

        release::check_release(payment)
    }

    fn load_effect(state: &mut PaymentsState, env: &AdminEnvironment<B>) -> Effect<PaymentAction> {
        let generation = state.listing.begin_load();
        let query: PaymentQuery = state.listing.query.clone();
        let backend = env.backend.clone();

        Effect::future(async move {
            match backend.list_payments(&query).await {
                Ok(page) => Some(PaymentAction::PageLoaded { generation, page }),
                Err(error) => Some(PaymentAction::LoadFailed { generation, error }),
            }
        })
    }

    fn release_effect(env: &AdminEnvironment<B>, payment_id: PaymentId) -> Effect<PaymentAction> {
        let backend = env.backend.clone();

        Effect::future(async move {
            let fresh = match backend.fetch_payment(&payment_id).await {
                Ok(fresh) => fresh,
                Err(error) => return Some(PaymentAction::ReleaseFailed { payment_id, error }),
            };

            if let Err(reason) = release::check_release(&fresh) {
                return Some(PaymentAction::ReleaseRefused { fresh, reason });
            }

            match backend.release_payment(&payment_id).await {
                Ok(()) => Some(PaymentAction::Released { payment: fresh }),
                Err(error) => Some(PaymentAction::ReleaseFailed { payment_id, error }),
            }
        })
    }

    fn warn_unbalanced(payments: &[Payment]) {
        for payment in payments.iter().filter(|p| !p.is_balanced()) {
            tracing::warn!(
                payment_id = %payment.id,
                amount = %payment.amount,
                freelancer_amount = %payment.freelancer_amount,
                platform_fees = %payment.platform_fees,
                "Payment amount does not equal freelancer amount plus platform fees"
            );
        }
    }
}

impl<B> Reducer for PaymentReducer<B>
where
    B: AdminBackend + Clone + 'static,
{
    type State = PaymentsState;
    type Action = PaymentAction;
    type Environment = AdminEnvironment<B>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== List ==========
            PaymentAction::ChangeQuery(change) => {
                let query = std::mem::take(&mut state.listing.query);
                state.listing.query = query.apply(change);
                smallvec![Self::load_effect(state, env)]
            },

            PaymentAction::Load => smallvec![Self::load_effect(state, env)],

            PaymentAction::PageLoaded { generation, page } => {
                Self::warn_unbalanced(&page.payments);
                if !state
                    .listing
                    .accept(generation, page.payments, page.pagination)
                {
                    tracing::debug!(generation, "Dropping stale payments page");
                }
                smallvec![Effect::None]
            },

            PaymentAction::LoadFailed { generation, error } => {
                if state.listing.fail(generation) {
                    tracing::error!("Loading payments failed: {error}");
                    state.last_error = Some(error.to_string());
                }
                smallvec![Effect::None]
            },

            // ========== Release ==========
            PaymentAction::RequestRelease { payment_id } => {
                if let Err(error) = Self::validate(state, &payment_id) {
                    tracing::warn!(payment_id = %payment_id, "Release rejected: {error}");
                    state.last_error = Some(error.to_string());
                    return smallvec![Effect::None];
                }

                state.releasing.insert(payment_id.clone());
                state.last_error = None;
                tracing::debug!(payment_id = %payment_id, "Re-checking payment before release");
                smallvec![Self::release_effect(env, payment_id)]
            },

            PaymentAction::ReleaseRefused { fresh, reason } => {
                state.releasing.remove(&fresh.id);
                tracing::warn!(payment_id = %fresh.id, "Release refused on fresh snapshot: {reason}");
                state.last_error = Some(format!("Release not performed: {reason}"));
                let id = fresh.id.clone();
                state.listing.replace_row(|p| p.id == id, fresh);
                smallvec![Effect::None]
            },

            PaymentAction::Released { payment } => {
                state.releasing.remove(&payment.id);
                let id = payment.id.clone();
                if !state.listing.replace_row(|p| p.id == id, payment.released()) {
                    tracing::debug!(payment_id = %id, "Released payment no longer on the page");
                }
                tracing::info!(payment_id = %id, "Payment released to freelancer");
                smallvec![Effect::None]
            },

            PaymentAction::ReleaseFailed { payment_id, error } => {
                state.releasing.remove(&payment_id);
                tracing::error!(payment_id = %payment_id, "Release failed: {error}");
                state.last_error = Some(error.to_string());
                smallvec![Effect::None]
            },

            PaymentAction::DismissError => {
                state.last_error = None;
                smallvec![Effect::None]
            },
        }
    }
}
