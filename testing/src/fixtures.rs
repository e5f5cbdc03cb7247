//! Fixture builders for orders, payments and screen states.

use chrono::{DateTime, Duration, Utc};
use order_lifecycle::{
    Money, Order, OrderId, OrderPaymentStatus, OrderStatus, OrdersState, Pagination, Payment,
    PaymentId, PaymentOrderRef, PaymentStatus, PaymentsState, PayoutStatus, UserRef,
};

/// Fixed reference time (2025-01-01 00:00:00 UTC)
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_089)
}

/// A paid order for 150.00 between `client-1` and `freelancer-1`
#[must_use]
pub fn order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: OrderId::new(id),
        status,
        payment_status: OrderPaymentStatus::Paid,
        price: Money::from_cents(15_000),
        client: UserRef::new("client-1").named("Ana Client"),
        freelancer: UserRef::new("freelancer-1").named("Bo Freelancer"),
        created_at: Some(epoch()),
    }
}

/// A payment of 150.00 (135.00 to the freelancer, 15.00 platform fees)
#[must_use]
pub fn payment(
    id: &str,
    status: PaymentStatus,
    payout_status: PayoutStatus,
    payout_destination_configured: bool,
) -> Payment {
    Payment {
        id: PaymentId::new(id),
        status,
        payout_status,
        amount: Money::from_cents(15_000),
        freelancer_amount: Money::from_cents(13_500),
        platform_fees: Money::from_cents(1_500),
        order: PaymentOrderRef {
            id: OrderId::new(format!("order-of-{id}")),
            freelancer: UserRef::new("freelancer-1")
                .named("Bo Freelancer")
                .with_payout_destination(payout_destination_configured),
            client: Some(UserRef::new("client-1")),
        },
        created_at: Some(epoch()),
    }
}

/// A payment the release gate accepts
#[must_use]
pub fn releasable_payment(id: &str) -> Payment {
    payment(id, PaymentStatus::Succeeded, PayoutStatus::Pending, true)
}

fn single_page(total: usize) -> Pagination {
    Pagination {
        page: 1,
        pages: 1,
        total: total as u64,
    }
}

/// Orders screen with `orders` already loaded as page 1
#[must_use]
pub fn orders_state(orders: Vec<Order>) -> OrdersState {
    let mut state = OrdersState::default();
    let generation = state.listing.begin_load();
    let pagination = single_page(orders.len());
    state.listing.accept(generation, orders, pagination);
    state
}

/// Payments screen with `payments` already loaded as page 1
#[must_use]
pub fn payments_state(payments: Vec<Payment>) -> PaymentsState {
    let mut state = PaymentsState::default();
    let generation = state.listing.begin_load();
    let pagination = single_page(payments.len());
    state.listing.accept(generation, payments, pagination);
    state
}
