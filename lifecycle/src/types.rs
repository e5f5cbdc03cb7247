//! Core domain types for the admin lifecycle.
//!
//! Orders and payments are mirrored from the backend as immutable value
//! snapshots. A transition never edits a snapshot in place: it produces a new
//! one (see [`Order::with_status`] and [`Payment::released`]).
//!
//! Status strings are bit-exact with the backend (`in_progress`, not
//! `InProgress`) in both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "` from a string")]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the inner string value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Opaque backend identifier of an order
    OrderId
);
opaque_id!(
    /// Opaque backend identifier of a payment
    PaymentId
);
opaque_id!(
    /// Opaque backend identifier of a user (client or freelancer)
    UserId
);

/// Largest amount, in cents, accepted from the backend
const MAX_ABS_CENTS: f64 = 9.0e18;

/// Money amount in cents (to avoid floating point issues)
///
/// The backend speaks decimal major units (`49.99`); conversion happens at
/// the serde boundary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a new money amount from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a money amount from a decimal major-unit value, rounded to the cent
    ///
    /// Out-of-range values saturate; the serde boundary rejects them first.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // saturating float-to-int cast
    pub fn from_major(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    /// Sum of two amounts, `None` on overflow
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the value in cents
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in major units (as floating point)
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // i64 to f64 precision loss is acceptable for display
    pub fn major(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.major())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("monetary amount must be finite"));
        }
        if (value * 100.0).round().abs() > MAX_ABS_CENTS {
            return Err(serde::de::Error::custom(format!(
                "monetary amount {value} is out of range"
            )));
        }
        Ok(Self::from_major(value))
    }
}

/// Error returned when a status string is not one of the backend's values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownStatus {
    kind: &'static str,
    value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:tt) {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:tt ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            /// Every value, in lifecycle order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The exact string the backend uses for this value
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum!(
    /// Status of an order in its lifecycle
    OrderStatus("order status") {
        /// Purchased, waiting for the freelancer
        Pending => "pending",
        /// Accepted by the freelancer
        Accepted => "accepted",
        /// Work has started
        InProgress => "in_progress",
        /// Delivered and closed
        Completed => "completed",
        /// Cancelled
        Cancelled => "cancelled",
    }
);

impl OrderStatus {
    /// Terminal with respect to admin-driven transitions
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

wire_enum!(
    /// Payment state as reported on the order (informational only)
    OrderPaymentStatus("order payment status") {
        /// Not paid yet
        Unpaid => "unpaid",
        /// Checkout started
        Pending => "pending",
        /// Paid by the client
        Paid => "paid",
        /// Refunded to the client
        Refunded => "refunded",
    }
);

impl Default for OrderPaymentStatus {
    fn default() -> Self {
        Self::Unpaid
    }
}

wire_enum!(
    /// Status of a payment transaction
    PaymentStatus("payment status") {
        /// Awaiting the payment provider
        Pending => "pending",
        /// Funds captured and held by the platform
        Succeeded => "succeeded",
        /// Charge failed
        Failed => "failed",
        /// Funds transferred to the freelancer
        Transferred => "transferred",
    }
);

wire_enum!(
    /// Status of the freelancer payout for a payment
    PayoutStatus("payout status") {
        /// Funds still held
        Pending => "pending",
        /// Funds released to the freelancer
        Completed => "completed",
    }
);

/// Wire shapes a user reference can take: a bare id or a populated object
#[derive(Deserialize)]
#[serde(untagged)]
enum UserRefRepr {
    Id(UserId),
    Populated {
        #[serde(alias = "_id")]
        id: UserId,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
        #[serde(default, rename = "payoutDestinationConfigured")]
        payout_destination_configured: bool,
    },
}

/// Read-only reference to a client or freelancer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UserRefRepr", rename_all = "camelCase")]
pub struct UserRef {
    /// User identifier
    pub id: UserId,
    /// Display name, when populated
    pub name: Option<String>,
    /// Email, when populated
    pub email: Option<String>,
    /// Whether the user can receive payouts
    pub payout_destination_configured: bool,
}

impl UserRef {
    /// Creates a reference with only an id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: None,
            email: None,
            payout_destination_configured: false,
        }
    }

    /// Sets the display name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks whether a payout destination is configured
    #[must_use]
    pub const fn with_payout_destination(mut self, configured: bool) -> Self {
        self.payout_destination_configured = configured;
        self
    }
}

impl From<UserRefRepr> for UserRef {
    fn from(repr: UserRefRepr) -> Self {
        match repr {
            UserRefRepr::Id(id) => Self {
                id,
                name: None,
                email: None,
                payout_destination_configured: false,
            },
            UserRefRepr::Populated {
                id,
                name,
                email,
                payout_destination_configured,
            } => Self {
                id,
                name,
                email,
                payout_destination_configured,
            },
        }
    }
}

/// Snapshot of an order as last seen from the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order identifier
    #[serde(alias = "_id")]
    pub id: OrderId,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Payment state (informational, not authoritative over transitions)
    #[serde(default)]
    pub payment_status: OrderPaymentStatus,
    /// Agreed price
    pub price: Money,
    /// Buyer
    pub client: UserRef,
    /// Seller
    pub freelancer: UserRef,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns a new snapshot carrying `status`
    #[must_use]
    pub fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// The order a payment backs, as embedded in the payment resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderRef {
    /// Order identifier
    #[serde(alias = "_id")]
    pub id: OrderId,
    /// Seller who receives the payout
    pub freelancer: UserRef,
    /// Buyer, when populated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<UserRef>,
}

/// Snapshot of a payment as last seen from the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Payment identifier
    #[serde(alias = "_id")]
    pub id: PaymentId,
    /// Transaction status
    pub status: PaymentStatus,
    /// Freelancer payout status
    pub payout_status: PayoutStatus,
    /// Total charged to the client
    pub amount: Money,
    /// Share going to the freelancer
    #[serde(default)]
    pub freelancer_amount: Money,
    /// Share kept by the platform
    #[serde(default)]
    pub platform_fees: Money,
    /// Backing order
    pub order: PaymentOrderRef,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Returns the snapshot after a successful release
    #[must_use]
    pub fn released(&self) -> Self {
        Self {
            status: PaymentStatus::Transferred,
            payout_status: PayoutStatus::Completed,
            ..self.clone()
        }
    }

    /// `amount == freelancerAmount + platformFees`
    ///
    /// Not enforced; the backend is trusted to keep it.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.freelancer_amount
            .checked_add(self.platform_fees)
            .is_some_and(|sum| sum == self.amount)
    }
}

/// Page cursor returned by the list endpoints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page (1-based)
    pub page: u32,
    /// Number of pages
    pub pages: u32,
    /// Number of matching rows
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            pages: 1,
            total: 0,
        }
    }
}

/// One page of `GET /api/admin/orders`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPage {
    /// Rows on this page
    pub orders: Vec<Order>,
    /// Cursor
    #[serde(default)]
    pub pagination: Pagination,
}

/// One page of `GET /api/admin/payments`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPage {
    /// Rows on this page
    pub payments: Vec<Payment>,
    /// Cursor
    #[serde(default)]
    pub pagination: Pagination,
}

/// The authoritative status the backend reports after a status update
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEcho {
    /// Status as stored by the backend
    pub status: OrderStatus,
}
