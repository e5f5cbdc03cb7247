//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use order_lifecycle::{
    OrderFilters, OrderId, OrderQuery, OrderStatus, PaymentFilters, PaymentId, PaymentQuery,
    PaymentStatus, PayoutStatus, SortDirection,
};

/// Back office for marketplace orders and payments
#[derive(Debug, Parser)]
#[command(
    name = "marketplace-admin",
    version,
    about = "Back office for marketplace orders and payments"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Order lifecycle
    Orders {
        #[command(subcommand)]
        cmd: OrdersCmd,
    },
    /// Payments and fund release
    Payments {
        #[command(subcommand)]
        cmd: PaymentsCmd,
    },
}

#[derive(Debug, Subcommand)]
pub enum OrdersCmd {
    /// List one page of orders
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Only orders with this status
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Move an order to another status
    SetStatus {
        order_id: String,
        status: OrderStatus,
    },
    /// Cancel an order
    Cancel {
        order_id: String,
        /// Confirm the cancellation
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum PaymentsCmd {
    /// List one page of payments
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Only payments with this status
        #[arg(long)]
        status: Option<PaymentStatus>,
        /// Only payments with this payout status
        #[arg(long)]
        payout_status: Option<PayoutStatus>,
    },
    /// Release held funds to the freelancer (irreversible)
    Release {
        payment_id: String,
        /// Confirm the release
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

/// Paging, search and sort shared by both lists
#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = order_lifecycle::listing::DEFAULT_LIMIT)]
    pub limit: u32,
    /// Free-text search
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long, default_value = order_lifecycle::listing::DEFAULT_SORT_FIELD)]
    pub sort_by: String,
    /// `asc` or `desc`
    #[arg(long, default_value_t = SortDirection::Desc)]
    pub order: SortDirection,
}

impl PageArgs {
    fn query<F>(self, filters: F) -> order_lifecycle::ListQuery<F> {
        order_lifecycle::ListQuery {
            page: self.page.max(1),
            limit: self.limit.max(1),
            search: self.search,
            filters,
            sort_by: self.sort_by,
            order: self.order,
        }
    }

    /// Order list query for these arguments
    pub fn order_query(self, status: Option<OrderStatus>) -> OrderQuery {
        self.query(OrderFilters { status })
    }

    /// Payment list query for these arguments
    pub fn payment_query(
        self,
        status: Option<PaymentStatus>,
        payout_status: Option<PayoutStatus>,
    ) -> PaymentQuery {
        self.query(PaymentFilters {
            status,
            payout_status,
        })
    }
}

/// Trimmed, non-empty order id
pub fn order_id(raw: &str) -> anyhow::Result<OrderId> {
    let raw = raw.trim();
    anyhow::ensure!(!raw.is_empty(), "order id must not be empty");
    Ok(OrderId::new(raw))
}

/// Trimmed, non-empty payment id
pub fn payment_id(raw: &str) -> anyhow::Result<PaymentId> {
    let raw = raw.trim();
    anyhow::ensure!(!raw.is_empty(), "payment id must not be empty");
    Ok(PaymentId::new(raw))
}
