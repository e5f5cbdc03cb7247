//! `orders` subcommands.

use crate::cli::{self, OrdersCmd};
use anyhow::{Context, Result, bail};
use marketplace_admin_client::AdminClient;
use marketplace_admin_runtime::Store;
use order_lifecycle::{
    AdminBackend, AdminEnvironment, CompletionNotice, Order, OrderAction, OrderId, OrderQuery,
    OrderReducer, OrderStatus, OrdersState, QueryChange, validate_transition,
};

type OrderStore<B> = Store<OrdersState, OrderAction, AdminEnvironment<B>, OrderReducer<B>>;

fn store<B>(backend: B, query: OrderQuery) -> OrderStore<B>
where
    B: AdminBackend + Clone + 'static,
{
    let mut state = OrdersState::default();
    state.listing.query = query;
    Store::new(state, OrderReducer::new(), AdminEnvironment::new(backend))
}

async fn dispatch<B>(store: &OrderStore<B>, action: OrderAction) -> Result<OrdersState>
where
    B: AdminBackend + Clone + 'static,
{
    let mut handle = store.send(action).await.context("store rejected the action")?;
    handle.wait().await;
    let state = store.state(Clone::clone).await;
    if let Some(error) = &state.last_error {
        bail!("{error}");
    }
    Ok(state)
}

/// Page size used when looking an order up through search
const LOOKUP_LIMIT: u32 = 100;

/// Load `order_id` into the store through a search on its id
///
/// There is no single-order endpoint, so this walks every page the search
/// returns until the id shows up.
async fn load_order<B>(store: &OrderStore<B>, order_id: &OrderId) -> Result<Order>
where
    B: AdminBackend + Clone + 'static,
{
    let mut state = dispatch(
        store,
        OrderAction::ChangeQuery(QueryChange::Search(order_id.to_string())),
    )
    .await?;
    loop {
        if let Some(order) = state.order(order_id) {
            return Ok(order.clone());
        }
        let pagination = state.listing.pagination;
        if pagination.page >= pagination.pages {
            bail!(
                "order {order_id} not found: searching orders for '{order_id}' returned {} \
                 result(s) without it",
                pagination.total
            );
        }
        state = dispatch(
            store,
            OrderAction::ChangeQuery(QueryChange::Page(pagination.page + 1)),
        )
        .await?;
    }
}

/// Store whose list query looks orders up by id
fn lookup_store<B>(backend: B) -> OrderStore<B>
where
    B: AdminBackend + Clone + 'static,
{
    store(
        backend,
        OrderQuery::default().apply(QueryChange::Limit(LOOKUP_LIMIT)),
    )
}

fn print_orders(state: &OrdersState) {
    let pagination = state.listing.pagination;
    println!(
        "{:<26} {:<12} {:<10} {:>10}  {:<20} {:<20}",
        "ID", "STATUS", "PAYMENT", "PRICE", "CLIENT", "FREELANCER"
    );
    for order in &state.listing.rows {
        println!(
            "{:<26} {:<12} {:<10} {:>10}  {:<20} {:<20}",
            order.id.to_string(),
            order.status.to_string(),
            order.payment_status.to_string(),
            order.price.to_string(),
            order.client.name.as_deref().unwrap_or(order.client.id.as_str()),
            order
                .freelancer
                .name
                .as_deref()
                .unwrap_or(order.freelancer.id.as_str()),
        );
    }
    println!(
        "page {}/{} ({} orders)",
        pagination.page, pagination.pages, pagination.total
    );
}

async fn set_status(client: AdminClient, order_id: OrderId, target: OrderStatus) -> Result<()> {
    let store = lookup_store(client);
    let order = load_order(&store, &order_id).await?;
    validate_transition(&order, target)?;

    if target == OrderStatus::Completed {
        println!("{}", CompletionNotice::for_order(&order).message());
    }

    let state = dispatch(
        &store,
        OrderAction::RequestTransition {
            order_id: order_id.clone(),
            target,
        },
    )
    .await?;
    let stored = state.order(&order_id).map_or(target, |order| order.status);
    if stored == target {
        println!("Order {order_id} is now {stored}");
    } else {
        println!("Order {order_id} is now {stored} (requested {target})");
    }
    Ok(())
}

async fn cancel(client: AdminClient, order_id: OrderId, yes: bool) -> Result<()> {
    let store = lookup_store(client);
    let order = load_order(&store, &order_id).await?;
    validate_transition(&order, OrderStatus::Cancelled)?;

    if !yes {
        bail!("cancelling order {order_id} ({}) needs --yes", order.status);
    }

    let state = dispatch(
        &store,
        OrderAction::RequestCancel {
            order_id: order_id.clone(),
        },
    )
    .await?;
    let stored = state
        .order(&order_id)
        .map_or(OrderStatus::Cancelled, |order| order.status);
    println!("Order {order_id} is now {stored}");
    Ok(())
}

/// Run one `orders` subcommand
///
/// # Errors
///
/// Returns the local rejection or backend failure that stopped the command
pub async fn run(client: AdminClient, cmd: OrdersCmd) -> Result<()> {
    match cmd {
        OrdersCmd::List { page, status } => {
            let store = store(client, page.order_query(status));
            let state = dispatch(&store, OrderAction::Load).await?;
            print_orders(&state);
            Ok(())
        },
        OrdersCmd::SetStatus { order_id, status } => {
            set_status(client, cli::order_id(&order_id)?, status).await
        },
        OrdersCmd::Cancel { order_id, yes } => cancel(client, cli::order_id(&order_id)?, yes).await,
    }
}
