//! `payments` subcommands.

use crate::cli::{self, PaymentsCmd};
use anyhow::{Context, Result, bail};
use marketplace_admin_client::AdminClient;
use marketplace_admin_runtime::Store;
use order_lifecycle::{
    AdminEnvironment, Pagination, Payment, PaymentAction, PaymentId, PaymentReducer,
    PaymentsState, check_release,
};

type PaymentStore = Store<
    PaymentsState,
    PaymentAction,
    AdminEnvironment<AdminClient>,
    PaymentReducer<AdminClient>,
>;

fn store(client: AdminClient, state: PaymentsState) -> PaymentStore {
    Store::new(state, PaymentReducer::new(), AdminEnvironment::new(client))
}

async fn dispatch(store: &PaymentStore, action: PaymentAction) -> Result<PaymentsState> {
    let mut handle = store.send(action).await.context("store rejected the action")?;
    handle.wait().await;
    let state = store.state(Clone::clone).await;
    if let Some(error) = &state.last_error {
        bail!("{error}");
    }
    Ok(state)
}

fn party(payment: &Payment) -> String {
    let freelancer = &payment.order.freelancer;
    let name = freelancer.name.as_deref().unwrap_or(freelancer.id.as_str());
    if freelancer.payout_destination_configured {
        name.to_string()
    } else {
        format!("{name} (no payout destination)")
    }
}

fn print_payments(state: &PaymentsState) {
    let pagination = state.listing.pagination;
    println!(
        "{:<26} {:<12} {:<11} {:>10} {:>10} {:>9}  {:<7} {}",
        "ID", "STATUS", "PAYOUT", "AMOUNT", "PAYOUT AMT", "FEES", "RELEASE", "FREELANCER"
    );
    for payment in &state.listing.rows {
        println!(
            "{:<26} {:<12} {:<11} {:>10} {:>10} {:>9}  {:<7} {}",
            payment.id.to_string(),
            payment.status.to_string(),
            payment.payout_status.to_string(),
            payment.amount.to_string(),
            payment.freelancer_amount.to_string(),
            payment.platform_fees.to_string(),
            if state.can_release(&payment.id) { "yes" } else { "-" },
            party(payment),
        );
    }
    println!(
        "page {}/{} ({} payments)",
        pagination.page, pagination.pages, pagination.total
    );
}

async fn release(client: AdminClient, payment_id: PaymentId, yes: bool) -> Result<()> {
    let payment = client
        .fetch_payment(&payment_id)
        .await
        .with_context(|| format!("fetching payment {payment_id}"))?;
    check_release(&payment)?;

    if !yes {
        bail!(
            "releasing {} to the freelancer of payment {payment_id} is irreversible; pass --yes",
            payment.freelancer_amount
        );
    }

    let mut state = PaymentsState::default();
    let generation = state.listing.begin_load();
    let _ = state
        .listing
        .accept(generation, vec![payment], Pagination::default());

    let store = store(client, state);
    let state = dispatch(
        &store,
        PaymentAction::RequestRelease {
            payment_id: payment_id.clone(),
        },
    )
    .await?;

    if let Some(payment) = state.payment(&payment_id) {
        println!(
            "Payment {payment_id} is {} (payout {})",
            payment.status, payment.payout_status
        );
    }
    Ok(())
}

/// Run one `payments` subcommand
///
/// # Errors
///
/// Returns the local rejection or backend failure that stopped the command
pub async fn run(client: AdminClient, cmd: PaymentsCmd) -> Result<()> {
    match cmd {
        PaymentsCmd::List {
            page,
            status,
            payout_status,
        } => {
            let mut state = PaymentsState::default();
            state.listing.query = page.payment_query(status, payout_status);
            let state = dispatch(&store(client, state), PaymentAction::Load).await?;
            print_payments(&state);
            Ok(())
        },
        PaymentsCmd::Release { payment_id, yes } => {
            release(client, cli::payment_id(&payment_id)?, yes).await
        },
    }
}
