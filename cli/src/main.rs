//! `marketplace-admin`: operate the marketplace order lifecycle and payment
//! release from a terminal.
//!
//! Configuration comes from the environment (a `.env` file is loaded when
//! present):
//!
//! - `MARKETPLACE_API_URL` (default `http://localhost:5000`)
//! - `MARKETPLACE_API_TOKEN` (required)
//! - `MARKETPLACE_API_TIMEOUT_SECS` (default 30)
//!
//! Log verbosity follows `RUST_LOG`.

mod cli;
mod orders;
mod payments;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use marketplace_admin_client::AdminClient;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketplace_admin=info,order_lifecycle=info".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = AdminClient::from_env().context("loading the admin API configuration")?;
    tracing::debug!(base_url = %client.config().base_url, "Admin client ready");

    match cli.cmd {
        Command::Orders { cmd } => orders::run(client, cmd).await,
        Command::Payments { cmd } => payments::run(client, cmd).await,
    }
}
