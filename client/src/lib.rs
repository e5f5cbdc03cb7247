//! # Marketplace Admin Client
//!
//! HTTP implementation of [`AdminBackend`](order_lifecycle::AdminBackend)
//! for the marketplace REST backend.
//!
//! ## Example
//!
//! ```no_run
//! use marketplace_admin_client::AdminClient;
//! use order_lifecycle::OrderQuery;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MARKETPLACE_API_URL, MARKETPLACE_API_TOKEN, MARKETPLACE_API_TIMEOUT_SECS
//!     let client = AdminClient::from_env()?;
//!
//!     let page = client.list_orders(&OrderQuery::default()).await?;
//!     println!("{} orders", page.pagination.total);
//!     Ok(())
//! }
//! ```
//!
//! Status strings travel bit-exact (`in_progress`), amounts as decimal major
//! units, and every request carries the configured bearer credential.

pub mod client;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use client::AdminClient;
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use error::ClientError;
