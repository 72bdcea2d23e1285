//! sure-api: HTTP client for the Sure personal-finance API.

pub mod client;
pub mod transactions;

pub use client::{ClientConfig, Credential, SureClient};
pub use transactions::{fetch_transactions_window, normalize_transactions};
