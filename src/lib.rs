//! VetPay domain core: accounts, pets, and conflict-safe appointment booking.
//!
//! The surrounding portal (page rendering, HTTP handlers, session/OAuth) sits
//! outside this crate. It supplies an authenticated [`identity::Identity`]
//! and calls plain functions over a [`rusqlite::Connection`] opened through
//! [`db::sqlite::open_database`]. The one hard invariant lives in
//! [`booking`]: at most one appointment per (date, time) slot.

pub mod accounts;
pub mod booking;
pub mod config;
pub mod db;
pub mod identity;
pub mod models;
pub mod pets;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and integration harnesses.
///
/// Respects `RUST_LOG`; falls back to the crate default filter. Safe to call
/// once per process.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} core v{}", config::APP_NAME, config::APP_VERSION);
}
