//! FlatMoney tracks the monthly revenue, expenses and partner split of a
//! short-stay rental flat. This crate is the application layer: tracing
//! setup, the unified error type and the `flatmoney_cli` command line.

pub mod cli;
pub mod errors;
pub mod utils;

pub use errors::AppError;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("FlatMoney tracing initialized.");
    });
}
