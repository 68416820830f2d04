#![doc(test(attr(deny(warnings))))]

//! Rental Ledger models a per-property income and expense grid: one cell per
//! category and month, formulas, visibility-aware totals and per-year
//! snapshots, plus a line-oriented shell that drives it.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Rental Ledger tracing initialized.");
    });
}
