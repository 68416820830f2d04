pub mod ledger_sheet;
pub mod services;
pub mod time;
pub mod utils;

pub use ledger_sheet::{LedgerSheet, LoadSource, SaveStatus};
pub use time::{Clock, FixedClock, SystemClock};
