pub mod config;
pub mod error;
pub mod ledger;
pub mod report;

pub use config::Config;
pub use error::{LedgerError, Result};
pub use ledger::{parse_decimal, Snapshot};
pub use report::{compute_report, Report};
