mod engine;

pub use engine::{compute_report, BatchStat, CustomerDebt, Report, Totals, NO_CUSTOMER};
