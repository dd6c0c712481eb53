mod entry;
mod naming;
mod numeric;
mod records;
mod store;

pub use entry::{
    amount_from_input, date_from_input, price_from_input, quantity_from_input, resolve_unit_price,
};
pub use naming::{batch_name, display_name, UNDATED_BATCH};
pub use numeric::parse_decimal;
pub use records::{Expense, Payment, Purchase, Sale, Snapshot};
pub use store::{
    add_expense, add_payment, add_purchase, add_sale, adopt_snapshot, delete_record, load_ledger,
    save_ledger, Bucket,
};
