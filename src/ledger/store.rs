use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::ledger::naming::batch_name;
use crate::ledger::records::{Expense, Payment, Purchase, Sale, Snapshot};

/// The four record collections, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Purchases,
    Sales,
    Expenses,
    Payments,
}

impl Bucket {
    pub fn parse(raw: &str) -> Result<Bucket> {
        match raw.to_lowercase().as_str() {
            "purchases" | "purchase" | "batches" | "batch" => Ok(Bucket::Purchases),
            "sales" | "sale" => Ok(Bucket::Sales),
            "expenses" | "expense" => Ok(Bucket::Expenses),
            "payments" | "payment" => Ok(Bucket::Payments),
            _ => Err(LedgerError::UnknownBucket(raw.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Purchases => "purchases",
            Bucket::Sales => "sales",
            Bucket::Expenses => "expenses",
            Bucket::Payments => "payments",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Load the ledger document. A missing file is an empty ledger; a file
/// that is not valid JSON is an error. Shape problems inside valid JSON
/// are absorbed by the record deserializers.
pub fn load_ledger(path: &PathBuf) -> Result<Snapshot> {
    if !path.exists() {
        return Ok(Snapshot::default());
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| LedgerError::LedgerParse {
        path: path.clone(),
        source: e,
    })
}

/// Write the ledger document as pretty-printed JSON.
pub fn save_ledger(path: &PathBuf, data: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(data).map_err(|e| {
        LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    fs::write(path, content)?;
    Ok(())
}

fn next_id() -> String {
    Uuid::new_v4().to_string()
}

fn same_day_count(data: &Snapshot, date: NaiveDate) -> u32 {
    data.purchases
        .iter()
        .filter(|p| p.date == Some(date))
        .count() as u32
}

/// Record a purchase, opening a new batch. The batch name is frozen here:
/// purchases recorded later on the same day get "-02", "-03", ... suffixes,
/// and renaming or deleting earlier purchases never renumbers this one.
pub fn add_purchase(data: &mut Snapshot, date: Option<NaiveDate>, quantity: f64, unit_price: f64) -> String {
    let sequence = match date {
        Some(day) => same_day_count(data, day) + 1,
        None => 1,
    };
    let id = next_id();
    data.purchases.push(Purchase {
        id: id.clone(),
        date,
        quantity,
        unit_price,
        batch_sequence: Some(sequence),
        batch_name: Some(batch_name(date, sequence)),
    });
    id
}

pub fn add_sale(
    data: &mut Snapshot,
    date: Option<NaiveDate>,
    batch_id: &str,
    customer: &str,
    quantity: f64,
    unit_price: f64,
) -> String {
    let id = next_id();
    data.sales.push(Sale {
        id: id.clone(),
        date,
        batch_id: batch_id.to_string(),
        customer: customer.to_string(),
        quantity,
        unit_price,
    });
    id
}

pub fn add_expense(
    data: &mut Snapshot,
    date: Option<NaiveDate>,
    batch_id: &str,
    name: &str,
    amount: f64,
) -> String {
    let id = next_id();
    data.expenses.push(Expense {
        id: id.clone(),
        date,
        batch_id: batch_id.to_string(),
        name: name.to_string(),
        amount,
    });
    id
}

pub fn add_payment(data: &mut Snapshot, date: Option<NaiveDate>, customer: &str, amount: f64) -> String {
    let id = next_id();
    data.payments.push(Payment {
        id: id.clone(),
        date,
        customer: customer.to_string(),
        amount,
    });
    id
}

/// Remove one record by exact id. Deleting a purchase never cascades:
/// sales and expenses that referenced it simply become dangling.
pub fn delete_record(data: &mut Snapshot, bucket: Bucket, id: &str) -> bool {
    match bucket {
        Bucket::Purchases => {
            let before = data.purchases.len();
            data.purchases.retain(|r| r.id != id);
            data.purchases.len() < before
        }
        Bucket::Sales => {
            let before = data.sales.len();
            data.sales.retain(|r| r.id != id);
            data.sales.len() < before
        }
        Bucket::Expenses => {
            let before = data.expenses.len();
            data.expenses.retain(|r| r.id != id);
            data.expenses.len() < before
        }
        Bucket::Payments => {
            let before = data.payments.len();
            data.payments.retain(|r| r.id != id);
            data.payments.len() < before
        }
    }
}

/// Rewrite an imported snapshot with fresh ids. Purchases are rekeyed
/// first so that sales and expenses can follow their batch across the
/// rename; a reference that was already dangling in the import stays
/// dangling.
pub fn adopt_snapshot(incoming: Snapshot) -> Snapshot {
    let mut id_map: HashMap<String, String> = HashMap::new();
    let mut adopted = Snapshot::default();

    for mut purchase in incoming.purchases {
        let fresh = next_id();
        if !purchase.id.is_empty() {
            id_map.insert(purchase.id.clone(), fresh.clone());
        }
        purchase.id = fresh;
        adopted.purchases.push(purchase);
    }
    for mut sale in incoming.sales {
        sale.id = next_id();
        if let Some(mapped) = id_map.get(&sale.batch_id) {
            sale.batch_id = mapped.clone();
        }
        adopted.sales.push(sale);
    }
    for mut expense in incoming.expenses {
        expense.id = next_id();
        if let Some(mapped) = id_map.get(&expense.batch_id) {
            expense.batch_id = mapped.clone();
        }
        adopted.expenses.push(expense);
    }
    for mut payment in incoming.payments {
        payment.id = next_id();
        adopted.payments.push(payment);
    }
    adopted
}
