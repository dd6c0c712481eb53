use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::{display_name, Snapshot};

/// Placeholder customer key for sales and payments recorded without a name.
pub const NO_CUSTOMER: &str = "(noname)";

/// Costing and stock figures for one batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStat {
    pub batch_id: String,
    pub batch_name: String,
    pub date: Option<NaiveDate>,
    pub purchased_qty: f64,
    pub unit_cost: f64,
    pub sold_qty: f64,
    pub revenue: f64,
    /// Sold quantity valued at this batch's own unit cost.
    pub cogs: f64,
    /// Expenses charged against this batch in full, never prorated
    /// between sold and remaining units.
    pub expenses_total: f64,
    pub profit: f64,
    /// Remaining quantity, never below zero.
    pub stock: f64,
    pub stock_cost: f64,
    /// True when more was sold out of this batch than was purchased.
    pub over_sold: bool,
}

/// Invoiced-versus-paid position for one customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDebt {
    pub customer: String,
    pub invoiced: f64,
    pub paid: f64,
    /// Negative when the customer has paid more than was invoiced.
    pub balance: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub revenue: f64,
    pub cogs: f64,
    pub expenses_total: f64,
    pub profit: f64,
    pub paid_total: f64,
    /// Sum of positive customer balances only. Credit with one customer
    /// never offsets debt owed by another.
    pub unpaid_total: f64,
    pub stock_qty: f64,
    pub stock_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub per_batch: Vec<BatchStat>,
    pub customer_debts: Vec<CustomerDebt>,
    pub totals: Totals,
}

/// Compute the full report from a snapshot of the four collections.
///
/// This is a pure calculation: no records are read from or written to
/// disk, and every input produces a report. Sales and expenses whose
/// batch id matches no purchase are skipped in batch statistics; such
/// sales still invoice their customer, while such expenses count toward
/// nothing.
pub fn compute_report(data: &Snapshot) -> Report {
    let per_batch = batch_stats(data);
    let customer_debts = customer_debts(data);
    let totals = roll_up(&per_batch, &customer_debts);
    Report {
        per_batch,
        customer_debts,
        totals,
    }
}

fn batch_stats(data: &Snapshot) -> Vec<BatchStat> {
    let mut stats: Vec<BatchStat> = data
        .purchases
        .iter()
        .map(|purchase| BatchStat {
            batch_id: purchase.id.clone(),
            batch_name: display_name(purchase),
            date: purchase.date,
            purchased_qty: purchase.quantity,
            unit_cost: purchase.unit_price,
            sold_qty: 0.0,
            revenue: 0.0,
            cogs: 0.0,
            expenses_total: 0.0,
            profit: 0.0,
            stock: 0.0,
            stock_cost: 0.0,
            over_sold: false,
        })
        .collect();

    let index: HashMap<&str, usize> = data
        .purchases
        .iter()
        .enumerate()
        .map(|(i, purchase)| (purchase.id.as_str(), i))
        .collect();

    for sale in &data.sales {
        if let Some(&i) = index.get(sale.batch_id.as_str()) {
            stats[i].sold_qty += sale.quantity;
            stats[i].revenue += sale.amount();
        }
    }
    for expense in &data.expenses {
        if let Some(&i) = index.get(expense.batch_id.as_str()) {
            stats[i].expenses_total += expense.amount;
        }
    }

    for stat in &mut stats {
        stat.over_sold = stat.sold_qty > stat.purchased_qty;
        stat.stock = (stat.purchased_qty - stat.sold_qty).max(0.0);
        stat.cogs = stat.unit_cost * stat.sold_qty;
        stat.stock_cost = stat.stock * stat.unit_cost;
        stat.profit = stat.revenue - stat.cogs - stat.expenses_total;
    }
    stats
}

fn customer_key(raw: &str) -> &str {
    if raw.trim().is_empty() {
        NO_CUSTOMER
    } else {
        raw
    }
}

fn customer_debts(data: &Snapshot) -> Vec<CustomerDebt> {
    #[derive(Default)]
    struct Account {
        invoiced: f64,
        paid: f64,
    }

    let mut accounts: BTreeMap<&str, Account> = BTreeMap::new();
    // A sale invoices its customer whether or not its batch still exists
    for sale in &data.sales {
        accounts
            .entry(customer_key(&sale.customer))
            .or_default()
            .invoiced += sale.amount();
    }
    for payment in &data.payments {
        accounts
            .entry(customer_key(&payment.customer))
            .or_default()
            .paid += payment.amount;
    }

    accounts
        .into_iter()
        .map(|(customer, account)| CustomerDebt {
            customer: customer.to_string(),
            invoiced: account.invoiced,
            paid: account.paid,
            balance: account.invoiced - account.paid,
        })
        .collect()
}

fn roll_up(per_batch: &[BatchStat], customer_debts: &[CustomerDebt]) -> Totals {
    let mut totals = Totals::default();
    for stat in per_batch {
        totals.revenue += stat.revenue;
        totals.cogs += stat.cogs;
        totals.expenses_total += stat.expenses_total;
        totals.profit += stat.profit;
        totals.stock_qty += stat.stock;
        totals.stock_cost += stat.stock_cost;
    }
    for debt in customer_debts {
        totals.paid_total += debt.paid;
        totals.unpaid_total += debt.balance.max(0.0);
    }
    totals
}
