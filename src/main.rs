mod config;
mod error;
mod ledger;
mod report;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use crate::config::{config_dir, data_file_path, load_config, Config, CONFIG_TEMPLATE};
use crate::error::{LedgerError, Result};
use crate::ledger::{
    add_expense, add_payment, add_purchase, add_sale, adopt_snapshot, amount_from_input,
    batch_name, date_from_input, delete_record, display_name, load_ledger, price_from_input,
    quantity_from_input, resolve_unit_price, save_ledger, Bucket, Snapshot,
};
use crate::report::{compute_report, BatchStat, NO_CUSTOMER};

#[derive(Parser)]
#[command(name = "batchbook")]
#[command(version, about = "Minimal CLI batch-costing ledger", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.batchbook or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config and empty ledger
    Init,

    /// Record a purchase, opening a new batch
    AddPurchase {
        /// Quantity purchased (decimal comma or period)
        #[arg(short, long)]
        qty: String,

        /// Price per unit
        #[arg(short, long)]
        price: Option<String>,

        /// Total cost (used to derive unit price when --price is absent)
        #[arg(short, long)]
        total: Option<String>,

        /// Purchase date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a sale against a batch
    AddSale {
        /// Batch name, id, or index from 'list purchases'
        #[arg(short, long)]
        batch: String,

        /// Customer name (default: none)
        #[arg(short, long)]
        customer: Option<String>,

        /// Quantity sold
        #[arg(short, long)]
        qty: String,

        /// Price per unit
        #[arg(short, long)]
        price: Option<String>,

        /// Total amount (used to derive unit price when --price is absent)
        #[arg(short, long)]
        total: Option<String>,

        /// Sale date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record an expense against a batch
    AddExpense {
        /// Batch name, id, or index from 'list purchases'
        #[arg(short, long)]
        batch: String,

        /// What the expense was for
        #[arg(short, long)]
        name: Option<String>,

        /// Expense amount
        #[arg(short, long)]
        amount: String,

        /// Expense date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a payment received from a customer
    AddPayment {
        /// Customer name (default: none)
        #[arg(short, long)]
        customer: Option<String>,

        /// Payment amount
        #[arg(short, long)]
        amount: String,

        /// Payment date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Change fields on an existing purchase
    EditPurchase {
        /// Batch name, id, or index from 'list purchases'
        reference: String,

        /// New quantity
        #[arg(long)]
        qty: Option<String>,

        /// New unit price
        #[arg(long)]
        price: Option<String>,

        /// New purchase date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Rebuild the batch name from the purchase date
        #[arg(long)]
        rename: bool,
    },

    /// Change fields on an existing sale
    EditSale {
        /// Sale id or index from 'list sales'
        reference: String,

        /// Move the sale to another batch
        #[arg(long)]
        batch: Option<String>,

        /// New customer name
        #[arg(long)]
        customer: Option<String>,

        /// New quantity
        #[arg(long)]
        qty: Option<String>,

        /// New unit price
        #[arg(long)]
        price: Option<String>,

        /// New sale date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Change fields on an existing expense
    EditExpense {
        /// Expense id or index from 'list expenses'
        reference: String,

        /// Move the expense to another batch
        #[arg(long)]
        batch: Option<String>,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New amount
        #[arg(long)]
        amount: Option<String>,

        /// New expense date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Change fields on an existing payment
    EditPayment {
        /// Payment id or index from 'list payments'
        reference: String,

        /// New customer name
        #[arg(long)]
        customer: Option<String>,

        /// New amount
        #[arg(long)]
        amount: Option<String>,

        /// New payment date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a record (deleting a purchase never deletes its sales or expenses)
    Delete {
        /// Collection: purchases, sales, expenses, or payments
        bucket: String,

        /// Record id, index from 'list', or batch name for purchases
        reference: String,
    },

    /// List records in a collection
    List {
        /// Collection: purchases, sales, expenses, or payments
        bucket: String,

        /// Number of records to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show per-batch costing, customer balances, and overall totals
    Report {
        /// Print the report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Show ledger status and headline figures
    Status,

    /// Export the full ledger to a JSON file
    Export {
        /// Output file (default: batchbook-export-YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import records from a JSON export
    Import {
        /// JSON file to import
        file: PathBuf,

        /// Add to the existing ledger instead of replacing it
        #[arg(long)]
        merge: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::AddPurchase {
            qty,
            price,
            total,
            date,
        } => cmd_add_purchase(&cfg_dir, &qty, price.as_deref(), total.as_deref(), date.as_deref()),
        Commands::AddSale {
            batch,
            customer,
            qty,
            price,
            total,
            date,
        } => cmd_add_sale(
            &cfg_dir,
            &batch,
            customer.as_deref(),
            &qty,
            price.as_deref(),
            total.as_deref(),
            date.as_deref(),
        ),
        Commands::AddExpense {
            batch,
            name,
            amount,
            date,
        } => cmd_add_expense(&cfg_dir, &batch, name.as_deref(), &amount, date.as_deref()),
        Commands::AddPayment {
            customer,
            amount,
            date,
        } => cmd_add_payment(&cfg_dir, customer.as_deref(), &amount, date.as_deref()),
        Commands::EditPurchase {
            reference,
            qty,
            price,
            date,
            rename,
        } => cmd_edit_purchase(
            &cfg_dir,
            &reference,
            qty.as_deref(),
            price.as_deref(),
            date.as_deref(),
            rename,
        ),
        Commands::EditSale {
            reference,
            batch,
            customer,
            qty,
            price,
            date,
        } => cmd_edit_sale(
            &cfg_dir,
            &reference,
            batch.as_deref(),
            customer.as_deref(),
            qty.as_deref(),
            price.as_deref(),
            date.as_deref(),
        ),
        Commands::EditExpense {
            reference,
            batch,
            name,
            amount,
            date,
        } => cmd_edit_expense(
            &cfg_dir,
            &reference,
            batch.as_deref(),
            name.as_deref(),
            amount.as_deref(),
            date.as_deref(),
        ),
        Commands::EditPayment {
            reference,
            customer,
            amount,
            date,
        } => cmd_edit_payment(
            &cfg_dir,
            &reference,
            customer.as_deref(),
            amount.as_deref(),
            date.as_deref(),
        ),
        Commands::Delete { bucket, reference } => cmd_delete(&cfg_dir, &bucket, &reference),
        Commands::List { bucket, limit } => cmd_list(&cfg_dir, &bucket, limit),
        Commands::Report { json } => cmd_report(&cfg_dir, json),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Export { output } => cmd_export(&cfg_dir, output),
        Commands::Import { file, merge } => cmd_import(&cfg_dir, &file, merge),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &PathBuf) -> Result<()> {
    if cfg_dir.exists() {
        return Err(LedgerError::AlreadyInitialized(cfg_dir.clone()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    let config = load_config(cfg_dir)?;
    let data_path = data_file_path(&config, cfg_dir);
    save_ledger(&data_path, &Snapshot::default())?;

    println!("Initialized batchbook config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Adjust currency if needed:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Record your first batch:   batchbook add-purchase --qty 10 --price 5");
    println!("  3. See where you stand:       batchbook report");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct PurchaseRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "BATCH")]
    batch: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "QTY")]
    qty: String,
    #[tabled(rename = "UNIT COST")]
    unit_cost: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct SaleRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "BATCH")]
    batch: String,
    #[tabled(rename = "CUSTOMER")]
    customer: String,
    #[tabled(rename = "QTY")]
    qty: String,
    #[tabled(rename = "PRICE")]
    price: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "BATCH")]
    batch: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct PaymentRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "CUSTOMER")]
    customer: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "BATCH")]
    batch: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "BOUGHT")]
    bought: String,
    #[tabled(rename = "SOLD")]
    sold: String,
    #[tabled(rename = "STOCK")]
    stock: String,
    #[tabled(rename = "REVENUE")]
    revenue: String,
    #[tabled(rename = "COGS")]
    cogs: String,
    #[tabled(rename = "EXPENSES")]
    expenses: String,
    #[tabled(rename = "PROFIT")]
    profit: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "CUSTOMER")]
    customer: String,
    #[tabled(rename = "INVOICED")]
    invoiced: String,
    #[tabled(rename = "PAID")]
    paid: String,
    #[tabled(rename = "BALANCE")]
    balance: String,
}

fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Format a money amount with two decimal places and thousands separators
fn format_amount(value: f64) -> String {
    let rounded = format!("{:.2}", value);
    let parts: Vec<&str> = rounded.split('.').collect();
    let whole = parts[0];
    let frac = parts[1];

    // Group digits in the whole part
    let negative = whole.starts_with('-');
    let digits = if negative { &whole[1..] } else { whole };
    let grouped = format_grouped_int(digits.parse::<i64>().unwrap_or(0));

    if negative {
        format!("-{}.{}", grouped, frac)
    } else {
        format!("{}.{}", grouped, frac)
    }
}

fn money(symbol: &str, value: f64) -> String {
    format!("{}{}", symbol, format_amount(value))
}

fn format_qty(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    match date {
        Some(d) => d.to_string(),
        None => "-".to_string(),
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn batch_status(stat: &BatchStat) -> &'static str {
    if stat.over_sold {
        "OVERSOLD"
    } else if stat.stock == 0.0 && stat.sold_qty > 0.0 {
        "SOLD OUT"
    } else {
        "IN STOCK"
    }
}

/// Label shown for a sale's or expense's batch column. A batch id that no
/// longer resolves to a purchase is marked rather than hidden.
fn batch_label(data: &Snapshot, batch_id: &str) -> String {
    if let Some(purchase) = data.purchases.iter().find(|p| p.id == batch_id) {
        return display_name(purchase);
    }
    if batch_id.is_empty() {
        "(none)".to_string()
    } else {
        format!("(deleted {})", short_id(batch_id))
    }
}

fn add_financial_footer(table: &str, invoiced: &str, paid: &str, balance: &str) -> String {
    let lines: Vec<&str> = table.lines().collect();
    if lines.len() < 4 {
        return table.to_string();
    }

    // Parse the top border to discover column widths
    let top = lines[0];
    let Some(inner) = top.strip_prefix('╭').and_then(|s| s.strip_suffix('╮')) else {
        return table.to_string();
    };

    let widths: Vec<usize> = inner.split('┬').map(|p| p.chars().count()).collect();
    if widths.len() < 5 {
        return table.to_string();
    }

    // Merge columns # and CUSTOMER into one label cell; keep INVOICED; drop PAID and BALANCE
    let left_width = widths[0] + widths[1] + 1; // +1 for the ┴ replaced by a space
    let value_width = widths[2];
    let paid_width = widths[3];
    let balance_width = widths[4];

    let rows = [
        ("INVOICED", invoiced),
        ("(-) PAID", paid),
        ("(=) BALANCE", balance),
    ];

    // Strip the original bottom border and start building
    let mut out = lines[..lines.len() - 1].join("\n");
    out.push('\n');

    // First separator: merge left 2 columns, keep INVOICED, close off PAID+BALANCE
    out.push_str(&format!(
        "├{}┴{}┼{}┼{}┴{}╯\n",
        "─".repeat(widths[0]),
        "─".repeat(widths[1]),
        "─".repeat(value_width),
        "─".repeat(paid_width),
        "─".repeat(balance_width),
    ));

    // Summary rows with separators between them
    for (idx, (label, value)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "│ {:>left$} │ {:>value$} │\n",
            label,
            value,
            left = left_width - 2,
            value = value_width - 2
        ));
        if idx < rows.len() - 1 {
            out.push_str(&format!(
                "├{}┼{}┤\n",
                "─".repeat(left_width),
                "─".repeat(value_width)
            ));
        }
    }

    // Bottom border
    out.push_str(&format!(
        "╰{}┴{}╯",
        "─".repeat(left_width),
        "─".repeat(value_width)
    ));

    out
}

/// Load config and ledger, erroring out if the config directory was never
/// initialized.
fn open_ledger(cfg_dir: &PathBuf) -> Result<(Config, PathBuf, Snapshot)> {
    if !cfg_dir.exists() {
        return Err(LedgerError::ConfigNotFound(cfg_dir.clone()));
    }
    let config = load_config(cfg_dir)?;
    let data_path = data_file_path(&config, cfg_dir);
    let data = load_ledger(&data_path)?;
    Ok((config, data_path, data))
}

fn unit_price_from_inputs(quantity: f64, price: Option<&str>, total: Option<&str>) -> Result<f64> {
    let unit_price = match price {
        Some(raw) => price_from_input(raw)?,
        None => 0.0,
    };
    let total = match total {
        Some(raw) => amount_from_input(raw)?,
        None => 0.0,
    };
    Ok(resolve_unit_price(quantity, unit_price, total))
}

/// Resolve a record reference to the actual record id.
/// Accepts an index (1-based, newest first) from 'list', the full id, or a
/// unique id prefix of at least four characters.
fn resolve_reference<T>(
    records: &[T],
    id_of: impl Fn(&T) -> &str,
    bucket: Bucket,
    reference: &str,
) -> Result<String> {
    if let Ok(idx) = reference.parse::<usize>() {
        if idx == 0 || idx > records.len() {
            return Err(LedgerError::RecordNotFound {
                bucket: bucket.name().to_string(),
                reference: reference.to_string(),
            });
        }
        // Records are displayed newest first, 1-indexed
        return Ok(id_of(&records[records.len() - idx]).to_string());
    }

    if let Some(record) = records.iter().find(|r| id_of(r) == reference) {
        return Ok(id_of(record).to_string());
    }

    if reference.len() >= 4 {
        let matches: Vec<&T> = records
            .iter()
            .filter(|r| id_of(r).starts_with(reference))
            .collect();
        if matches.len() == 1 {
            return Ok(id_of(matches[0]).to_string());
        }
        if matches.len() > 1 {
            return Err(LedgerError::AmbiguousReference {
                bucket: bucket.name().to_string(),
                reference: reference.to_string(),
            });
        }
    }

    Err(LedgerError::RecordNotFound {
        bucket: bucket.name().to_string(),
        reference: reference.to_string(),
    })
}

/// Resolve a batch reference to a purchase id. Batch names are tried first,
/// then ids (index, exact, or prefix).
fn resolve_batch(data: &Snapshot, reference: &str) -> Result<String> {
    if let Some(purchase) = data
        .purchases
        .iter()
        .find(|p| display_name(p).eq_ignore_ascii_case(reference))
    {
        return Ok(purchase.id.clone());
    }

    resolve_reference(&data.purchases, |p| p.id.as_str(), Bucket::Purchases, reference).map_err(
        |e| match e {
            LedgerError::RecordNotFound { .. } => LedgerError::BatchNotFound(reference.to_string()),
            other => other,
        },
    )
}

/// Record a purchase, opening a new batch
fn cmd_add_purchase(
    cfg_dir: &PathBuf,
    qty: &str,
    price: Option<&str>,
    total: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let (config, data_path, mut data) = open_ledger(cfg_dir)?;

    let quantity = quantity_from_input(qty)?;
    let unit_price = unit_price_from_inputs(quantity, price, total)?;
    let day = date_from_input(date)?;

    let id = add_purchase(&mut data, Some(day), quantity, unit_price);
    save_ledger(&data_path, &data)?;

    let name = data.purchases.last().map(display_name).unwrap_or_default();
    let symbol = &config.ledger.currency_symbol;

    println!("Recorded purchase {name}");
    println!("  Qty:   {}", format_qty(quantity));
    println!("  Unit:  {}", money(symbol, unit_price));
    println!("  Cost:  {}", money(symbol, quantity * unit_price));
    println!("  Id:    {}", short_id(&id));

    Ok(())
}

/// Record a sale against a batch
fn cmd_add_sale(
    cfg_dir: &PathBuf,
    batch: &str,
    customer: Option<&str>,
    qty: &str,
    price: Option<&str>,
    total: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let (config, data_path, mut data) = open_ledger(cfg_dir)?;

    let batch_id = resolve_batch(&data, batch)?;
    let quantity = quantity_from_input(qty)?;
    let unit_price = unit_price_from_inputs(quantity, price, total)?;
    let day = date_from_input(date)?;
    let customer = customer.unwrap_or("");

    let id = add_sale(&mut data, Some(day), &batch_id, customer, quantity, unit_price);
    save_ledger(&data_path, &data)?;

    let report = compute_report(&data);
    let oversold = report
        .per_batch
        .iter()
        .find(|s| s.batch_id == batch_id)
        .is_some_and(|s| s.over_sold);

    let shown = if customer.trim().is_empty() {
        NO_CUSTOMER
    } else {
        customer
    };
    let symbol = &config.ledger.currency_symbol;

    println!("Recorded sale to {shown}");
    println!("  Batch:   {}", batch_label(&data, &batch_id));
    println!("  Qty:     {}", format_qty(quantity));
    println!("  Price:   {}", money(symbol, unit_price));
    println!("  Amount:  {}", money(symbol, quantity * unit_price));
    println!("  Id:      {}", short_id(&id));
    if oversold {
        println!("  Note:    batch is oversold (sold more than purchased)");
    }

    Ok(())
}

/// Record an expense against a batch
fn cmd_add_expense(
    cfg_dir: &PathBuf,
    batch: &str,
    name: Option<&str>,
    amount: &str,
    date: Option<&str>,
) -> Result<()> {
    let (config, data_path, mut data) = open_ledger(cfg_dir)?;

    let batch_id = resolve_batch(&data, batch)?;
    let amount = amount_from_input(amount)?;
    let day = date_from_input(date)?;
    let name = name.unwrap_or("");

    let id = add_expense(&mut data, Some(day), &batch_id, name, amount);
    save_ledger(&data_path, &data)?;

    let symbol = &config.ledger.currency_symbol;

    println!("Recorded expense against {}", batch_label(&data, &batch_id));
    if !name.is_empty() {
        println!("  Name:    {name}");
    }
    println!("  Amount:  {}", money(symbol, amount));
    println!("  Id:      {}", short_id(&id));

    Ok(())
}

/// Record a payment received from a customer
fn cmd_add_payment(
    cfg_dir: &PathBuf,
    customer: Option<&str>,
    amount: &str,
    date: Option<&str>,
) -> Result<()> {
    let (config, data_path, mut data) = open_ledger(cfg_dir)?;

    let amount = amount_from_input(amount)?;
    let day = date_from_input(date)?;
    let customer = customer.unwrap_or("");

    let id = add_payment(&mut data, Some(day), customer, amount);
    save_ledger(&data_path, &data)?;

    let key = if customer.trim().is_empty() {
        NO_CUSTOMER
    } else {
        customer
    };
    let symbol = &config.ledger.currency_symbol;

    println!("Recorded payment from {key}");
    println!("  Amount:  {}", money(symbol, amount));
    println!("  Id:      {}", short_id(&id));

    let report = compute_report(&data);
    if let Some(debt) = report.customer_debts.iter().find(|d| d.customer == key) {
        println!("  Balance: {}", money(symbol, debt.balance));
    }

    Ok(())
}

/// Change fields on an existing purchase
fn cmd_edit_purchase(
    cfg_dir: &PathBuf,
    reference: &str,
    qty: Option<&str>,
    price: Option<&str>,
    date: Option<&str>,
    rename: bool,
) -> Result<()> {
    let (config, data_path, mut data) = open_ledger(cfg_dir)?;

    let id = resolve_batch(&data, reference)?;
    let quantity = qty.map(quantity_from_input).transpose()?;
    let unit_price = price.map(price_from_input).transpose()?;
    let day = date.map(|d| date_from_input(Some(d))).transpose()?;

    let purchase = data
        .purchases
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| LedgerError::BatchNotFound(reference.to_string()))?;

    if let Some(q) = quantity {
        purchase.quantity = q;
    }
    if let Some(p) = unit_price {
        purchase.unit_price = p;
    }
    if let Some(d) = day {
        purchase.date = Some(d);
    }
    if rename {
        // The original same-day sequence is kept, never recomputed
        let sequence = purchase.batch_sequence.unwrap_or(1);
        purchase.batch_name = Some(batch_name(purchase.date, sequence));
    }

    let name = display_name(purchase);
    let final_qty = purchase.quantity;
    let final_price = purchase.unit_price;

    save_ledger(&data_path, &data)?;

    let symbol = &config.ledger.currency_symbol;

    println!("Updated purchase {name}");
    println!("  Qty:   {}", format_qty(final_qty));
    println!("  Unit:  {}", money(symbol, final_price));

    Ok(())
}

/// Change fields on an existing sale
fn cmd_edit_sale(
    cfg_dir: &PathBuf,
    reference: &str,
    batch: Option<&str>,
    customer: Option<&str>,
    qty: Option<&str>,
    price: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let (config, data_path, mut data) = open_ledger(cfg_dir)?;

    let id = resolve_reference(&data.sales, |s| s.id.as_str(), Bucket::Sales, reference)?;
    let batch_id = batch.map(|b| resolve_batch(&data, b)).transpose()?;
    let quantity = qty.map(quantity_from_input).transpose()?;
    let unit_price = price.map(price_from_input).transpose()?;
    let day = date.map(|d| date_from_input(Some(d))).transpose()?;

    let sale = data
        .sales
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| LedgerError::RecordNotFound {
            bucket: Bucket::Sales.name().to_string(),
            reference: reference.to_string(),
        })?;

    if let Some(b) = batch_id {
        sale.batch_id = b;
    }
    if let Some(c) = customer {
        sale.customer = c.to_string();
    }
    if let Some(q) = quantity {
        sale.quantity = q;
    }
    if let Some(p) = unit_price {
        sale.unit_price = p;
    }
    if let Some(d) = day {
        sale.date = Some(d);
    }

    let amount = sale.amount();
    save_ledger(&data_path, &data)?;

    println!("Updated sale {}", short_id(&id));
    println!("  Amount: {}", money(&config.ledger.currency_symbol, amount));

    Ok(())
}

/// Change fields on an existing expense
fn cmd_edit_expense(
    cfg_dir: &PathBuf,
    reference: &str,
    batch: Option<&str>,
    name: Option<&str>,
    amount: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let (config, data_path, mut data) = open_ledger(cfg_dir)?;

    let id = resolve_reference(&data.expenses, |e| e.id.as_str(), Bucket::Expenses, reference)?;
    let batch_id = batch.map(|b| resolve_batch(&data, b)).transpose()?;
    let amount = amount.map(amount_from_input).transpose()?;
    let day = date.map(|d| date_from_input(Some(d))).transpose()?;

    let expense = data
        .expenses
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| LedgerError::RecordNotFound {
            bucket: Bucket::Expenses.name().to_string(),
            reference: reference.to_string(),
        })?;

    if let Some(b) = batch_id {
        expense.batch_id = b;
    }
    if let Some(n) = name {
        expense.name = n.to_string();
    }
    if let Some(a) = amount {
        expense.amount = a;
    }
    if let Some(d) = day {
        expense.date = Some(d);
    }

    let final_amount = expense.amount;
    save_ledger(&data_path, &data)?;

    println!("Updated expense {}", short_id(&id));
    println!(
        "  Amount: {}",
        money(&config.ledger.currency_symbol, final_amount)
    );

    Ok(())
}

/// Change fields on an existing payment
fn cmd_edit_payment(
    cfg_dir: &PathBuf,
    reference: &str,
    customer: Option<&str>,
    amount: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let (config, data_path, mut data) = open_ledger(cfg_dir)?;

    let id = resolve_reference(&data.payments, |p| p.id.as_str(), Bucket::Payments, reference)?;
    let amount = amount.map(amount_from_input).transpose()?;
    let day = date.map(|d| date_from_input(Some(d))).transpose()?;

    let payment = data
        .payments
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| LedgerError::RecordNotFound {
            bucket: Bucket::Payments.name().to_string(),
            reference: reference.to_string(),
        })?;

    if let Some(c) = customer {
        payment.customer = c.to_string();
    }
    if let Some(a) = amount {
        payment.amount = a;
    }
    if let Some(d) = day {
        payment.date = Some(d);
    }

    let final_amount = payment.amount;
    save_ledger(&data_path, &data)?;

    println!("Updated payment {}", short_id(&id));
    println!(
        "  Amount: {}",
        money(&config.ledger.currency_symbol, final_amount)
    );

    Ok(())
}

/// Delete a record from one of the four collections
fn cmd_delete(cfg_dir: &PathBuf, bucket: &str, reference: &str) -> Result<()> {
    let (_config, data_path, mut data) = open_ledger(cfg_dir)?;

    let bucket = Bucket::parse(bucket)?;
    let id = match bucket {
        Bucket::Purchases => resolve_batch(&data, reference)?,
        Bucket::Sales => resolve_reference(&data.sales, |s| s.id.as_str(), bucket, reference)?,
        Bucket::Expenses => {
            resolve_reference(&data.expenses, |e| e.id.as_str(), bucket, reference)?
        }
        Bucket::Payments => {
            resolve_reference(&data.payments, |p| p.id.as_str(), bucket, reference)?
        }
    };

    let label = match bucket {
        Bucket::Purchases => data
            .purchases
            .iter()
            .find(|p| p.id == id)
            .map(display_name)
            .unwrap_or_else(|| short_id(&id)),
        _ => short_id(&id),
    };

    if !delete_record(&mut data, bucket, &id) {
        return Err(LedgerError::RecordNotFound {
            bucket: bucket.name().to_string(),
            reference: reference.to_string(),
        });
    }
    save_ledger(&data_path, &data)?;

    println!("Deleted {} record {}", bucket, label);

    if bucket == Bucket::Purchases {
        let sales = data.sales.iter().filter(|s| s.batch_id == id).count();
        let expenses = data.expenses.iter().filter(|e| e.batch_id == id).count();
        if sales + expenses > 0 {
            println!(
                "  {} sale(s) and {} expense(s) now reference a deleted batch; the sales still count toward customer balances.",
                sales, expenses
            );
        }
    }

    Ok(())
}

fn clip<T>(entries: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(n) => &entries[..n.min(entries.len())],
        None => entries,
    }
}

/// List records in one of the four collections
fn cmd_list(cfg_dir: &PathBuf, bucket: &str, limit: Option<usize>) -> Result<()> {
    let (config, _data_path, data) = open_ledger(cfg_dir)?;
    let bucket = Bucket::parse(bucket)?;
    let symbol = &config.ledger.currency_symbol;

    let total = match bucket {
        Bucket::Purchases => data.purchases.len(),
        Bucket::Sales => data.sales.len(),
        Bucket::Expenses => data.expenses.len(),
        Bucket::Payments => data.payments.len(),
    };

    if total == 0 {
        println!("No {} recorded yet.", bucket);
        return Ok(());
    }

    match bucket {
        Bucket::Purchases => {
            let entries: Vec<_> = data.purchases.iter().rev().enumerate().collect();
            let entries = clip(&entries, limit);
            let rows: Vec<PurchaseRow> = entries
                .iter()
                .map(|(idx, p)| PurchaseRow {
                    index: idx + 1,
                    batch: display_name(p),
                    date: format_date(p.date),
                    qty: format_qty(p.quantity),
                    unit_cost: money(symbol, p.unit_price),
                    id: short_id(&p.id),
                })
                .collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{table}");
        }
        Bucket::Sales => {
            let entries: Vec<_> = data.sales.iter().rev().enumerate().collect();
            let entries = clip(&entries, limit);
            let rows: Vec<SaleRow> = entries
                .iter()
                .map(|(idx, s)| SaleRow {
                    index: idx + 1,
                    date: format_date(s.date),
                    batch: batch_label(&data, &s.batch_id),
                    customer: if s.customer.trim().is_empty() {
                        NO_CUSTOMER.to_string()
                    } else {
                        s.customer.clone()
                    },
                    qty: format_qty(s.quantity),
                    price: money(symbol, s.unit_price),
                    amount: money(symbol, s.amount()),
                    id: short_id(&s.id),
                })
                .collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{table}");
        }
        Bucket::Expenses => {
            let entries: Vec<_> = data.expenses.iter().rev().enumerate().collect();
            let entries = clip(&entries, limit);
            let rows: Vec<ExpenseRow> = entries
                .iter()
                .map(|(idx, e)| ExpenseRow {
                    index: idx + 1,
                    date: format_date(e.date),
                    batch: batch_label(&data, &e.batch_id),
                    name: e.name.clone(),
                    amount: money(symbol, e.amount),
                    id: short_id(&e.id),
                })
                .collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{table}");
        }
        Bucket::Payments => {
            let entries: Vec<_> = data.payments.iter().rev().enumerate().collect();
            let entries = clip(&entries, limit);
            let rows: Vec<PaymentRow> = entries
                .iter()
                .map(|(idx, p)| PaymentRow {
                    index: idx + 1,
                    date: format_date(p.date),
                    customer: if p.customer.trim().is_empty() {
                        NO_CUSTOMER.to_string()
                    } else {
                        p.customer.clone()
                    },
                    amount: money(symbol, p.amount),
                    id: short_id(&p.id),
                })
                .collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{table}");
        }
    }

    println!();
    println!("Total: {} {}", total, bucket);
    println!(
        "Use the index with edit/delete (e.g., 'batchbook delete {} 1')",
        bucket
    );

    Ok(())
}

/// Show per-batch costing, customer balances, and overall totals
fn cmd_report(cfg_dir: &PathBuf, json: bool) -> Result<()> {
    let (config, _data_path, data) = open_ledger(cfg_dir)?;
    let report = compute_report(&data);

    if json {
        let rendered = serde_json::to_string_pretty(&report).map_err(|e| {
            LedgerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            ))
        })?;
        println!("{rendered}");
        return Ok(());
    }

    let symbol = &config.ledger.currency_symbol;

    if report.per_batch.is_empty() {
        println!("No batches recorded yet.");
    } else {
        // Oldest batch first; undated batches sink to the bottom
        let mut batches: Vec<&BatchStat> = report.per_batch.iter().collect();
        batches.sort_by(|a, b| match (a.date, b.date) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.batch_name.cmp(&b.batch_name)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.batch_name.cmp(&b.batch_name),
        });

        let rows: Vec<BatchRow> = batches
            .iter()
            .map(|stat| BatchRow {
                batch: stat.batch_name.clone(),
                date: format_date(stat.date),
                bought: format_qty(stat.purchased_qty),
                sold: format_qty(stat.sold_qty),
                stock: format_qty(stat.stock),
                revenue: money(symbol, stat.revenue),
                cogs: money(symbol, stat.cogs),
                expenses: money(symbol, stat.expenses_total),
                profit: money(symbol, stat.profit),
                status: batch_status(stat).to_string(),
            })
            .collect();

        println!("Batches");
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    if !report.customer_debts.is_empty() {
        let rows: Vec<CustomerRow> = report
            .customer_debts
            .iter()
            .enumerate()
            .map(|(idx, debt)| CustomerRow {
                index: idx + 1,
                customer: debt.customer.clone(),
                invoiced: money(symbol, debt.invoiced),
                paid: money(symbol, debt.paid),
                balance: money(symbol, debt.balance),
            })
            .collect();

        // The footer balance is the net position; the Unpaid total below
        // counts positive balances only
        let invoiced_total: f64 = report.customer_debts.iter().map(|d| d.invoiced).sum();
        let paid_total = report.totals.paid_total;

        let table = Table::new(rows).with(Style::rounded()).to_string();
        let table = add_financial_footer(
            &table,
            &money(symbol, invoiced_total),
            &money(symbol, paid_total),
            &money(symbol, invoiced_total - paid_total),
        );

        println!();
        println!("Customers");
        println!("{table}");
    }

    let totals = &report.totals;
    println!();
    println!("Totals");
    println!("{}", "-".repeat(40));
    println!("Revenue:     {}", money(symbol, totals.revenue));
    println!("COGS:        {}", money(symbol, totals.cogs));
    println!("Expenses:    {}", money(symbol, totals.expenses_total));
    println!("Profit:      {}", money(symbol, totals.profit));
    println!("Paid:        {}", money(symbol, totals.paid_total));
    println!("Unpaid:      {}", money(symbol, totals.unpaid_total));
    println!("Stock:       {} units", format_qty(totals.stock_qty));
    println!("Stock cost:  {}", money(symbol, totals.stock_cost));

    Ok(())
}

/// Show ledger status
fn cmd_status(cfg_dir: &PathBuf) -> Result<()> {
    let (config, data_path, data) = open_ledger(cfg_dir)?;
    let report = compute_report(&data);
    let symbol = &config.ledger.currency_symbol;

    println!("Ledger Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Data file:        {}", data_path.display());
    println!(
        "Currency:         {} ({})",
        config.ledger.currency, symbol
    );
    println!("Purchases:        {}", data.purchases.len());
    println!("Sales:            {}", data.sales.len());
    println!("Expenses:         {}", data.expenses.len());
    println!("Payments:         {}", data.payments.len());
    println!();
    println!(
        "Stock:            {} units ({})",
        format_qty(report.totals.stock_qty),
        money(symbol, report.totals.stock_cost)
    );
    println!("Profit:           {}", money(symbol, report.totals.profit));
    println!(
        "Unpaid:           {}",
        money(symbol, report.totals.unpaid_total)
    );

    Ok(())
}

/// Export the ledger to a JSON file
fn cmd_export(cfg_dir: &PathBuf, output: Option<PathBuf>) -> Result<()> {
    let (_config, _data_path, data) = open_ledger(cfg_dir)?;

    let out_path = match output {
        Some(p) => p,
        None => PathBuf::from(format!(
            "batchbook-export-{}.json",
            chrono::Local::now().format("%Y-%m-%d")
        )),
    };

    save_ledger(&out_path, &data)?;

    println!(
        "Exported {} records to {}",
        data.record_count(),
        out_path.display()
    );

    Ok(())
}

/// Import records from a JSON export
fn cmd_import(cfg_dir: &PathBuf, file: &PathBuf, merge: bool) -> Result<()> {
    let (_config, data_path, mut data) = open_ledger(cfg_dir)?;

    if !file.exists() {
        return Err(LedgerError::ImportFileNotFound(file.clone()));
    }

    let content = fs::read_to_string(file)?;
    let incoming: Snapshot =
        serde_json::from_str(&content).map_err(|e| LedgerError::ImportParse {
            path: file.clone(),
            source: e,
        })?;

    let adopted = adopt_snapshot(incoming);
    let count = adopted.record_count();

    if merge {
        data.purchases.extend(adopted.purchases);
        data.sales.extend(adopted.sales);
        data.expenses.extend(adopted.expenses);
        data.payments.extend(adopted.payments);
    } else {
        data = adopted;
    }

    save_ledger(&data_path, &data)?;

    println!(
        "Imported {} records from {} {}",
        count,
        file.display(),
        if merge { "(merged)" } else { "(replaced ledger)" }
    );

    Ok(())
}
