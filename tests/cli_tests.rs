use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn batchbook_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("batchbook"))
}

fn init_config(config_path: &std::path::Path) {
    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
}

fn write_ledger(config_path: &std::path::Path, ledger: &str) {
    fs::write(config_path.join("ledger.json"), ledger).unwrap();
}

/// Seed one purchase (10 @ $5 on 2025-09-01), a sale of 4 @ $8 to Ali,
/// a $20 expense, and a $10 payment from Ali.
fn seed_full_cycle(config_path: &std::path::Path) {
    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "10",
            "--price",
            "5",
            "--date",
            "2025-09-01",
        ])
        .assert()
        .success();

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-sale",
            "--batch",
            "P - 01092025",
            "--customer",
            "Ali",
            "--qty",
            "4",
            "--price",
            "8",
            "--date",
            "2025-09-02",
        ])
        .assert()
        .success();

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-expense",
            "--batch",
            "1",
            "--name",
            "freight",
            "--amount",
            "20",
            "--date",
            "2025-09-02",
        ])
        .assert()
        .success();

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-payment",
            "--customer",
            "Ali",
            "--amount",
            "10",
            "--date",
            "2025-09-03",
        ])
        .assert()
        .success();
}

fn report_json(config_path: &std::path::Path) -> serde_json::Value {
    let output = batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help() {
    batchbook_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Minimal CLI batch-costing ledger"));
}

#[test]
fn test_version() {
    batchbook_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("batchbook"));
}

#[test]
fn test_init_creates_config_and_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");

    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized batchbook config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("ledger.json").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");

    init_config(&config_path);

    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_add_purchase_names_batches_per_day() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "10",
            "--price",
            "5",
            "--date",
            "2025-09-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded purchase P - 01092025"));

    // Second purchase on the same day gets a -02 suffix
    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "4",
            "--price",
            "2",
            "--date",
            "2025-09-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("P - 01092025-02"));
}

#[test]
fn test_add_purchase_derives_unit_price_from_total() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "4",
            "--total",
            "10",
            "--date",
            "2025-09-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unit:  $2.50"))
        .stdout(predicate::str::contains("Cost:  $10.00"));
}

#[test]
fn test_add_purchase_accepts_comma_decimals() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "2,5",
            "--price",
            "1,5",
            "--date",
            "2025-09-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Qty:   2.50"))
        .stdout(predicate::str::contains("Cost:  $3.75"));
}

#[test]
fn test_add_purchase_rejects_bad_quantity() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "0",
            "--price",
            "5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quantity must be greater than zero"));

    // Non-numeric quantity normalizes to zero and is rejected the same way
    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "abc",
            "--price",
            "5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quantity must be greater than zero"));
}

#[test]
fn test_add_purchase_rejects_negative_price() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "10",
            "--price=-3",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be negative"));
}

#[test]
fn test_add_purchase_rejects_bad_date() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "10",
            "--price",
            "5",
            "--date",
            "2025-13-99",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_add_sale_unknown_batch_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-sale",
            "--batch",
            "P - 01092025",
            "--qty",
            "4",
            "--price",
            "8",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No batch matches"));
}

#[test]
fn test_add_sale_warns_when_overselling() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "5",
            "--price",
            "4",
            "--date",
            "2025-09-01",
        ])
        .assert()
        .success();

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-sale",
            "--batch",
            "1",
            "--customer",
            "Ali",
            "--qty",
            "8",
            "--price",
            "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("oversold"));
}

#[test]
fn test_payment_confirmation_shows_balance() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);
    seed_full_cycle(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-payment",
            "--customer",
            "Ali",
            "--amount",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded payment from Ali"))
        .stdout(predicate::str::contains("Balance: $20.00"));
}

#[test]
fn test_report_tables_show_full_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);
    seed_full_cycle(&config_path);

    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P - 01092025"))
        .stdout(predicate::str::contains("IN STOCK"))
        .stdout(predicate::str::contains("Ali"))
        .stdout(predicate::str::contains("(=) BALANCE"))
        .stdout(predicate::str::contains("Revenue:     $32.00"))
        .stdout(predicate::str::contains("COGS:        $20.00"))
        .stdout(predicate::str::contains("Profit:      $-8.00"))
        .stdout(predicate::str::contains("Unpaid:      $22.00"))
        .stdout(predicate::str::contains("Stock:       6 units"))
        .stdout(predicate::str::contains("Stock cost:  $30.00"));
}

#[test]
fn test_report_json_shape() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);
    seed_full_cycle(&config_path);

    let json = report_json(&config_path);

    assert_eq!(json["perBatch"][0]["batchName"], "P - 01092025");
    assert_eq!(json["perBatch"][0]["soldQty"], 4.0);
    assert_eq!(json["perBatch"][0]["overSold"], false);
    assert_eq!(json["customerDebts"][0]["customer"], "Ali");
    assert_eq!(json["customerDebts"][0]["balance"], 22.0);
    assert_eq!(json["totals"]["revenue"], 32.0);
    assert_eq!(json["totals"]["cogs"], 20.0);
    assert_eq!(json["totals"]["profit"], -8.0);
    assert_eq!(json["totals"]["unpaidTotal"], 22.0);
    assert_eq!(json["totals"]["stockQty"], 6.0);
}

#[test]
fn test_report_on_empty_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No batches recorded yet."))
        .stdout(predicate::str::contains("Revenue:     $0.00"));
}

#[test]
fn test_delete_purchase_leaves_sales_dangling() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);
    seed_full_cycle(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "delete",
            "purchases",
            "P - 01092025",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted purchases record P - 01092025"))
        .stdout(predicate::str::contains("reference a deleted batch"));

    // The dangling sale still counts toward the customer balance, but no
    // longer toward revenue
    let json = report_json(&config_path);
    assert_eq!(json["totals"]["revenue"], 0.0);
    assert_eq!(json["customerDebts"][0]["customer"], "Ali");
    assert_eq!(json["customerDebts"][0]["invoiced"], 32.0);
    assert_eq!(json["totals"]["unpaidTotal"], 22.0);

    // The sale listing marks the missing batch
    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list", "sales"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(deleted"));
}

#[test]
fn test_list_respects_limit() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    for date in ["2025-09-01", "2025-09-02", "2025-09-03"] {
        batchbook_cmd()
            .args([
                "-C",
                config_path.to_str().unwrap(),
                "add-purchase",
                "--qty",
                "1",
                "--price",
                "1",
                "--date",
                date,
            ])
            .assert()
            .success();
    }

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "list",
            "purchases",
            "--limit",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("P - 03092025"))
        .stdout(predicate::str::contains("P - 02092025"))
        .stdout(predicate::str::contains("P - 01092025").not())
        .stdout(predicate::str::contains("Total: 3 purchases"));
}

#[test]
fn test_list_unknown_bucket() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list", "invoices"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown bucket 'invoices'"));
}

#[test]
fn test_delete_by_ambiguous_prefix_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    write_ledger(
        &config_path,
        r#"{
  "purchases": [
    {"id": "aaaa1111-0000-0000-0000-000000000001", "date": "2025-09-01", "quantity": 10, "unitPrice": 5, "batchSequence": 1, "batchName": "P - 01092025"},
    {"id": "aaaa2222-0000-0000-0000-000000000002", "date": "2025-09-02", "quantity": 4, "unitPrice": 2, "batchSequence": 1, "batchName": "P - 02092025"}
  ],
  "sales": [],
  "expenses": [],
  "payments": []
}"#,
    );

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "delete",
            "purchases",
            "aaaa",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("matches more than one"));

    // A longer, unique prefix works
    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "delete",
            "purchases",
            "aaaa1111",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted purchases record P - 01092025"));
}

#[test]
fn test_edit_purchase_rename_follows_new_date() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "10",
            "--price",
            "5",
            "--date",
            "2025-09-01",
        ])
        .assert()
        .success();

    // Without --rename the stored name stays frozen
    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "edit-purchase",
            "1",
            "--date",
            "2025-09-15",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated purchase P - 01092025"));

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "edit-purchase",
            "1",
            "--rename",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated purchase P - 15092025"));
}

#[test]
fn test_edit_sale_moves_revenue_between_batches() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    for (date, qty, price) in [("2025-09-01", "10", "5"), ("2025-09-02", "10", "3")] {
        batchbook_cmd()
            .args([
                "-C",
                config_path.to_str().unwrap(),
                "add-purchase",
                "--qty",
                qty,
                "--price",
                price,
                "--date",
                date,
            ])
            .assert()
            .success();
    }

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-sale",
            "--batch",
            "P - 01092025",
            "--customer",
            "Ali",
            "--qty",
            "2",
            "--price",
            "10",
        ])
        .assert()
        .success();

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "edit-sale",
            "1",
            "--batch",
            "P - 02092025",
        ])
        .assert()
        .success();

    let json = report_json(&config_path);
    let batches = json["perBatch"].as_array().unwrap();
    let first = batches
        .iter()
        .find(|b| b["batchName"] == "P - 01092025")
        .unwrap();
    let second = batches
        .iter()
        .find(|b| b["batchName"] == "P - 02092025")
        .unwrap();

    assert_eq!(first["revenue"], 0.0);
    assert_eq!(second["revenue"], 20.0);
    // COGS is valued at the receiving batch's own unit cost
    assert_eq!(second["cogs"], 6.0);
}

#[test]
fn test_export_import_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    let other_path = temp_dir.path().join("batchbook-other");
    let export_path = temp_dir.path().join("export.json");
    init_config(&config_path);
    seed_full_cycle(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "export",
            "-o",
            export_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 records"));

    init_config(&other_path);
    batchbook_cmd()
        .args([
            "-C",
            other_path.to_str().unwrap(),
            "import",
            export_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 4 records"))
        .stdout(predicate::str::contains("(replaced ledger)"));

    // Fresh ids, same numbers
    let source = report_json(&config_path);
    let imported = report_json(&other_path);
    assert_eq!(source["totals"], imported["totals"]);
    assert_ne!(
        source["perBatch"][0]["batchId"],
        imported["perBatch"][0]["batchId"]
    );
}

#[test]
fn test_import_merge_adds_to_existing_records() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    let export_path = temp_dir.path().join("export.json");
    init_config(&config_path);
    seed_full_cycle(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "export",
            "-o",
            export_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "import",
            export_path.to_str().unwrap(),
            "--merge",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("(merged)"));

    let json = report_json(&config_path);
    assert_eq!(json["totals"]["revenue"], 64.0);
    assert_eq!(json["perBatch"].as_array().unwrap().len(), 2);
}

#[test]
fn test_import_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "import",
            temp_dir.path().join("missing.json").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import file not found"));
}

#[test]
fn test_corrupt_ledger_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    write_ledger(&config_path, "{ this is not json");

    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not valid JSON"));
}

#[test]
fn test_status_counts_records() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);
    seed_full_cycle(&config_path);

    batchbook_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ledger Status"))
        .stdout(predicate::str::contains("Purchases:        1"))
        .stdout(predicate::str::contains("Sales:            1"))
        .stdout(predicate::str::contains("Unpaid:           $22.00"));
}

#[test]
fn test_sale_without_customer_shows_noname() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("batchbook-config");
    init_config(&config_path);

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-purchase",
            "--qty",
            "10",
            "--price",
            "5",
            "--date",
            "2025-09-01",
        ])
        .assert()
        .success();

    batchbook_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-sale",
            "--batch",
            "1",
            "--qty",
            "2",
            "--price",
            "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded sale to (noname)"));

    let json = report_json(&config_path);
    assert_eq!(json["customerDebts"][0]["customer"], "(noname)");
}
