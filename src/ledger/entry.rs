use chrono::{Local, NaiveDate};

use crate::error::{LedgerError, Result};
use crate::ledger::numeric::parse_decimal;

/// Parse a quantity argument. The raw text is normalized first, so both
/// "2.5" and "2,5" are accepted; anything that does not normalize to a
/// positive number is rejected.
pub fn quantity_from_input(raw: &str) -> Result<f64> {
    let value = parse_decimal(raw);
    if value <= 0.0 {
        return Err(LedgerError::InvalidQuantity(raw.to_string()));
    }
    Ok(value)
}

/// Parse a unit price argument. Zero is allowed (giveaways), negatives
/// are not.
pub fn price_from_input(raw: &str) -> Result<f64> {
    let value = parse_decimal(raw);
    if value < 0.0 {
        return Err(LedgerError::NegativePrice(raw.to_string()));
    }
    Ok(value)
}

/// Parse a monetary amount argument (expense or payment totals).
pub fn amount_from_input(raw: &str) -> Result<f64> {
    let value = parse_decimal(raw);
    if value < 0.0 {
        return Err(LedgerError::NegativeAmount(raw.to_string()));
    }
    Ok(value)
}

/// Parse a `--date` argument, defaulting to today when absent. Unlike the
/// stored records, which tolerate malformed dates, data entry is strict:
/// a date the user typed must parse or the command fails.
pub fn date_from_input(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|_| LedgerError::InvalidDate(text.to_string())),
        None => Ok(Local::now().date_naive()),
    }
}

/// Pick the effective unit price from the price/total pair. An explicit
/// unit price wins; otherwise a total is divided across the quantity.
pub fn resolve_unit_price(quantity: f64, unit_price: f64, total: f64) -> f64 {
    if unit_price > 0.0 {
        unit_price
    } else if total > 0.0 && quantity > 0.0 {
        total / quantity
    } else {
        unit_price
    }
}
