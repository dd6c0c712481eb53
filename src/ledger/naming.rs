use chrono::NaiveDate;

use crate::ledger::records::Purchase;

/// Sentinel label for a batch whose purchase date is missing or unusable.
pub const UNDATED_BATCH: &str = "P - ?";

/// Format a batch label from its purchase date and intra-day sequence:
/// "P - DDMMYYYY" for the first batch of a calendar day, with a two-digit
/// "-SS" suffix from the second onwards.
pub fn batch_name(date: Option<NaiveDate>, sequence: u32) -> String {
    let Some(date) = date else {
        return UNDATED_BATCH.to_string();
    };

    let stamp = date.format("%d%m%Y");
    if sequence >= 2 {
        format!("P - {stamp}-{sequence:02}")
    } else {
        format!("P - {stamp}")
    }
}

/// The label shown for a purchase. A stored name is authoritative and is
/// never recomputed; the name is reconstructed from date and sequence only
/// when no name was stored.
pub fn display_name(purchase: &Purchase) -> String {
    match &purchase.batch_name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => batch_name(purchase.date, purchase.batch_sequence.unwrap_or(1)),
    }
}
