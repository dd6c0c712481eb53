use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A purchase record. One purchase opens exactly one batch; the record id
/// is the batch identity that sales and expenses reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Purchase {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub unit_price: f64,
    /// 1-based position among purchases sharing the same calendar day,
    /// fixed when the record is created.
    #[serde(
        deserialize_with = "lenient::sequence",
        skip_serializing_if = "Option::is_none"
    )]
    pub batch_sequence: Option<u32>,
    /// Display label frozen at creation time (see ledger::naming).
    #[serde(
        deserialize_with = "lenient::name",
        skip_serializing_if = "Option::is_none"
    )]
    pub batch_name: Option<String>,
}

/// A sale drawn against a batch. A sale whose batch id resolves to no
/// purchase is a dangling sale: it still invoices the customer but carries
/// no weight in per-batch statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sale {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::string")]
    pub batch_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub customer: String,
    #[serde(deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub unit_price: f64,
}

impl Sale {
    /// Invoiced value of this sale.
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// A cost charged against a batch. A dangling expense counts toward
/// nothing at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Expense {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::string")]
    pub batch_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub amount: f64,
}

/// A payment received from a customer. Payments are not linked to batches;
/// the customer name (exact string, case-sensitive) is the only join key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payment {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::string")]
    pub customer: String,
    #[serde(deserialize_with = "lenient::number")]
    pub amount: f64,
}

/// The full materialized contents of the record store. The same shape is
/// the persisted ledger document and the import/export exchange format:
/// a JSON object with the four array fields.
///
/// Deserialization is permissive: a missing collection, or a collection
/// that is not an array, becomes empty; array elements that are not
/// record-shaped objects are skipped; numeric fields accept numbers or
/// localized numeric strings and degrade to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(deserialize_with = "lenient::records")]
    pub purchases: Vec<Purchase>,
    #[serde(deserialize_with = "lenient::records")]
    pub sales: Vec<Sale>,
    #[serde(deserialize_with = "lenient::records")]
    pub expenses: Vec<Expense>,
    #[serde(deserialize_with = "lenient::records")]
    pub payments: Vec<Payment>,
}

impl Snapshot {
    /// Total number of records across the four collections.
    pub fn record_count(&self) -> usize {
        self.purchases.len() + self.sales.len() + self.expenses.len() + self.payments.len()
    }
}

/// Tolerant field deserializers for stored and imported records.
/// Number, date, and shape problems degrade to defaults instead of
/// failing the whole document.
mod lenient {
    use chrono::NaiveDate;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::ledger::numeric::parse_decimal;

    pub fn number<'de, D>(de: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(de)?;
        Ok(match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => parse_decimal(&s),
            _ => 0.0,
        })
    }

    pub fn date<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(de)?;
        Ok(match value {
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        })
    }

    pub fn string<'de, D>(de: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(de)?;
        Ok(match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }

    pub fn name<'de, D>(de: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(de)?;
        Ok(match value {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
    }

    pub fn sequence<'de, D>(de: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(de)?;
        let n = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => parse_decimal(&s),
            _ => 0.0,
        };
        Ok(if n >= 1.0 { Some(n as u32) } else { None })
    }

    pub fn records<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(de)?;
        let Value::Array(items) = value else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect())
    }
}
