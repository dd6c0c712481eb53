use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub data: DataSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LedgerSettings {
    pub currency: String,
    pub currency_symbol: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DataSettings {
    pub file: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            file: "ledger.json".to_string(),
        }
    }
}
