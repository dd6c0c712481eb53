use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Config directory not found at {0}. Run 'batchbook init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Ledger file {path} is not valid JSON: {source}")]
    LedgerParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Import file not found: {0}")]
    ImportFileNotFound(PathBuf),

    #[error("Import file {path} is not valid JSON: {source}")]
    ImportParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Quantity must be greater than zero (got '{0}')")]
    InvalidQuantity(String),

    #[error("Unit price cannot be negative (got '{0}')")]
    NegativePrice(String),

    #[error("Amount cannot be negative (got '{0}')")]
    NegativeAmount(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD (e.g., 2025-09-01).")]
    InvalidDate(String),

    #[error("Unknown bucket '{0}'. Use purchases, sales, expenses, or payments.")]
    UnknownBucket(String),

    #[error("No batch matches '{0}'. Use 'batchbook list purchases' to see batches.")]
    BatchNotFound(String),

    #[error("No {bucket} record matches '{reference}'. Use 'batchbook list {bucket}' to see records.")]
    RecordNotFound { bucket: String, reference: String },

    #[error("Reference '{reference}' matches more than one {bucket} record. Use the full id.")]
    AmbiguousReference { bucket: String, reference: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
