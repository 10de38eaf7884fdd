use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Reasons a ledger mutation is rejected. A rejected call never leaves
/// partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Amount must be a positive number, got {0}")]
    InvalidAmount(Decimal),

    #[error("Contribution would take the goal to {attempted}, above its target of {target}")]
    ExceedsTarget { target: Decimal, attempted: Decimal },

    #[error("Insufficient funds: need {requested}, wallet holds {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Goal not found: {0}")]
    GoalNotFound(String),
}

/// Failures at the persistence and remote backup boundaries.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
