use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NisaError {
    #[error("Unknown quota type: {0}")]
    UnknownQuotaType(String),

    #[error("Unknown transaction kind: {0}")]
    UnknownTransactionKind(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("Tax year {requested} must come after the current tax year {current}")]
    TaxYearNotAdvanced { current: i32, requested: i32 },

    #[error("Length mismatch: {0}")]
    LengthMismatch(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type NisaResult<T> = Result<T, NisaError>;
