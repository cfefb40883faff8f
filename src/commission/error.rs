//! Errors raised while computing commissions or loading exchange rates.
use thiserror::Error;

use crate::commission::{OperationType, UserType};

/// Errors that terminate the processing of a single transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommissionError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid precision: {0}")]
    InvalidPrecision(u32),
    #[error("Decimal overflow")]
    Overflow,
    #[error("Exchange rate not available for conversion from {from} to {to}")]
    RateUnavailable { from: String, to: String },
    #[error("No commission rule found for operation type: {0}")]
    UnsupportedOperation(OperationType),
    #[error("No commission rule found for user type {user_type} on {operation}")]
    UnsupportedUserType {
        operation: OperationType,
        user_type: UserType,
    },
}

/// Errors reported by a rate source. These never reach the caller of the
/// engine; the exchange rate provider falls back to built-in rates instead.
#[derive(Error, Debug)]
pub enum RateSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed rate document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Rate source rejected the request")]
    Rejected,
    #[error("Rates are anchored to {0}, expected EUR")]
    BaseMismatch(String),
    #[error("Rate source returned no rates")]
    Empty,
    #[error("Invalid rate for {currency}: {value}")]
    InvalidRate { currency: String, value: String },
}

/// Errors that stop reading the transaction input.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid transaction record {record}")]
    InvalidRecord {
        record: usize,
        #[source]
        source: csv::Error,
    },
}
