//! The module contains the errors the ledger can throw.
//!
//! The errors are:
//!
//! - the validation family ([`InvalidAmount`], [`InvalidCategory`],
//!   [`InvalidDate`]) thrown when a draft expense is structurally invalid.
//! - [`QuotaExceeded`] thrown when the plan tier refuses a new expense for
//!   the candidate month. The draft itself is valid.
//! - [`Storage`] thrown when the backing store rejects a read or write.
//!
//!  [`InvalidAmount`]: LedgerError::InvalidAmount
//!  [`InvalidCategory`]: LedgerError::InvalidCategory
//!  [`InvalidDate`]: LedgerError::InvalidDate
//!  [`QuotaExceeded`]: LedgerError::QuotaExceeded
//!  [`Storage`]: LedgerError::Storage
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Monthly expense limit of {0} reached!")]
    QuotaExceeded(u32),
    #[error("Expense \"{0}\" not found!")]
    KeyNotFound(i64),
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("State serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed export row: {0}")]
    MalformedRow(String),
}

impl LedgerError {
    /// Returns `true` for rejections caused by a structurally invalid draft.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InvalidCategory(_)
                | Self::InvalidPaymentMethod(_)
                | Self::InvalidDate(_)
        )
    }
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCategory(a), Self::InvalidCategory(b)) => a == b,
            (Self::InvalidPaymentMethod(a), Self::InvalidPaymentMethod(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::QuotaExceeded(a), Self::QuotaExceeded(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            (Self::Json(a), Self::Json(b)) => a.to_string() == b.to_string(),
            (Self::Csv(a), Self::Csv(b)) => a.to_string() == b.to_string(),
            (Self::MalformedRow(a), Self::MalformedRow(b)) => a == b,
            _ => false,
        }
    }
}
