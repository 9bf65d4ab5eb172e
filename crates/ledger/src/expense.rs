//! The module contains the `Expense` type, the sole persisted entity.

use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, Category, LedgerError};

/// Description stored when the user leaves the field blank.
pub const DESCRIPTION_PLACEHOLDER: &str = "Expense with no description";

/// How an expense was paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Transfer,
    #[default]
    Other,
}

impl PaymentMethod {
    /// Every payment method, in presentation order.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Transfer,
        PaymentMethod::Other,
    ];

    /// Returns the canonical name used in the persisted layout.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Transfer => "transfer",
            Self::Other => "other",
        }
    }

    /// Returns the human-readable label used in tables and exports.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::CreditCard => "Credit card",
            Self::DebitCard => "Debit card",
            Self::Transfer => "Transfer",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    /// Accepts the canonical name or the display name, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace([' ', '-'], "_").to_ascii_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == normalized)
            .ok_or_else(|| LedgerError::InvalidPaymentMethod(s.trim().to_string()))
    }
}

/// A recorded outflow.
///
/// Field names follow the persisted layout: a JSON array of camelCase
/// objects under the expenses key. `payment_method` defaults when absent so
/// records written by the minimal variant still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub amount: Amount,
    pub category: Category,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Set once at creation. Audit only, never used for business logic.
    pub added_at: DateTime<Utc>,
}

impl Expense {
    pub(crate) fn new(id: i64, draft: ExpenseDraft, added_at: DateTime<Utc>) -> Self {
        Self {
            id,
            amount: draft.amount,
            category: draft.category,
            date: draft.date,
            description: normalize_description(draft.description),
            payment_method: draft.payment_method,
            added_at,
        }
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.date, self.amount, self.category, self.description
        )
    }
}

/// Input for a new expense, before an id and audit timestamp exist.
///
/// The required fields are typed, so most structural invariants are
/// unrepresentable; [`validate`] covers the rest.
///
/// [`validate`]: ExpenseDraft::validate
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDraft {
    pub amount: Amount,
    pub category: Category,
    pub date: NaiveDate,
    pub description: String,
    pub payment_method: PaymentMethod,
}

impl ExpenseDraft {
    pub fn new(amount: Amount, category: Category, date: NaiveDate) -> Self {
        Self {
            amount,
            category,
            date,
            description: String::new(),
            payment_method: PaymentMethod::default(),
        }
    }

    /// Checks the invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !self.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "amount must be strictly positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn normalize_description(description: String) -> String {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        DESCRIPTION_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parses an ISO 8601 date (`YYYY-MM-DD`) from user input.
pub fn parse_date(s: &str) -> Result<NaiveDate, LedgerError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidDate("empty date".to_string()));
    }
    trimmed
        .parse::<NaiveDate>()
        .map_err(|_| LedgerError::InvalidDate(trimmed.to_string()))
}
