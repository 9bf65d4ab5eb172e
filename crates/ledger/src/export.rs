//! CSV export of the expense collection, and the matching import.
//!
//! The document starts with a `Date,Description,Category,PaymentMethod,Amount`
//! header and carries one row per expense in the caller's order. Quoting and
//! escaping follow standard CSV rules, so the output of [`to_csv`] always
//! parses back through [`from_csv`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Expense, ExpenseDraft, LedgerError};

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExportRow {
    date: String,
    description: String,
    category: String,
    payment_method: String,
    amount: String,
}

impl From<&Expense> for ExportRow {
    fn from(expense: &Expense) -> Self {
        Self {
            date: expense.date.format(DATE_FORMAT).to_string(),
            description: expense.description.clone(),
            category: expense.category.display_name().to_string(),
            payment_method: expense.payment_method.display_name().to_string(),
            amount: expense.amount.to_string(),
        }
    }
}

/// Serializes expenses into a CSV document.
///
/// Pass the collection in presentation order (`Ledger::list_all`); the
/// formatter does not sort.
pub fn to_csv<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Result<String, LedgerError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    let mut wrote_any = false;
    for expense in expenses {
        writer.serialize(ExportRow::from(expense))?;
        wrote_any = true;
    }
    if !wrote_any {
        // serialize() emits the header with the first row; an empty export
        // still carries one.
        writer.write_record(["Date", "Description", "Category", "PaymentMethod", "Amount"])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| LedgerError::Storage(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| LedgerError::MalformedRow(err.to_string()))
}

/// Parses a document produced by [`to_csv`] back into expense drafts.
///
/// Each row goes through the same vocabulary and amount validation as manual
/// entry; the first offending row aborts the import.
pub fn from_csv(text: &str) -> Result<Vec<ExpenseDraft>, LedgerError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut drafts = Vec::new();

    for (index, row) in reader.deserialize::<ExportRow>().enumerate() {
        let row = row?;
        let line = index + 2; // header is line 1

        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
            .map_err(|_| LedgerError::MalformedRow(format!("line {line}: bad date {}", row.date)))?;
        let amount = row
            .amount
            .parse()
            .map_err(|_| LedgerError::MalformedRow(format!("line {line}: bad amount {}", row.amount)))?;
        let category = row
            .category
            .parse()
            .map_err(|_| LedgerError::MalformedRow(format!("line {line}: bad category {}", row.category)))?;
        let payment_method = row
            .payment_method
            .parse()
            .map_err(|_| {
                LedgerError::MalformedRow(format!(
                    "line {line}: bad payment method {}",
                    row.payment_method
                ))
            })?;

        let mut draft = ExpenseDraft::new(amount, category, date);
        draft.description = row.description;
        draft.payment_method = payment_method;
        drafts.push(draft);
    }

    Ok(drafts)
}

/// File name for an export taken on `today`.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("homebudget-export-{}.csv", today.format("%Y-%m-%d"))
}
