//! Per-expense visibility filtering.
//!
//! Filters are pure predicates evaluated against the in-memory snapshot on
//! every change; they never round-trip through storage.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::{Category, Expense, LedgerError, stats::month_key};

/// Category side of the filter. Parses from `"all"` or a category name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        Ok(Self::Only(s.parse()?))
    }
}

/// Month side of the filter. Parses from `"all"` or `"YYYY-MM"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MonthFilter {
    #[default]
    All,
    In {
        year: i32,
        month: u32,
    },
}

impl FromStr for MonthFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let invalid = || LedgerError::InvalidDate(format!("invalid month filter: {trimmed}"));

        let (year_str, month_str) = trimmed.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year_str.parse().map_err(|_| invalid())?;
        let month: u32 = month_str.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self::In { year, month })
    }
}

/// Combined visibility predicate over category and month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub category: CategoryFilter,
    pub month: MonthFilter,
}

impl ExpenseFilter {
    pub fn new(category: CategoryFilter, month: MonthFilter) -> Self {
        Self { category, month }
    }

    /// Both sides must accept; an `All` side accepts everything.
    pub fn is_visible(&self, expense: &Expense) -> bool {
        self.matches_category(expense.category) && self.matches_month(expense.date)
    }

    fn matches_category(&self, category: Category) -> bool {
        match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(selected) => category == selected,
        }
    }

    fn matches_month(&self, date: NaiveDate) -> bool {
        match self.month {
            MonthFilter::All => true,
            MonthFilter::In { year, month } => month_key(date) == (year, month),
        }
    }
}
