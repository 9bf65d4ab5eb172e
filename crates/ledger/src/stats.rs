//! Derived statistics over the expense collection.
//!
//! Every function is pure: the reference date is a parameter, never read
//! from the ambient clock, so results are reproducible in tests.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Amount, Category, Expense, plan::PlanTier};

pub(crate) fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Sum of all recorded amounts.
pub fn lifetime_total(expenses: &[Expense]) -> Amount {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// Expenses whose date falls in the same calendar (year, month) as `today`.
pub fn month_bucket(expenses: &[Expense], today: NaiveDate) -> Vec<&Expense> {
    let key = month_key(today);
    expenses
        .iter()
        .filter(|expense| month_key(expense.date) == key)
        .collect()
}

/// Average spend per **active** month.
///
/// Expenses are grouped by (year, month); the result is the mean of the
/// per-group sums, rounded to the nearest cent. Months with no expenses do
/// not form groups, so this is not "per calendar month since first use".
/// Returns zero for an empty collection.
pub fn monthly_average(expenses: &[Expense]) -> Amount {
    if expenses.is_empty() {
        return Amount::ZERO;
    }

    let mut months: HashMap<(i32, u32), i64> = HashMap::new();
    for expense in expenses {
        *months.entry(month_key(expense.date)).or_insert(0) += expense.amount.cents();
    }

    let count = months.len() as i64;
    let total: i64 = months.values().sum();
    Amount::from_cents((total + count / 2) / count)
}

/// Category with the largest summed amount, with ties resolved to the
/// category seen first while scanning in collection order.
pub fn top_category<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Option<(Category, Amount)> {
    // Vec keeps first-seen order; hashing would make ties nondeterministic.
    let mut sums: Vec<(Category, Amount)> = Vec::new();
    for expense in expenses {
        match sums.iter_mut().find(|(category, _)| *category == expense.category) {
            Some((_, sum)) => *sum += expense.amount,
            None => sums.push((expense.category, expense.amount)),
        }
    }

    let mut best: Option<(Category, Amount)> = None;
    for (category, sum) in sums {
        match best {
            Some((_, best_sum)) if sum <= best_sum => {}
            _ => best = Some((category, sum)),
        }
    }
    best
}

/// Number of distinct calendar dates with at least one expense in the same
/// month as `today`.
pub fn distinct_spend_days(expenses: &[Expense], today: NaiveDate) -> usize {
    month_bucket(expenses, today)
        .iter()
        .map(|expense| expense.date)
        .collect::<HashSet<_>>()
        .len()
}

/// Quota usage as a percentage, saturated at 100.
///
/// An unbounded limit reports 0; a zero cap is already exhausted.
pub fn progress_percentage(count: usize, limit: Option<u32>) -> u8 {
    match limit {
        None => 0,
        Some(0) => 100,
        Some(limit) => (100 * count as u64 / u64::from(limit)).min(100) as u8,
    }
}

/// Snapshot of every derived statistic a front end renders.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Overview {
    pub lifetime_total: Amount,
    pub month_count: usize,
    pub month_total: Amount,
    pub monthly_average: Amount,
    pub top_category: Option<(Category, Amount)>,
    pub distinct_spend_days: usize,
    /// `None` means unbounded.
    pub remaining_this_month: Option<u32>,
    pub progress_percentage: u8,
}

impl Overview {
    pub(crate) fn compute(expenses: &[Expense], tier: &PlanTier, today: NaiveDate) -> Self {
        let bucket = month_bucket(expenses, today);
        let month_total = bucket.iter().map(|expense| expense.amount).sum();
        let month_count = bucket.len();
        let limit = tier.max_expenses_per_month;

        Self {
            lifetime_total: lifetime_total(expenses),
            month_count,
            month_total,
            monthly_average: monthly_average(expenses),
            top_category: top_category(bucket.iter().copied()),
            distinct_spend_days: distinct_spend_days(expenses, today),
            remaining_this_month: limit.map(|cap| cap.saturating_sub(month_count as u32)),
            progress_percentage: progress_percentage(month_count, limit),
        }
    }
}
