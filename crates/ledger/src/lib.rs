//! Expense ledger core: persistence, plan gating, statistics, filtering and
//! CSV export over a local key-value store.

use std::io;

use chrono::{DateTime, NaiveDate, Utc};

pub use category::Category;
pub use error::LedgerError;
pub use expense::{DESCRIPTION_PLACEHOLDER, Expense, ExpenseDraft, PaymentMethod, parse_date};
pub use filter::{CategoryFilter, ExpenseFilter, MonthFilter};
pub use money::Amount;
pub use plan::{BillingCycle, FREE_MAX_CATEGORIES, FREE_MAX_EXPENSES, PlanFlags, PlanTier, Tier};
pub use stats::Overview;
pub use store::{FileStore, KeyValueStore, MemoryStore};

mod category;
mod error;
mod expense;
pub mod export;
mod filter;
mod money;
mod plan;
pub mod stats;
pub mod store;

type ResultLedger<T> = Result<T, LedgerError>;

/// The expense repository plus the plan policy wired over one store.
///
/// The collection is loaded once at build time; every mutation goes through
/// `&mut self` and persists before returning. A failed save surfaces
/// [`LedgerError::Storage`] but keeps the in-memory change, so the caller can
/// retry the next mutation or warn that data is unsaved.
#[derive(Debug)]
pub struct Ledger<S: KeyValueStore> {
    store: S,
    expenses: Vec<Expense>,
}

/// Builder for [`Ledger`].
pub struct LedgerBuilder<S> {
    store: Option<S>,
}

impl<S> Default for LedgerBuilder<S> {
    fn default() -> Self {
        Self { store: None }
    }
}

impl<S: KeyValueStore> LedgerBuilder<S> {
    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> ResultLedger<Ledger<S>> {
        let store = self
            .store
            .ok_or_else(|| LedgerError::Storage(io::Error::other("no store configured")))?;
        let expenses = store::load_expenses(&store)?;
        Ok(Ledger { store, expenses })
    }
}

impl<S: KeyValueStore> Ledger<S> {
    /// Return a builder for `Ledger`.
    pub fn builder() -> LedgerBuilder<S> {
        LedgerBuilder::default()
    }

    /// The collection in storage order. Presentation uses [`list_all`].
    ///
    /// [`list_all`]: Ledger::list_all
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Records a new expense.
    ///
    /// Validation runs first, then plan admission for the draft's month;
    /// only an admitted draft mutates the collection. The id is the creation
    /// timestamp in milliseconds, bumped past the current maximum when two
    /// adds land in the same millisecond.
    pub fn add(&mut self, draft: ExpenseDraft, now: DateTime<Utc>) -> ResultLedger<&Expense> {
        draft.validate()?;

        let tier = self.current_plan(now)?;
        if let Some(cap) = tier.max_expenses_per_month
            && !tier.can_admit(&self.expenses, draft.date)
        {
            tracing::debug!(cap, date = %draft.date, "expense refused by plan quota");
            return Err(LedgerError::QuotaExceeded(cap));
        }

        let id = next_id(&self.expenses, now);
        let expense = Expense::new(id, draft, now);
        tracing::debug!(id, amount = %expense.amount, category = %expense.category, "expense added");
        self.expenses.push(expense);
        self.persist()?;

        Ok(&self.expenses[self.expenses.len() - 1])
    }

    /// Replaces the expense with the given id, preserving its `id` and
    /// `added_at`.
    pub fn update(&mut self, id: i64, draft: ExpenseDraft) -> ResultLedger<&Expense> {
        draft.validate()?;

        match self.expenses.iter().position(|expense| expense.id == id) {
            Some(index) => {
                let added_at = self.expenses[index].added_at;
                self.expenses[index] = Expense::new(id, draft, added_at);
                self.persist()?;
                Ok(&self.expenses[index])
            }
            None => Err(LedgerError::KeyNotFound(id)),
        }
    }

    /// Removes an expense by id.
    ///
    /// Idempotent: removing an absent id returns `Ok(false)`.
    pub fn remove(&mut self, id: i64) -> ResultLedger<bool> {
        match self.expenses.iter().position(|expense| expense.id == id) {
            Some(index) => {
                let expense = self.expenses.remove(index);
                tracing::debug!(id = expense.id, "expense removed");
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes every expense unconditionally.
    ///
    /// Irreversible; the caller asks for confirmation, not the ledger.
    pub fn clear(&mut self) -> ResultLedger<()> {
        self.expenses.clear();
        self.store.remove(store::EXPENSES_KEY)?;
        tracing::info!("expense collection cleared");
        Ok(())
    }

    /// Every expense, newest date first; ties keep insertion order.
    pub fn list_all(&self) -> Vec<&Expense> {
        let mut items: Vec<&Expense> = self.expenses.iter().collect();
        items.sort_by(|a, b| b.date.cmp(&a.date));
        items
    }

    /// The active plan tier, resolved fresh from the stored flags.
    pub fn current_plan(&self, now: DateTime<Utc>) -> ResultLedger<PlanTier> {
        let flags = PlanFlags::load(&self.store)?;
        Ok(PlanTier::resolve(&flags, now))
    }

    /// Whether a new expense dated `candidate_date` would be admitted.
    pub fn can_admit(&self, candidate_date: NaiveDate, now: DateTime<Utc>) -> ResultLedger<bool> {
        Ok(self
            .current_plan(now)?
            .can_admit(&self.expenses, candidate_date))
    }

    /// Entries still admissible in the month of `today`. `None` = unbounded.
    pub fn remaining_this_month(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultLedger<Option<u32>> {
        Ok(self
            .current_plan(now)?
            .remaining_this_month(&self.expenses, today))
    }

    /// Upgrades the stored plan flags to `pro` and returns the new tier.
    pub fn upgrade(
        &mut self,
        cycle: BillingCycle,
        subscription_id: &str,
        now: DateTime<Utc>,
    ) -> ResultLedger<PlanTier> {
        let mut flags = PlanFlags::load(&self.store)?;
        flags.upgrade(cycle, subscription_id, now);
        flags.save(&mut self.store)?;
        Ok(PlanTier::resolve(&flags, now))
    }

    /// Every derived statistic in one snapshot.
    ///
    /// `today` drives the calendar-month buckets (the caller's local date);
    /// `now` resolves the plan tier.
    pub fn overview(&self, today: NaiveDate, now: DateTime<Utc>) -> ResultLedger<Overview> {
        let tier = self.current_plan(now)?;
        Ok(Overview::compute(&self.expenses, &tier, today))
    }

    /// CSV document of the full collection in presentation order.
    pub fn export_csv(&self) -> ResultLedger<String> {
        export::to_csv(self.list_all())
    }

    /// Re-ingests a document produced by [`export_csv`].
    ///
    /// All-or-nothing: every row is validated and admitted against the plan
    /// before anything is appended or persisted. Returns the number of
    /// imported expenses.
    ///
    /// [`export_csv`]: Ledger::export_csv
    pub fn import_csv(&mut self, text: &str, now: DateTime<Utc>) -> ResultLedger<usize> {
        let drafts = export::from_csv(text)?;
        let tier = self.current_plan(now)?;

        let mut next = self.expenses.clone();
        for draft in drafts {
            draft.validate()?;
            if let Some(cap) = tier.max_expenses_per_month
                && !tier.can_admit(&next, draft.date)
            {
                return Err(LedgerError::QuotaExceeded(cap));
            }
            let id = next_id(&next, now);
            next.push(Expense::new(id, draft, now));
        }

        let count = next.len() - self.expenses.len();
        self.expenses = next;
        self.persist()?;
        tracing::info!(count, "expenses imported");
        Ok(count)
    }

    fn persist(&mut self) -> ResultLedger<()> {
        if let Err(err) = store::save_expenses(&mut self.store, &self.expenses) {
            tracing::error!("failed to persist expenses: {err}");
            return Err(err);
        }
        Ok(())
    }
}

/// Creation-ordered unique id: the creation timestamp in milliseconds,
/// bumped past the current maximum on collision.
fn next_id(expenses: &[Expense], now: DateTime<Utc>) -> i64 {
    let candidate = now.timestamp_millis();
    match expenses.iter().map(|expense| expense.id).max() {
        Some(max_id) if candidate <= max_id => max_id + 1,
        _ => candidate,
    }
}
