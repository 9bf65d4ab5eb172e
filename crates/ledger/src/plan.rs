//! Plan tiers and monthly quota admission.
//!
//! The tier is never stored as an entity: it is reconstructed on every query
//! from three plain-string flag keys (tier name, subscription id, expiration
//! timestamp). The flags are a local cache of an entitlement, not a source
//! of truth; the resolver honors `pro` only while the recorded expiration
//! window is open, so a stale flag degrades to `free` on its own.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Expense, LedgerError,
    stats::month_key,
    store::{EXPIRATION_KEY, KeyValueStore, PLAN_KEY, SUBSCRIPTION_KEY},
};

/// Monthly expense cap of the free tier.
pub const FREE_MAX_EXPENSES: u32 = 50;
/// Category cap of the free tier. Unenforced while the vocabulary is closed;
/// kept so front ends can render the tier's limits.
pub const FREE_MAX_CATEGORIES: u32 = 8;

/// Entitlement level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing cycle of an upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    fn expiration_from(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            Self::Monthly => Months::new(1),
            Self::Yearly => Months::new(12),
        };
        now.checked_add_months(months).unwrap_or(now)
    }
}

impl FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(format!("unknown billing cycle: {other}")),
        }
    }
}

/// Resolved tier with its numeric limits. `None` = unbounded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTier {
    pub tier: Tier,
    pub max_expenses_per_month: Option<u32>,
    pub max_categories: Option<u32>,
}

impl PlanTier {
    pub fn free() -> Self {
        Self {
            tier: Tier::Free,
            max_expenses_per_month: Some(FREE_MAX_EXPENSES),
            max_categories: Some(FREE_MAX_CATEGORIES),
        }
    }

    pub fn pro() -> Self {
        Self {
            tier: Tier::Pro,
            max_expenses_per_month: None,
            max_categories: None,
        }
    }

    /// Resolves the active tier from stored flags.
    ///
    /// Anything other than a live `pro` flag is `free`: absent flags, an
    /// unknown tier name, or an expiration in the past.
    pub fn resolve(flags: &PlanFlags, now: DateTime<Utc>) -> Self {
        let is_pro = flags.plan.as_deref() == Some(Tier::Pro.as_str());
        let expired = flags.expires_at.is_some_and(|expires_at| expires_at < now);
        if is_pro && !expired {
            Self::pro()
        } else {
            Self::free()
        }
    }

    /// Whether a new expense dated `candidate_date` may be admitted.
    ///
    /// Bounded tiers count existing expenses in the same calendar
    /// (year, month) as the candidate and admit strictly below the cap.
    pub fn can_admit(&self, expenses: &[Expense], candidate_date: NaiveDate) -> bool {
        match self.max_expenses_per_month {
            None => true,
            Some(cap) => (count_in_month(expenses, candidate_date) as u32) < cap,
        }
    }

    /// Entries still admissible in the month of `today`. `None` = unbounded.
    pub fn remaining_this_month(&self, expenses: &[Expense], today: NaiveDate) -> Option<u32> {
        self.max_expenses_per_month
            .map(|cap| cap.saturating_sub(count_in_month(expenses, today) as u32))
    }
}

fn count_in_month(expenses: &[Expense], reference: NaiveDate) -> usize {
    let key = month_key(reference);
    expenses
        .iter()
        .filter(|expense| month_key(expense.date) == key)
        .count()
}

/// The raw plan flags, as persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanFlags {
    pub plan: Option<String>,
    pub subscription_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PlanFlags {
    /// Reads the flag keys from the store. Absent keys stay `None`; an
    /// unparsable expiration is dropped with a warning so a corrupt flag
    /// can never lock the ledger.
    pub fn load<S: KeyValueStore>(store: &S) -> Result<Self, LedgerError> {
        let plan = store.read(PLAN_KEY)?;
        let subscription_id = store.read(SUBSCRIPTION_KEY)?;
        let expires_at = match store.read(EXPIRATION_KEY)? {
            None => None,
            Some(raw) => match raw.parse::<DateTime<Utc>>() {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    tracing::warn!("discarding unparsable plan expiration: {err}");
                    None
                }
            },
        };

        Ok(Self {
            plan,
            subscription_id,
            expires_at,
        })
    }

    /// Writes the flag keys back to the store, removing absent ones.
    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<(), LedgerError> {
        write_or_remove(store, PLAN_KEY, self.plan.as_deref())?;
        write_or_remove(store, SUBSCRIPTION_KEY, self.subscription_id.as_deref())?;
        let expiration = self.expires_at.map(|expires_at| expires_at.to_rfc3339());
        write_or_remove(store, EXPIRATION_KEY, expiration.as_deref())?;
        Ok(())
    }

    /// Transitions the flags to `pro`.
    ///
    /// A trusted local simulation of an entitlement event: the expiration is
    /// now + 1 month (monthly) or now + 1 year (yearly). A verified external
    /// source would overwrite these same flags in a real deployment.
    pub fn upgrade(&mut self, cycle: BillingCycle, subscription_id: &str, now: DateTime<Utc>) {
        self.plan = Some(Tier::Pro.as_str().to_string());
        self.subscription_id = Some(subscription_id.to_string());
        self.expires_at = Some(cycle.expiration_from(now));
        tracing::info!(
            subscription = subscription_id,
            expires_at = %self.expires_at.map(|at| at.to_rfc3339()).unwrap_or_default(),
            "plan upgraded to pro"
        );
    }
}

fn write_or_remove<S: KeyValueStore>(
    store: &mut S,
    key: &str,
    value: Option<&str>,
) -> Result<(), LedgerError> {
    match value {
        Some(value) => store.write(key, value)?,
        None => store.remove(key)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Amount, Category, ExpenseDraft, store::MemoryStore};

    fn now() -> DateTime<Utc> {
        "2024-03-15T12:00:00Z".parse().unwrap()
    }

    fn expenses_in_march(count: usize) -> Vec<Expense> {
        (0..count)
            .map(|i| {
                Expense::new(
                    i as i64,
                    ExpenseDraft::new(
                        Amount::from_cents(100),
                        Category::Food,
                        NaiveDate::from_ymd_opt(2024, 3, 1 + (i % 28) as u32).unwrap(),
                    ),
                    now(),
                )
            })
            .collect()
    }

    #[test]
    fn absent_flags_resolve_to_free() {
        let store = MemoryStore::new();
        let flags = PlanFlags::load(&store).unwrap();
        assert_eq!(PlanTier::resolve(&flags, now()), PlanTier::free());
    }

    #[test]
    fn upgrade_round_trips_through_store() {
        let mut store = MemoryStore::new();
        let mut flags = PlanFlags::load(&store).unwrap();
        flags.upgrade(BillingCycle::Monthly, "sub_123", now());
        flags.save(&mut store).unwrap();

        let reloaded = PlanFlags::load(&store).unwrap();
        assert_eq!(reloaded.plan.as_deref(), Some("pro"));
        assert_eq!(reloaded.subscription_id.as_deref(), Some("sub_123"));
        assert_eq!(
            reloaded.expires_at,
            Some("2024-04-15T12:00:00Z".parse::<DateTime<Utc>>().unwrap())
        );
        assert_eq!(PlanTier::resolve(&reloaded, now()), PlanTier::pro());
    }

    #[test]
    fn yearly_upgrade_expires_after_a_year() {
        let mut flags = PlanFlags::default();
        flags.upgrade(BillingCycle::Yearly, "sub_456", now());
        assert_eq!(
            flags.expires_at,
            Some("2025-03-15T12:00:00Z".parse::<DateTime<Utc>>().unwrap())
        );
    }

    #[test]
    fn expired_pro_degrades_to_free() {
        let mut flags = PlanFlags::default();
        flags.upgrade(BillingCycle::Monthly, "sub_789", now());
        let after_expiry = "2024-05-01T00:00:00Z".parse().unwrap();
        assert_eq!(PlanTier::resolve(&flags, after_expiry), PlanTier::free());
    }

    #[test]
    fn free_tier_admits_strictly_below_cap() {
        let candidate = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let tier = PlanTier::free();

        let under = expenses_in_march(FREE_MAX_EXPENSES as usize - 1);
        assert!(tier.can_admit(&under, candidate));

        let at_cap = expenses_in_march(FREE_MAX_EXPENSES as usize);
        assert!(!tier.can_admit(&at_cap, candidate));
        assert!(PlanTier::pro().can_admit(&at_cap, candidate));

        // Another month is a fresh bucket.
        let next_month = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(tier.can_admit(&at_cap, next_month));
    }

    #[test]
    fn remaining_counts_down_and_saturates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let tier = PlanTier::free();
        assert_eq!(tier.remaining_this_month(&[], today), Some(FREE_MAX_EXPENSES));
        assert_eq!(
            tier.remaining_this_month(&expenses_in_march(48), today),
            Some(2)
        );
        assert_eq!(
            tier.remaining_this_month(&expenses_in_march(60), today),
            Some(0)
        );
        assert_eq!(PlanTier::pro().remaining_this_month(&[], today), None);
    }

    #[test]
    fn unknown_tier_name_resolves_to_free() {
        let flags = PlanFlags {
            plan: Some("platinum".to_string()),
            subscription_id: None,
            expires_at: None,
        };
        assert_eq!(PlanTier::resolve(&flags, now()), PlanTier::free());
    }
}
