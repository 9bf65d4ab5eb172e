use chrono::{DateTime, NaiveDate, Utc};

use ledger::{
    Amount, BillingCycle, Category, ExpenseDraft, ExpenseFilter, FREE_MAX_EXPENSES, FileStore,
    Ledger, LedgerError, MemoryStore, PaymentMethod, Tier, parse_date,
};

fn memory_ledger() -> Ledger<MemoryStore> {
    Ledger::builder().store(MemoryStore::new()).build().unwrap()
}

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn draft(cents: i64, category: Category, date: &str) -> ExpenseDraft {
    ExpenseDraft::new(Amount::from_cents(cents), category, day(date))
}

#[test]
fn empty_store_is_an_empty_ledger() {
    let ledger = memory_ledger();
    assert!(ledger.list_all().is_empty());

    let overview = ledger
        .overview(day("2024-03-15"), at("2024-03-15T12:00:00Z"))
        .unwrap();
    assert_eq!(overview.lifetime_total, Amount::ZERO);
    assert_eq!(overview.monthly_average, Amount::ZERO);
    assert_eq!(overview.month_count, 0);
    assert_eq!(overview.top_category, None);
}

#[test]
fn ids_are_unique_even_within_one_millisecond() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-15T12:00:00Z");

    for _ in 0..3 {
        ledger
            .add(draft(100, Category::Food, "2024-03-15"), now)
            .unwrap();
    }

    let mut ids: Vec<i64> = ledger.expenses().iter().map(|e| e.id).collect();
    assert_eq!(ids[0], now.timestamp_millis());
    let unique = ids.clone();
    ids.dedup();
    assert_eq!(ids, unique);
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn add_rejects_invalid_drafts() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-15T12:00:00Z");

    let err = ledger
        .add(draft(0, Category::Food, "2024-03-15"), now)
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
    assert!(err.is_validation());
    assert!(ledger.list_all().is_empty());

    // The string boundary rejects the rest before a draft can exist.
    assert!(matches!(
        "".parse::<Category>(),
        Err(LedgerError::InvalidCategory(_))
    ));
    assert!(matches!(
        "groceries".parse::<Category>(),
        Err(LedgerError::InvalidCategory(_))
    ));
    assert!(matches!(parse_date(""), Err(LedgerError::InvalidDate(_))));
    assert!(matches!(
        parse_date("15/03/2024"),
        Err(LedgerError::InvalidDate(_))
    ));
}

#[test]
fn removal_is_idempotent() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-15T12:00:00Z");
    let id = ledger
        .add(draft(100, Category::Food, "2024-03-15"), now)
        .unwrap()
        .id;
    ledger
        .add(draft(200, Category::Bills, "2024-03-16"), now)
        .unwrap();

    assert!(ledger.remove(id).unwrap());
    assert_eq!(ledger.list_all().len(), 1);
    assert!(!ledger.remove(id).unwrap());
    assert_eq!(ledger.list_all().len(), 1);
}

#[test]
fn list_all_is_newest_first_with_stable_ties() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-20T12:00:00Z");

    let first_tie = ledger
        .add(draft(100, Category::Food, "2024-03-10"), now)
        .unwrap()
        .id;
    ledger
        .add(draft(200, Category::Bills, "2024-03-01"), now)
        .unwrap();
    let second_tie = ledger
        .add(draft(300, Category::Leisure, "2024-03-10"), now)
        .unwrap()
        .id;
    ledger
        .add(draft(400, Category::Health, "2024-03-15"), now)
        .unwrap();

    let listed = ledger.list_all();
    let dates: Vec<NaiveDate> = listed.iter().map(|e| e.date).collect();
    assert!(dates.windows(2).all(|pair| pair[0] >= pair[1]));

    // Same date: insertion order is preserved.
    let tie_ids: Vec<i64> = listed
        .iter()
        .filter(|e| e.date == day("2024-03-10"))
        .map(|e| e.id)
        .collect();
    assert_eq!(tie_ids, vec![first_tie, second_tie]);
}

#[test]
fn single_expense_scenario() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-20T09:00:00Z");
    let mut entry = draft(25_50, Category::Food, "2024-03-15");
    entry.description = "lunch".to_string();
    ledger.add(entry, now).unwrap();

    let overview = ledger.overview(day("2024-03-20"), now).unwrap();
    assert_eq!(overview.lifetime_total, Amount::from_cents(25_50));
    assert_eq!(overview.month_count, 1);
    assert_eq!(overview.month_total, Amount::from_cents(25_50));
    assert_eq!(
        overview.top_category,
        Some((Category::Food, Amount::from_cents(25_50)))
    );
    assert_eq!(overview.distinct_spend_days, 1);
}

#[test]
fn monthly_average_spans_active_months_only() {
    let mut ledger = memory_ledger();
    let now = at("2024-02-10T12:00:00Z");
    ledger
        .add(draft(100_00, Category::Food, "2024-01-10"), now)
        .unwrap();
    ledger
        .add(draft(50_00, Category::Bills, "2024-01-20"), now)
        .unwrap();
    ledger
        .add(draft(30_00, Category::Food, "2024-02-05"), now)
        .unwrap();

    let overview = ledger.overview(day("2024-02-10"), now).unwrap();
    assert_eq!(overview.monthly_average, Amount::from_cents(90_00));
}

#[test]
fn free_tier_caps_the_month_and_pro_lifts_it() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-01T08:00:00Z");

    for i in 0..FREE_MAX_EXPENSES {
        let date = format!("2024-03-{:02}", 1 + (i % 28));
        ledger.add(draft(100, Category::Food, &date), now).unwrap();
    }

    assert!(!ledger.can_admit(day("2024-03-30"), now).unwrap());
    assert_eq!(
        ledger.remaining_this_month(day("2024-03-30"), now).unwrap(),
        Some(0)
    );
    let err = ledger
        .add(draft(100, Category::Food, "2024-03-30"), now)
        .unwrap_err();
    assert_eq!(err, LedgerError::QuotaExceeded(FREE_MAX_EXPENSES));

    // Another calendar month is a fresh bucket.
    assert!(ledger.can_admit(day("2024-04-01"), now).unwrap());

    let tier = ledger
        .upgrade(BillingCycle::Monthly, "sub_123", now)
        .unwrap();
    assert_eq!(tier.tier, Tier::Pro);
    assert!(ledger.can_admit(day("2024-03-30"), now).unwrap());
    assert_eq!(
        ledger.remaining_this_month(day("2024-03-30"), now).unwrap(),
        None
    );
    ledger
        .add(draft(100, Category::Food, "2024-03-30"), now)
        .unwrap();

    // An expired subscription is capped like free again.
    let much_later = at("2024-05-01T08:00:00Z");
    assert_eq!(
        ledger.current_plan(much_later).unwrap().tier,
        Tier::Free
    );
}

#[test]
fn export_import_round_trip() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-20T09:00:00Z");

    let mut lunch = draft(25_50, Category::Food, "2024-03-15");
    lunch.description = "lunch, \"al fresco\"".to_string();
    lunch.payment_method = PaymentMethod::CreditCard;
    ledger.add(lunch, now).unwrap();

    let mut bus = draft(2_00, Category::Transport, "2024-03-16");
    bus.payment_method = PaymentMethod::Cash;
    ledger.add(bus, now).unwrap();

    let exported = ledger.export_csv().unwrap();
    let original: Vec<_> = ledger
        .list_all()
        .into_iter()
        .map(|e| (e.date, e.category, e.payment_method, e.amount, e.description.clone()))
        .collect();

    ledger.clear().unwrap();
    assert!(ledger.list_all().is_empty());

    let imported = ledger.import_csv(&exported, now).unwrap();
    assert_eq!(imported, 2);
    let reloaded: Vec<_> = ledger
        .list_all()
        .into_iter()
        .map(|e| (e.date, e.category, e.payment_method, e.amount, e.description.clone()))
        .collect();
    assert_eq!(reloaded, original);
}

#[test]
fn filters_with_both_sides_all_accept_everything() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-20T09:00:00Z");
    ledger
        .add(draft(100, Category::Food, "2024-03-15"), now)
        .unwrap();
    ledger
        .add(draft(200, Category::Bills, "2023-11-02"), now)
        .unwrap();

    let filter = ExpenseFilter::default();
    assert!(ledger.list_all().iter().all(|e| filter.is_visible(e)));

    let march: ExpenseFilter = ExpenseFilter::new(
        "all".parse().unwrap(),
        "2024-03".parse().unwrap(),
    );
    let visible: Vec<_> = ledger
        .list_all()
        .into_iter()
        .filter(|e| march.is_visible(e))
        .collect();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].category, Category::Food);
}

#[test]
fn update_replaces_fields_but_preserves_identity() {
    let mut ledger = memory_ledger();
    let created = at("2024-03-15T12:00:00Z");
    let id = ledger
        .add(draft(100, Category::Food, "2024-03-15"), created)
        .unwrap()
        .id;

    let mut revised = draft(250, Category::Leisure, "2024-03-16");
    revised.description = "cinema".to_string();
    let updated = ledger.update(id, revised).unwrap();
    assert_eq!(updated.id, id);
    assert_eq!(updated.added_at, created);
    assert_eq!(updated.amount, Amount::from_cents(250));
    assert_eq!(updated.category, Category::Leisure);

    assert_eq!(
        ledger.update(9999, draft(100, Category::Food, "2024-03-15")),
        Err(LedgerError::KeyNotFound(9999))
    );
}

#[test]
fn file_store_persists_across_rebuilds() {
    let dir = tempfile::tempdir().unwrap();
    let now = at("2024-03-15T12:00:00Z");

    {
        let mut ledger = Ledger::builder()
            .store(FileStore::new(dir.path()))
            .build()
            .unwrap();
        ledger
            .add(draft(25_50, Category::Food, "2024-03-15"), now)
            .unwrap();
        ledger
            .upgrade(BillingCycle::Yearly, "sub_999", now)
            .unwrap();
    }

    let ledger = Ledger::builder()
        .store(FileStore::new(dir.path()))
        .build()
        .unwrap();
    assert_eq!(ledger.list_all().len(), 1);
    assert_eq!(ledger.expenses()[0].amount, Amount::from_cents(25_50));
    assert_eq!(ledger.current_plan(now).unwrap().tier, Tier::Pro);
}

#[test]
fn corrupt_expense_state_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("expenses"), "{definitely not json").unwrap();

    let ledger = Ledger::builder()
        .store(FileStore::new(dir.path()))
        .build()
        .unwrap();
    assert!(ledger.list_all().is_empty());
}

#[test]
fn import_respects_the_monthly_quota() {
    let mut ledger = memory_ledger();
    let now = at("2024-03-01T08:00:00Z");

    for i in 0..FREE_MAX_EXPENSES - 1 {
        let date = format!("2024-03-{:02}", 1 + (i % 28));
        ledger.add(draft(100, Category::Food, &date), now).unwrap();
    }

    let two_more = "Date,Description,Category,PaymentMethod,Amount\n\
                    30/03/2024,a,Food,Cash,1.00\n\
                    31/03/2024,b,Food,Cash,1.00\n";
    let err = ledger.import_csv(two_more, now).unwrap_err();
    assert_eq!(err, LedgerError::QuotaExceeded(FREE_MAX_EXPENSES));
    // All-or-nothing: the collection is unchanged.
    assert_eq!(ledger.list_all().len(), (FREE_MAX_EXPENSES - 1) as usize);
}
