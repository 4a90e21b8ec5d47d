#![allow(clippy::unwrap_used)]

use super::*;
use crate::engine::Engine;
use crate::store::MemoryStore;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn sample() -> Engine<MemoryStore> {
    let engine = Engine::open(MemoryStore::new()).unwrap();
    engine.add_transaction("Pay", "3000", true, "Salary", at(2024, 1, 1)).unwrap();
    engine.add_transaction("Rent", "1200", false, "Bills", at(2024, 1, 3)).unwrap();
    engine.add_transaction("Groceries", "300", false, "Food", at(2024, 1, 10)).unwrap();
    engine.add_transaction("Pay", "3000", true, "Salary", at(2024, 2, 1)).unwrap();
    engine.add_transaction("Gig", "500", true, "Freelance", at(2024, 2, 14)).unwrap();
    engine.add_transaction("Rent", "1200", false, "Bills", at(2024, 2, 3)).unwrap();
    engine
}

// ── savings_rate ──────────────────────────────────────────────

#[test]
fn test_savings_rate_basic() {
    assert_eq!(savings_rate(dec!(1000), dec!(200)), Some(dec!(80)));
    assert_eq!(savings_rate(dec!(400), dec!(100)), Some(dec!(75)));
}

#[test]
fn test_savings_rate_undefined_without_income() {
    assert_eq!(savings_rate(Decimal::ZERO, Decimal::ZERO), None);
    assert_eq!(savings_rate(Decimal::ZERO, dec!(50)), None);
}

#[test]
fn test_savings_rate_clamped() {
    // Spending more than earned bottoms out at zero.
    assert_eq!(savings_rate(dec!(100), dec!(250)), Some(Decimal::ZERO));
    assert_eq!(savings_rate(dec!(100), Decimal::ZERO), Some(dec!(100)));
}

// ── category_share ────────────────────────────────────────────

#[test]
fn test_category_share() {
    assert_eq!(category_share(dec!(25), dec!(200)), Some(dec!(12.5)));
    assert_eq!(category_share(dec!(25), Decimal::ZERO), None);
}

#[test]
fn test_category_breakdown_largest_first() {
    let engine = sample();
    let breakdown = category_breakdown(&engine.snapshot(), Flow::Expense);
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].category, "Bills");
    assert_eq!(breakdown[0].total, dec!(2400));
    assert_eq!(breakdown[0].relative_to_max, dec!(100));
    assert_eq!(breakdown[1].category, "Food");
    assert_eq!(breakdown[1].relative_to_max, dec!(12.5));
    assert!(breakdown[0].share.unwrap() > breakdown[1].share.unwrap());
}

#[test]
fn test_category_breakdown_empty() {
    let engine = Engine::open(MemoryStore::new()).unwrap();
    assert!(category_breakdown(&engine.snapshot(), Flow::Income).is_empty());
}

// ── trend ─────────────────────────────────────────────────────

#[test]
fn test_trend_oldest_first_with_running_balance() {
    let engine = sample();
    let points = trend(&engine.snapshot());
    assert_eq!(points.len(), 6);
    assert_eq!(points[0].date, at(2024, 1, 1));
    assert_eq!(points[0].amount, dec!(3000));
    assert_eq!(points[1].amount, dec!(-1200));
    assert_eq!(points[1].running_balance, dec!(1800));
    let last = points.last().unwrap();
    assert_eq!(last.date, at(2024, 2, 14));
    assert_eq!(last.running_balance, engine.total_balance());
}

#[test]
fn test_trend_same_date_keeps_insert_order() {
    let engine = Engine::open(MemoryStore::new()).unwrap();
    let a = engine.add_transaction("A", "1", true, "Other", at(2024, 1, 1)).unwrap();
    let b = engine.add_transaction("B", "2", false, "Other", at(2024, 1, 1)).unwrap();
    let ids: Vec<_> = trend(&engine.snapshot()).iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a, b]);
}

// ── monthly_totals ────────────────────────────────────────────

#[test]
fn test_monthly_totals() {
    let engine = sample();
    let months = monthly_totals(&engine.snapshot(), 12);
    assert_eq!(
        months,
        vec![
            MonthlyTotals {
                month: "2024-01".into(),
                income: dec!(3000),
                expenses: dec!(1500),
            },
            MonthlyTotals {
                month: "2024-02".into(),
                income: dec!(3500),
                expenses: dec!(1200),
            },
        ]
    );
    assert_eq!(months[1].net(), dec!(2300));
}

#[test]
fn test_monthly_totals_limited_to_latest() {
    let engine = sample();
    let months = monthly_totals(&engine.snapshot(), 1);
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].month, "2024-02");
    assert!(monthly_totals(&engine.snapshot(), 0).is_empty());
}

// ── Range limits ──────────────────────────────────────────────

#[test]
fn test_savings_rate_tiny_income_huge_expenses() {
    assert_eq!(
        savings_rate(dec!(0.0000001), dec!(10000000000000000000000)),
        Some(Decimal::ZERO)
    );
    assert_eq!(savings_rate(dec!(0.0000001), Decimal::MAX), Some(Decimal::ZERO));
}

#[test]
fn test_savings_rate_at_decimal_max() {
    assert_eq!(savings_rate(Decimal::MAX, Decimal::ZERO), Some(dec!(100)));
    assert_eq!(savings_rate(Decimal::MAX, Decimal::MAX), Some(Decimal::ZERO));
}

#[test]
fn test_category_share_out_of_range_is_none() {
    assert_eq!(category_share(Decimal::MAX, dec!(0.0000001)), None);
}

#[test]
fn test_trend_and_monthly_totals_near_max() {
    let engine = Engine::open(MemoryStore::new()).unwrap();
    let max = Decimal::MAX.to_string();
    engine.add_transaction("In", &max, true, "Other", at(2024, 1, 1)).unwrap();
    engine.add_transaction("Out", &max, false, "Other", at(2024, 1, 2)).unwrap();

    let points = trend(&engine.snapshot());
    assert_eq!(points[0].running_balance, Decimal::MAX);
    assert_eq!(points[1].running_balance, Decimal::ZERO);

    let months = monthly_totals(&engine.snapshot(), 1);
    assert_eq!(months[0].income, Decimal::MAX);
    assert_eq!(months[0].net(), Decimal::ZERO);
}
