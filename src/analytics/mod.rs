//! Derived figures computed on demand from a snapshot. Nothing here is
//! stored; every function is pure.
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::engine::Snapshot;
use crate::models::{Flow, TransactionId};

/// Share of income kept, in percent, clamped to `0..=100`.
/// `None` when there is no income to compare against.
pub fn savings_rate(income: Decimal, expenses: Decimal) -> Option<Decimal> {
    if income <= Decimal::ZERO {
        return None;
    }
    // Out of range means far below zero or far above 100.
    let rate = match income.checked_sub(expenses) {
        Some(kept) => percent_of(kept, income).unwrap_or(if kept.is_sign_negative() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        }),
        None => Decimal::ONE_HUNDRED,
    };
    Some(rate.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
}

/// Percentage of `flow_total` made up by `amount`.
pub fn category_share(amount: Decimal, flow_total: Decimal) -> Option<Decimal> {
    if flow_total <= Decimal::ZERO {
        return None;
    }
    percent_of(amount, flow_total)
}

fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryShare {
    pub category: String,
    pub total: Decimal,
    /// Percent of the flow total.
    pub share: Option<Decimal>,
    /// Percent of the largest category in the same flow, for bar lengths.
    pub relative_to_max: Decimal,
}

/// Per-category totals of one flow with their shares, largest first.
/// Ties keep category name order.
pub fn category_breakdown(snapshot: &Snapshot, flow: Flow) -> Vec<CategoryShare> {
    let total = snapshot.total(flow);
    let sums = snapshot.by_category(flow);
    let max = sums
        .iter()
        .map(|c| c.total)
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut breakdown: Vec<CategoryShare> = sums
        .iter()
        .map(|c| CategoryShare {
            category: c.category.clone(),
            total: c.total,
            share: category_share(c.total, total),
            relative_to_max: percent_of(c.total, max).unwrap_or(Decimal::ZERO),
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.cmp(&a.total));
    breakdown
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendPoint {
    pub id: TransactionId,
    pub date: NaiveDateTime,
    /// Income positive, expense negative.
    pub amount: Decimal,
    /// Balance after this transaction.
    pub running_balance: Decimal,
}

/// Every transaction oldest first with its signed amount and the running
/// balance. The balance saturates rather than overflow.
pub fn trend(snapshot: &Snapshot) -> Vec<TrendPoint> {
    let mut balance = Decimal::ZERO;
    snapshot
        .all_transactions()
        .iter()
        .rev()
        .map(|t| {
            let amount = t.signed_amount();
            balance = balance.saturating_add(amount);
            TrendPoint {
                id: t.id,
                date: t.date,
                amount,
                running_balance: balance,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyTotals {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expenses: Decimal,
}

impl MonthlyTotals {
    pub fn net(&self) -> Decimal {
        self.income - self.expenses
    }
}

/// Income and expenses per calendar month, oldest first, for the latest
/// `months` months that have any transactions.
pub fn monthly_totals(snapshot: &Snapshot, months: usize) -> Vec<MonthlyTotals> {
    let mut by_month: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for txn in snapshot.all_transactions() {
        let entry = by_month
            .entry(txn.date.format("%Y-%m").to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        let total = if txn.is_income { &mut entry.0 } else { &mut entry.1 };
        *total = total.saturating_add(txn.amount);
    }

    let skip = by_month.len().saturating_sub(months);
    by_month
        .into_iter()
        .skip(skip)
        .map(|(month, (income, expenses))| MonthlyTotals {
            month,
            income,
            expenses,
        })
        .collect()
}

#[cfg(test)]
mod tests;
