use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::{Result, TrackerError};
use crate::models::{CategorySum, Flow, NewTransaction, Transaction, TransactionId};

/// The live views the engine publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    AllTransactions,
    TotalIncome,
    TotalExpenses,
    TotalBalance,
    IncomeByCategory,
    ExpensesByCategory,
}

impl View {
    pub fn all() -> &'static [View] {
        &[
            Self::AllTransactions,
            Self::TotalIncome,
            Self::TotalExpenses,
            Self::TotalBalance,
            Self::IncomeByCategory,
            Self::ExpensesByCategory,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllTransactions => "all_transactions",
            Self::TotalIncome => "total_income",
            Self::TotalExpenses => "total_expenses",
            Self::TotalBalance => "total_balance",
            Self::IncomeByCategory => "income_by_category",
            Self::ExpensesByCategory => "expenses_by_category",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every view as of one point in time.
///
/// A snapshot is never mutated after it is built, so values read from the
/// same snapshot always agree with each other: `total_balance` is derived
/// from this snapshot's income and expenses and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    generation: u64,
    transactions: Vec<Transaction>,
    total_income: Decimal,
    total_expenses: Decimal,
    income_by_category: Vec<CategorySum>,
    expenses_by_category: Vec<CategorySum>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            transactions: Vec::new(),
            total_income: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            income_by_category: Vec::new(),
            expenses_by_category: Vec::new(),
        }
    }

    /// Recompute every view from the full record set. Fails with
    /// [`TrackerError::Validation`] if a total would leave `Decimal`'s range.
    pub(crate) fn build<'a>(
        generation: u64,
        records: impl IntoIterator<Item = &'a Transaction>,
    ) -> Result<Self> {
        let mut transactions: Vec<Transaction> = records.into_iter().cloned().collect();
        // Newest date first; for equal dates the later insert (higher id) wins.
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

        let mut total_income = Decimal::ZERO;
        let mut total_expenses = Decimal::ZERO;
        let mut income: BTreeMap<&str, Decimal> = BTreeMap::new();
        let mut expenses: BTreeMap<&str, Decimal> = BTreeMap::new();

        for txn in &transactions {
            let (total, groups) = if txn.is_income {
                (&mut total_income, &mut income)
            } else {
                (&mut total_expenses, &mut expenses)
            };
            *total = add_amount(*total, txn.amount)?;
            let group = groups.entry(txn.category.as_str()).or_insert(Decimal::ZERO);
            *group = add_amount(*group, txn.amount)?;
        }

        let income_by_category = into_sums(income);
        let expenses_by_category = into_sums(expenses);

        Ok(Self {
            generation,
            transactions,
            total_income,
            total_expenses,
            income_by_category,
            expenses_by_category,
        })
    }

    /// Check that adding `txns` on top of this snapshot keeps every total
    /// representable. Category sums never exceed their flow total, so the
    /// two flow totals are enough.
    pub(crate) fn ensure_room<'a>(
        &self,
        txns: impl IntoIterator<Item = &'a NewTransaction>,
    ) -> Result<()> {
        let mut income = self.total_income;
        let mut expenses = self.total_expenses;
        for txn in txns {
            let total = if txn.is_income() { &mut income } else { &mut expenses };
            *total = add_amount(*total, txn.amount())?;
        }
        Ok(())
    }

    /// Increments once per published rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sorted by date descending, most recent insert first among equal dates.
    pub fn all_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn total_income(&self) -> Decimal {
        self.total_income
    }

    pub fn total_expenses(&self) -> Decimal {
        self.total_expenses
    }

    pub fn total_balance(&self) -> Decimal {
        self.total_income - self.total_expenses
    }

    pub fn total(&self, flow: Flow) -> Decimal {
        match flow {
            Flow::Income => self.total_income,
            Flow::Expense => self.total_expenses,
        }
    }

    /// Ascending by category name.
    pub fn income_by_category(&self) -> &[CategorySum] {
        &self.income_by_category
    }

    /// Ascending by category name.
    pub fn expenses_by_category(&self) -> &[CategorySum] {
        &self.expenses_by_category
    }

    pub fn by_category(&self, flow: Flow) -> &[CategorySum] {
        match flow {
            Flow::Income => &self.income_by_category,
            Flow::Expense => &self.expenses_by_category,
        }
    }

    /// Savings rate in percent, `None` while there is no income.
    pub fn savings_rate(&self) -> Option<Decimal> {
        crate::analytics::savings_rate(self.total_income, self.total_expenses)
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Whether `view` holds a different value here than in `other`.
    pub fn view_differs(&self, other: &Snapshot, view: View) -> bool {
        match view {
            View::AllTransactions => self.transactions != other.transactions,
            View::TotalIncome => self.total_income != other.total_income,
            View::TotalExpenses => self.total_expenses != other.total_expenses,
            View::TotalBalance => self.total_balance() != other.total_balance(),
            View::IncomeByCategory => self.income_by_category != other.income_by_category,
            View::ExpensesByCategory => self.expenses_by_category != other.expenses_by_category,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

fn add_amount(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total.checked_add(amount).ok_or_else(|| {
        TrackerError::validation(format!(
            "amount {amount} would push a total past the largest supported value"
        ))
    })
}

fn into_sums(groups: BTreeMap<&str, Decimal>) -> Vec<CategorySum> {
    groups
        .into_iter()
        .map(|(category, total)| CategorySum::new(category, total))
        .collect()
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
