use chrono::{DateTime, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::Flow;
use crate::error::{Result, TrackerError};

/// Store-assigned identifier. Never reused after a delete.
pub type TransactionId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub amount: Decimal,
    pub is_income: bool,
    pub category: String,
    pub date: NaiveDateTime,
}

impl Transaction {
    /// Rebuild a stored record, applying the same checks as an insert.
    pub fn from_record(
        id: TransactionId,
        description: &str,
        amount: Decimal,
        is_income: bool,
        category: &str,
        date: NaiveDateTime,
    ) -> Result<Self> {
        Ok(NewTransaction::new(description, amount, is_income, category, date)?.with_id(id))
    }

    pub fn flow(&self) -> Flow {
        Flow::from_is_income(self.is_income)
    }

    pub fn is_expense(&self) -> bool {
        !self.is_income
    }

    /// Amount with the flow applied: income positive, expense negative.
    pub fn signed_amount(&self) -> Decimal {
        if self.is_income {
            self.amount
        } else {
            -self.amount
        }
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.date.and_utc().timestamp()
    }
}

/// A validated transaction that has not been assigned an id yet.
///
/// This is the only shape a record store accepts, so every constructor runs
/// the full validation and an invalid record can't be stored, not even
/// partially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    description: String,
    amount: Decimal,
    is_income: bool,
    category: String,
    date: NaiveDateTime,
}

impl NewTransaction {
    pub fn new(
        description: &str,
        amount: Decimal,
        is_income: bool,
        category: &str,
        date: NaiveDateTime,
    ) -> Result<Self> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TrackerError::validation("description must not be blank"));
        }
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(TrackerError::validation(format!(
                "amount must not be negative, got {amount}"
            )));
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(TrackerError::validation("category must not be blank"));
        }

        Ok(Self {
            description: description.to_string(),
            amount: amount.abs(),
            is_income,
            category: category.to_string(),
            date: truncate_to_seconds(date),
        })
    }

    /// Like [`NewTransaction::new`] with the amount given as user text.
    pub fn parse(
        description: &str,
        amount: &str,
        is_income: bool,
        category: &str,
        date: NaiveDateTime,
    ) -> Result<Self> {
        let amount = parse_amount(amount)?;
        Self::new(description, amount, is_income, category, date)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_income(&self) -> bool {
        self.is_income
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn flow(&self) -> Flow {
        Flow::from_is_income(self.is_income)
    }

    pub(crate) fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            description: self.description,
            amount: self.amount,
            is_income: self.is_income,
            category: self.category,
            date: self.date,
        }
    }
}

/// Parse an amount as a user would type it: `$` and thousands separators
/// are ignored. Negative values parse here and are rejected by
/// [`NewTransaction::new`].
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let cleaned = s
        .replace(['$', ','], "")
        .replace('(', "-")
        .replace(')', "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return Err(TrackerError::validation("amount is required"));
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| TrackerError::validation(format!("'{}' is not a valid amount", s.trim())))
}

pub(crate) fn truncate_to_seconds(date: NaiveDateTime) -> NaiveDateTime {
    date.with_nanosecond(0).unwrap_or(date)
}

pub(crate) fn from_epoch_seconds(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|d| d.naive_utc())
}
