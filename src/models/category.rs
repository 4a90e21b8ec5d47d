use rust_decimal::Decimal;

use super::Flow;

pub const SUGGESTED_INCOME_CATEGORIES: &[&str] = &["Salary", "Freelance", "Investment", "Other"];

pub const SUGGESTED_EXPENSE_CATEGORIES: &[&str] = &["Food", "Transport", "Bills", "Shopping", "Other"];

impl Flow {
    /// Categories offered to the user for this flow. Any other non-blank
    /// label is accepted as well.
    pub fn suggested_categories(&self) -> &'static [&'static str] {
        match self {
            Self::Income => SUGGESTED_INCOME_CATEGORIES,
            Self::Expense => SUGGESTED_EXPENSE_CATEGORIES,
        }
    }

    /// Case-insensitive check against the suggested list.
    pub fn is_suggested(&self, category: &str) -> bool {
        let lower = category.trim().to_lowercase();
        self.suggested_categories()
            .iter()
            .any(|c| c.to_lowercase() == lower)
    }
}

/// Total amount of one category within one flow direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySum {
    pub category: String,
    pub total: Decimal,
}

impl CategorySum {
    pub fn new(category: impl Into<String>, total: Decimal) -> Self {
        Self {
            category: category.into(),
            total,
        }
    }
}

impl std::fmt::Display for CategorySum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:.2}", self.category, self.total)
    }
}
