/// Direction of money for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Income,
    Expense,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" | "+" => Some(Self::Income),
            "expense" | "expenses" | "out" | "-" => Some(Self::Expense),
            _ => None,
        }
    }

    pub fn from_is_income(is_income: bool) -> Self {
        if is_income {
            Self::Income
        } else {
            Self::Expense
        }
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }

    pub fn all() -> &'static [Flow] {
        &[Self::Income, Self::Expense]
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
