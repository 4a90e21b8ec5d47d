mod category;
mod flow;
mod transaction;

pub use category::{CategorySum, SUGGESTED_EXPENSE_CATEGORIES, SUGGESTED_INCOME_CATEGORIES};
pub use flow::Flow;
pub use transaction::{parse_amount, NewTransaction, Transaction, TransactionId};
pub(crate) use transaction::from_epoch_seconds;
