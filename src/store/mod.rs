//! Record stores: the durable source of truth the engine aggregates over.
mod memory;
mod notify;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use notify::{Callback, Registry, SubscriptionId};
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::models::{NewTransaction, Transaction, TransactionId};

/// Emitted after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Inserted(Transaction),
    Deleted(TransactionId),
}

/// Source of truth for transactions.
///
/// Implementations must hand out ids that grow with insertion order and are
/// never reused; the engine relies on that to order transactions that share
/// a date. `on_change` callbacks run synchronously after a mutation has been
/// applied.
pub trait RecordStore: Send {
    /// Every stored record, in no particular order.
    fn scan_all(&self) -> Result<Vec<Transaction>>;

    fn insert(&mut self, txn: &NewTransaction) -> Result<TransactionId>;

    /// Returns `true` if a record was removed.
    fn delete_by_id(&mut self, id: TransactionId) -> Result<bool>;

    fn on_change(&mut self, callback: Callback<Change>) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    /// Insert several records. Backends that can should make this
    /// all-or-nothing.
    fn insert_batch(&mut self, txns: &[NewTransaction]) -> Result<Vec<TransactionId>> {
        txns.iter().map(|txn| self.insert(txn)).collect()
    }
}

#[cfg(test)]
mod tests;
