use std::collections::BTreeMap;

use super::{Callback, Change, RecordStore, Registry, SubscriptionId};
use crate::error::Result;
use crate::models::{NewTransaction, Transaction, TransactionId};

/// Non-durable store. Ids come from a counter that only grows, so a deleted
/// id is never handed out again.
#[derive(Debug)]
pub struct MemoryStore {
    records: BTreeMap<TransactionId, Transaction>,
    next_id: TransactionId,
    subscribers: Registry<Change>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
            subscribers: Registry::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.records.get(&id)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn scan_all(&self) -> Result<Vec<Transaction>> {
        Ok(self.records.values().cloned().collect())
    }

    fn insert(&mut self, txn: &NewTransaction) -> Result<TransactionId> {
        let id = self.next_id;
        self.next_id += 1;
        let stored = txn.clone().with_id(id);
        self.records.insert(id, stored.clone());
        self.subscribers.notify(&Change::Inserted(stored));
        Ok(id)
    }

    fn delete_by_id(&mut self, id: TransactionId) -> Result<bool> {
        let removed = self.records.remove(&id).is_some();
        if removed {
            self.subscribers.notify(&Change::Deleted(id));
        }
        Ok(removed)
    }

    fn on_change(&mut self, callback: Callback<Change>) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}
