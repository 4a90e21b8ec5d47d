//! The aggregation engine.
//!
//! The engine owns a [`RecordStore`] and keeps an immutable [`Snapshot`] of
//! every derived view in sync with it. Mutations go through a single writer
//! lock: the store applies the change and emits it on a channel, the engine
//! drains that channel, rebuilds a new snapshot from the full record set and
//! swaps it in. Readers only ever clone an `Arc`, so they see either the old
//! snapshot or the new one, never a mix.
mod snapshot;

pub use snapshot::{Snapshot, View};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::error::Result;
use crate::models::{NewTransaction, Transaction, TransactionId};
use crate::store::{Change, RecordStore, Registry, SubscriptionId};

/// Delivered to observers after each published rebuild.
#[derive(Debug, Clone)]
pub struct ViewUpdate {
    pub previous: Arc<Snapshot>,
    pub current: Arc<Snapshot>,
}

impl ViewUpdate {
    pub fn changed(&self, view: View) -> bool {
        self.current.view_differs(&self.previous, view)
    }
}

struct Writer<S> {
    store: S,
    changes: Receiver<Change>,
    records: BTreeMap<TransactionId, Transaction>,
    store_subscription: SubscriptionId,
}

pub struct Engine<S: RecordStore> {
    writer: Mutex<Writer<S>>,
    current: RwLock<Arc<Snapshot>>,
    observers: Registry<ViewUpdate>,
}

impl<S: RecordStore> Engine<S> {
    /// Load every record from `store` and start tracking its changes.
    pub fn open(mut store: S) -> Result<Self> {
        let (sender, changes) = mpsc::channel();
        let store_subscription = store.on_change(Box::new(move |change: &Change| {
            // The receiver lives as long as the engine; a failed send only
            // happens while the engine is being dropped.
            let _ = sender.send(change.clone());
        }));

        let loaded = store.scan_all().and_then(|loaded| {
            let records: BTreeMap<_, _> = loaded.into_iter().map(|t| (t.id, t)).collect();
            let snapshot = Snapshot::build(1, records.values())?;
            Ok((records, snapshot))
        });
        let (records, snapshot) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, "initial load failed");
                store.unsubscribe(store_subscription);
                return Err(e);
            }
        };
        tracing::info!(
            transactions = snapshot.len(),
            balance = %snapshot.total_balance(),
            "engine loaded"
        );

        Ok(Self {
            writer: Mutex::new(Writer {
                store,
                changes,
                records,
                store_subscription,
            }),
            current: RwLock::new(Arc::new(snapshot)),
            observers: Registry::new(),
        })
    }

    // ── Commands ──────────────────────────────────────────────

    /// Validate and store a new transaction. `amount` is the user's text.
    pub fn add_transaction(
        &self,
        description: &str,
        amount: &str,
        is_income: bool,
        category: &str,
        date: NaiveDateTime,
    ) -> Result<TransactionId> {
        let txn = NewTransaction::parse(description, amount, is_income, category, date)
            .inspect_err(|e| tracing::warn!(error = %e, "rejected transaction"))?;
        self.insert(txn)
    }

    /// Store an already validated transaction.
    pub fn insert(&self, txn: NewTransaction) -> Result<TransactionId> {
        let mut writer = self.lock_writer();
        self.snapshot()
            .ensure_room([&txn])
            .inspect_err(|e| tracing::warn!(error = %e, "rejected transaction"))?;
        let result = writer.store.insert(&txn);
        self.sync(&mut writer);
        match result {
            Ok(id) => {
                tracing::info!(
                    id,
                    flow = %txn.flow(),
                    amount = %txn.amount(),
                    category = txn.category(),
                    "transaction added"
                );
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to store transaction");
                Err(e)
            }
        }
    }

    /// Remove a transaction. Unknown ids are a no-op and return `false`.
    pub fn delete_transaction(&self, id: TransactionId) -> Result<bool> {
        let mut writer = self.lock_writer();
        let result = writer.store.delete_by_id(id);
        self.sync(&mut writer);
        match result {
            Ok(removed) => {
                if removed {
                    tracing::info!(id, "transaction deleted");
                } else {
                    tracing::debug!(id, "delete of unknown transaction ignored");
                }
                Ok(removed)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to delete transaction");
                Err(e)
            }
        }
    }

    /// Store a batch of transactions and publish a single rebuild.
    pub fn import_records(&self, txns: &[NewTransaction]) -> Result<Vec<TransactionId>> {
        let mut writer = self.lock_writer();
        self.snapshot()
            .ensure_room(txns)
            .inspect_err(|e| tracing::warn!(error = %e, "rejected import"))?;
        let result = writer.store.insert_batch(txns);
        self.sync(&mut writer);
        match result {
            Ok(ids) => {
                tracing::info!(count = ids.len(), "transactions imported");
                Ok(ids)
            }
            Err(e) => {
                tracing::warn!(error = %e, "import failed");
                Err(e)
            }
        }
    }

    /// Re-read the whole store. On failure the current snapshot stays.
    pub fn reload(&self) -> Result<Arc<Snapshot>> {
        let mut writer = self.lock_writer();
        let loaded = writer
            .store
            .scan_all()
            .inspect_err(|e| tracing::warn!(error = %e, "reload failed, keeping last snapshot"))?;

        let records: BTreeMap<_, _> = loaded.into_iter().map(|t| (t.id, t)).collect();
        let current = self
            .publish(&records)
            .inspect_err(|e| tracing::warn!(error = %e, "reload failed, keeping last snapshot"))?;
        // The scan already contains anything still queued.
        while writer.changes.try_recv().is_ok() {}
        writer.records = records;
        Ok(current)
    }

    // ── Views ─────────────────────────────────────────────────

    /// The current snapshot of every view.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let current = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&current)
    }

    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.snapshot().all_transactions().to_vec()
    }

    pub fn total_income(&self) -> Decimal {
        self.snapshot().total_income()
    }

    pub fn total_expenses(&self) -> Decimal {
        self.snapshot().total_expenses()
    }

    pub fn total_balance(&self) -> Decimal {
        self.snapshot().total_balance()
    }

    /// Watch a set of views.
    ///
    /// `callback` runs once right away with the current snapshot, then after
    /// every rebuild in which at least one of `views` changed value. It runs
    /// on the thread that made the change. It may call [`Engine::unsubscribe`]
    /// (including on itself) and read snapshots, but must not call the
    /// engine's commands or `subscribe`.
    pub fn subscribe<F>(&self, views: &[View], callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let views = views.to_vec();
        // Hold the writer so no rebuild lands between the first call and
        // the registration.
        let _writer = self.lock_writer();
        callback(&self.snapshot());
        let id = self.observers.subscribe(Box::new(move |update: &ViewUpdate| {
            if views.iter().any(|view| update.changed(*view)) {
                callback(&update.current);
            }
        }));
        tracing::debug!(subscription = %id, "view subscription added");
        id
    }

    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.subscribe(View::all(), callback)
    }

    /// Tear a subscription down. The store is not touched.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.observers.unsubscribe(id);
        tracing::debug!(subscription = %id, removed, "view subscription removed");
        removed
    }

    /// Read-only access to the underlying store.
    pub fn with_store<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock_writer().store)
    }

    /// Stop tracking the store and hand it back.
    pub fn into_store(self) -> S {
        let mut writer = self
            .writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let subscription = writer.store_subscription;
        writer.store.unsubscribe(subscription);
        writer.store
    }

    // ── Propagation ───────────────────────────────────────────

    fn lock_writer(&self) -> MutexGuard<'_, Writer<S>> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply queued store changes to the mirrored record set and publish a
    /// rebuild if anything changed.
    fn sync(&self, writer: &mut Writer<S>) {
        let mut applied = 0usize;
        while let Ok(change) = writer.changes.try_recv() {
            match change {
                Change::Inserted(txn) => {
                    writer.records.insert(txn.id, txn);
                }
                Change::Deleted(id) => {
                    writer.records.remove(&id);
                }
            }
            applied += 1;
        }
        if applied > 0 {
            if let Err(e) = self.publish(&writer.records) {
                tracing::warn!(error = %e, "rebuild failed, keeping last snapshot");
            }
        }
    }

    fn publish(&self, records: &BTreeMap<TransactionId, Transaction>) -> Result<Arc<Snapshot>> {
        let previous = self.snapshot();
        let current = Arc::new(Snapshot::build(previous.generation() + 1, records.values())?);
        {
            let mut slot = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *slot = Arc::clone(&current);
        }
        tracing::debug!(
            generation = current.generation(),
            transactions = current.len(),
            income = %current.total_income(),
            expenses = %current.total_expenses(),
            "snapshot published"
        );
        self.observers.notify(&ViewUpdate {
            previous,
            current: Arc::clone(&current),
        });
        Ok(current)
    }
}

impl<S: RecordStore> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("Engine")
            .field("generation", &snapshot.generation())
            .field("transactions", &snapshot.len())
            .field("observers", &self.observers)
            .finish()
    }
}
