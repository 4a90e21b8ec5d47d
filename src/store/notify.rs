use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned by a subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Subscriber table shared by the record stores and the engine.
///
/// Callbacks run in subscription order, outside the table lock, so a
/// callback may subscribe or unsubscribe on the registry calling it. Changes
/// made during a notification take effect from the next one.
pub struct Registry<T> {
    next_id: AtomicU64,
    callbacks: Mutex<BTreeMap<SubscriptionId, Shared<T>>>,
}

type Shared<T> = Arc<dyn Fn(&T) + Send + Sync>;

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn subscribe(&self, callback: Callback<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, Arc::from(callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn notify(&self, value: &T) {
        let callbacks: Vec<Shared<T>> = self.lock().values().cloned().collect();
        for callback in callbacks {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panicking subscriber poisons the lock; the table itself is still
    // consistent, so keep using it.
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SubscriptionId, Shared<T>>> {
        self.callbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("subscribers", &self.len())
            .finish()
    }
}
