#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn coffee() -> NewTransaction {
    let date = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    NewTransaction::new("Coffee", dec!(3.20), false, "Food", date).unwrap()
}

fn backends() -> Vec<(&'static str, Box<dyn RecordStore>)> {
    vec![
        ("memory", Box::new(MemoryStore::new())),
        ("sqlite", Box::new(SqliteStore::open_in_memory().unwrap())),
    ]
}

fn record_changes(store: &mut dyn RecordStore) -> (SubscriptionId, Arc<Mutex<Vec<Change>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = store.on_change(Box::new(move |change: &Change| sink.lock().unwrap().push(change.clone())));
    (id, seen)
}

// ── RecordStore contract ──────────────────────────────────────

#[test]
fn test_insert_scan_delete_contract() {
    for (name, mut store) in backends() {
        let id = store.insert(&coffee()).unwrap();
        let all = store.scan_all().unwrap();
        assert_eq!(all.len(), 1, "{name}");
        assert_eq!(all[0].id, id, "{name}");
        assert_eq!(all[0].amount, dec!(3.20), "{name}");

        assert!(store.delete_by_id(id).unwrap(), "{name}");
        assert!(!store.delete_by_id(id).unwrap(), "{name}: second delete is a no-op");
        assert!(store.scan_all().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn test_change_notifications() {
    for (name, mut store) in backends() {
        let (_, seen) = record_changes(store.as_mut());

        let id = store.insert(&coffee()).unwrap();
        store.delete_by_id(id).unwrap();
        store.delete_by_id(id).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2, "{name}: missing delete must not notify");
        assert!(matches!(&seen[0], Change::Inserted(t) if t.id == id), "{name}");
        assert_eq!(seen[1], Change::Deleted(id), "{name}");
    }
}

#[test]
fn test_unsubscribe_stops_notifications() {
    for (name, mut store) in backends() {
        let (sub, seen) = record_changes(store.as_mut());
        assert!(store.unsubscribe(sub), "{name}");
        assert!(!store.unsubscribe(sub), "{name}");

        store.insert(&coffee()).unwrap();
        assert!(seen.lock().unwrap().is_empty(), "{name}");
        assert_eq!(store.scan_all().unwrap().len(), 1, "{name}");
    }
}

#[test]
fn test_default_insert_batch() {
    let mut store = MemoryStore::new();
    let ids = store.insert_batch(&[coffee(), coffee()]).unwrap();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(store.len(), 2);
    assert!(store.get(2).is_some());
}

// ── Registry ──────────────────────────────────────────────────

#[test]
fn test_registry_notifies_in_subscription_order() {
    let registry: Registry<u32> = Registry::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second"] {
        let order = Arc::clone(&order);
        registry.subscribe(Box::new(move |v: &u32| order.lock().unwrap().push((tag, *v))));
    }
    registry.notify(&7);
    assert_eq!(*order.lock().unwrap(), vec![("first", 7), ("second", 7)]);
}

#[test]
fn test_registry_ids_are_unique() {
    let registry: Registry<()> = Registry::new();
    let a = registry.subscribe(Box::new(|_: &()| {}));
    let b = registry.subscribe(Box::new(|_: &()| {}));
    assert_ne!(a, b);
    assert_eq!(registry.len(), 2);
    registry.unsubscribe(a);
    let c = registry.subscribe(Box::new(|_: &()| {}));
    assert_ne!(a, c);
}

#[test]
fn test_registry_empty_notify() {
    let registry: Registry<u32> = Registry::default();
    assert!(registry.is_empty());
    registry.notify(&1);
}

#[test]
fn test_registry_counts_calls() {
    let registry: Registry<()> = Registry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    registry.subscribe(Box::new(move |_: &()| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    registry.notify(&());
    registry.notify(&());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_registry_callback_can_unsubscribe_itself() {
    let registry: Arc<Registry<u32>> = Arc::new(Registry::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

    let weak = Arc::downgrade(&registry);
    let (s, own) = (Arc::clone(&seen), Arc::clone(&slot));
    let id = registry.subscribe(Box::new(move |v: &u32| {
        s.lock().unwrap().push(*v);
        if let (Some(registry), Some(id)) = (weak.upgrade(), *own.lock().unwrap()) {
            assert!(registry.unsubscribe(id));
        }
    }));
    *slot.lock().unwrap() = Some(id);

    registry.notify(&1);
    registry.notify(&2);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert!(registry.is_empty());
}

#[test]
fn test_registry_subscribe_during_notify_applies_next_time() {
    let registry: Arc<Registry<u32>> = Arc::new(Registry::new());
    let late_calls = Arc::new(AtomicUsize::new(0));

    let weak = Arc::downgrade(&registry);
    let calls = Arc::clone(&late_calls);
    registry.subscribe(Box::new(move |v: &u32| {
        if *v == 1 {
            if let Some(registry) = weak.upgrade() {
                let calls = Arc::clone(&calls);
                registry.subscribe(Box::new(move |_: &u32| {
                    calls.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }
    }));

    registry.notify(&1);
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    registry.notify(&2);
    assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 2);
}
