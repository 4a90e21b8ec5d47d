//! Local expense tracker with a reactive aggregation core.
//!
//! A [`RecordStore`](store::RecordStore) holds the transactions. The
//! [`Engine`] keeps an immutable [`Snapshot`] of every derived view (the
//! sorted list, totals, balance and per-category sums) and swaps in a new one
//! after each mutation, notifying subscribers of the views that changed.
//!
//! ```no_run
//! use chrono::Local;
//! use expense_tracker::{store::MemoryStore, Engine, View};
//!
//! # fn main() -> expense_tracker::Result<()> {
//! let engine = Engine::open(MemoryStore::new())?;
//! engine.subscribe(&[View::TotalBalance], |snap| {
//!     println!("balance: {}", snap.total_balance());
//! });
//! engine.add_transaction("Salary", "1000", true, "Salary", Local::now().naive_local())?;
//! # Ok(())
//! # }
//! ```
pub mod analytics;
pub mod backup;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod models;
pub mod store;

pub use engine::{Engine, Snapshot, View, ViewUpdate};
pub use error::{Result, TrackerError};
pub use models::{CategorySum, Flow, NewTransaction, Transaction, TransactionId};
