use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use super::schema;
use super::{Callback, Change, RecordStore, Registry, SubscriptionId};
use crate::error::{Result, TrackerError};
use crate::models::from_epoch_seconds;
use crate::models::{NewTransaction, Transaction, TransactionId};

/// Durable store backed by a single SQLite file.
pub struct SqliteStore {
    conn: Connection,
    subscribers: Registry<Change>,
}

type RawRow = (i64, String, String, bool, String, i64);

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            TrackerError::StorageUnavailable(format!(
                "failed to open database {}: {e}",
                path.display()
            ))
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let mut store = Self {
            conn,
            subscribers: Registry::new(),
        };
        apply_migrations(&mut store.conn, schema::CURRENT_VERSION, schema::MIGRATIONS)?;
        tracing::info!(path = %path.display(), "opened transaction database");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self {
            conn,
            subscribers: Registry::new(),
        };
        apply_migrations(&mut store.conn, schema::CURRENT_VERSION, schema::MIGRATIONS)?;
        Ok(store)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }

    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let result = self.conn.query_row(
            "SELECT id, description, amount, is_income, category, date FROM transactions WHERE id = ?1",
            params![id],
            read_row,
        );
        match result {
            Ok(raw) => decode(raw).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Bring the schema up to `target` in one transaction. A fresh database gets
/// `SCHEMA_V1` and then every migration, same as an old one.
fn apply_migrations(conn: &mut Connection, target: i32, migrations: &[(i32, &str)]) -> Result<()> {
    let tx = conn.transaction()?;
    let has_version_table: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !has_version_table {
        tx.execute_batch(schema::SCHEMA_V1)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    }

    let current: i32 = tx.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get(0)
    })?;
    if current > target {
        return Err(TrackerError::StorageUnavailable(format!(
            "database schema version {current} is newer than supported version {target}"
        )));
    }

    for &(from_version, sql) in migrations {
        if current <= from_version && from_version < target {
            tracing::info!(from_version, "applying schema migration");
            tx.execute_batch(sql)?;
        }
    }
    if current < target {
        tx.execute("UPDATE schema_version SET version = ?1", params![target])?;
    }
    tx.commit()?;
    Ok(())
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode((id, description, amount, is_income, category, date): RawRow) -> Result<Transaction> {
    let amount = Decimal::from_str(&amount).map_err(|_| {
        TrackerError::Validation(format!("record {id}: stored amount '{amount}' is not a number"))
    })?;
    let date = from_epoch_seconds(date).ok_or_else(|| {
        TrackerError::Validation(format!("record {id}: stored date {date} is out of range"))
    })?;
    Transaction::from_record(id, &description, amount, is_income, &category, date)
        .map_err(|e| TrackerError::Validation(format!("record {id}: {e}")))
}

fn insert_row(conn: &Connection, txn: &NewTransaction) -> rusqlite::Result<TransactionId> {
    conn.execute(
        "INSERT INTO transactions (description, amount, is_income, category, date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            txn.description(),
            txn.amount().to_string(),
            txn.is_income(),
            txn.category(),
            txn.date().and_utc().timestamp(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl RecordStore for SqliteStore {
    fn scan_all(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, description, amount, is_income, category, date FROM transactions ORDER BY id")?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(decode).collect()
    }

    fn insert(&mut self, txn: &NewTransaction) -> Result<TransactionId> {
        let id = insert_row(&self.conn, txn)?;
        self.subscribers
            .notify(&Change::Inserted(txn.clone().with_id(id)));
        Ok(id)
    }

    fn delete_by_id(&mut self, id: TransactionId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        if removed > 0 {
            self.subscribers.notify(&Change::Deleted(id));
        }
        Ok(removed > 0)
    }

    fn on_change(&mut self, callback: Callback<Change>) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn insert_batch(&mut self, txns: &[NewTransaction]) -> Result<Vec<TransactionId>> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(txns.len());
        for txn in txns {
            ids.push(insert_row(&tx, txn)?);
        }
        tx.commit()?;

        // Only announce once the whole batch is durable.
        for (txn, id) in txns.iter().zip(&ids) {
            self.subscribers
                .notify(&Change::Inserted(txn.clone().with_id(*id)));
        }
        Ok(ids)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.conn.path())
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
