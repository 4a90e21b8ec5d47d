use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::models::{from_epoch_seconds, parse_amount, NewTransaction, Transaction};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordOut<'a> {
    id: i64,
    description: &'a str,
    /// Written as text so no precision is lost to floats.
    amount: String,
    is_income: bool,
    category: &'a str,
    date: i64,
}

/// `id` is ignored; the store assigns fresh ids on restore.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordIn {
    description: Option<String>,
    amount: Option<Value>,
    is_income: Option<bool>,
    category: Option<String>,
    date: Option<i64>,
}

/// Write `transactions` as a JSON array, oldest id first.
pub fn save_json(path: &Path, transactions: &[Transaction]) -> Result<usize> {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by_key(|t| t.id);

    let records: Vec<RecordOut<'_>> = ordered
        .iter()
        .map(|t| RecordOut {
            id: t.id,
            description: &t.description,
            amount: t.amount.normalize().to_string(),
            is_income: t.is_income,
            category: &t.category,
            date: t.epoch_seconds(),
        })
        .collect();

    let data = serde_json::to_vec_pretty(&records)?;
    super::write_atomic(path, &data)?;
    info!(path = %path.display(), count = records.len(), "saved json backup");
    Ok(records.len())
}

/// Read a JSON backup. Every record must be complete and valid or the whole
/// file is rejected. A missing or empty file holds no records.
pub fn load_json(path: &Path) -> Result<Vec<NewTransaction>> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no backup file");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.into()),
    };
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<RecordIn> = serde_json::from_str(&data)?;
    let records = raw
        .into_iter()
        .enumerate()
        .map(|(index, record)| decode(index, record))
        .collect::<Result<Vec<_>>>()?;
    info!(path = %path.display(), count = records.len(), "loaded json backup");
    Ok(records)
}

fn decode(index: usize, record: RecordIn) -> Result<NewTransaction> {
    let missing =
        |field: &str| TrackerError::validation(format!("record {index}: missing field `{field}`"));

    let description = record.description.ok_or_else(|| missing("description"))?;
    let amount = record.amount.ok_or_else(|| missing("amount"))?;
    let is_income = record.is_income.ok_or_else(|| missing("isIncome"))?;
    let category = record.category.ok_or_else(|| missing("category"))?;
    let secs = record.date.ok_or_else(|| missing("date"))?;

    let amount = decode_amount(&amount).map_err(|err| at(index, Some("amount"), err))?;
    let date = from_epoch_seconds(secs).ok_or_else(|| {
        TrackerError::validation(format!("record {index}: date {secs} is out of range"))
    })?;

    NewTransaction::new(&description, amount, is_income, &category, date)
        .map_err(|err| at(index, None, err))
}

fn decode_amount(value: &Value) -> Result<Decimal> {
    match value {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(s),
        other => Err(TrackerError::validation(format!(
            "expected a number or string, got {other}"
        ))),
    }
}

fn at(index: usize, field: Option<&str>, err: TrackerError) -> TrackerError {
    match (err, field) {
        (TrackerError::Validation(msg), Some(field)) => {
            TrackerError::validation(format!("record {index}: {field}: {msg}"))
        }
        (TrackerError::Validation(msg), None) => {
            TrackerError::validation(format!("record {index}: {msg}"))
        }
        (other, _) => other,
    }
}
