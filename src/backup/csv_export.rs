use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::format::format_date;
use crate::models::Transaction;

const HEADER: [&str; 5] = ["Date", "Description", "Category", "Type", "Amount"];

/// Write `transactions` to `path` as CSV in the order given. Returns the
/// number of rows written, not counting the header.
pub fn export_csv(path: &Path, transactions: &[Transaction]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADER)?;
    for txn in transactions {
        let amount = format!("{:.2}", txn.amount);
        wtr.write_record([
            format_date(&txn.date).as_str(),
            txn.description.as_str(),
            txn.category.as_str(),
            txn.flow().as_str(),
            amount.as_str(),
        ])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|err| std::io::Error::new(err.error().kind(), err.to_string()))?;
    super::write_atomic(path, &data)?;

    info!(path = %path.display(), count = transactions.len(), "exported csv");
    Ok(transactions.len())
}
