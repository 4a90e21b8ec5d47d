//! Moving transactions in and out of flat files.
//!
//! JSON backups use the persisted record shape
//! (`id, description, amount, isIncome, category, date`) and can be restored
//! into any store. CSV export is one-way and meant for spreadsheets.
mod csv_export;
mod json;

pub use csv_export::export_csv;
pub use json::{load_json, save_json};

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
