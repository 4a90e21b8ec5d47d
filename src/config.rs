//! Startup configuration resolved from the environment.
use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DB_ENV: &str = "EXPENSE_TRACKER_DB";
pub const LOG_ENV: &str = "EXPENSE_TRACKER_LOG";
const DB_FILE_NAME: &str = "expenses.db";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Read [`DB_ENV`] and [`LOG_ENV`], falling back to the platform data
    /// directory. The database's parent directory is created if missing.
    pub fn from_env() -> Result<Self> {
        let config = Self::resolve(
            std::env::var(DB_ENV).ok(),
            std::env::var(LOG_ENV).ok(),
        )?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    pub(crate) fn resolve(db: Option<String>, log: Option<String>) -> Result<Self> {
        let db_path = match db.filter(|p| !p.trim().is_empty()) {
            Some(p) => PathBuf::from(expand_home(p.trim())),
            None => default_db_path()?,
        };
        let log_level = log
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Ok(Self { db_path, log_level })
    }

    /// Filter directive for this crate's logs, e.g. `expense_tracker=info`.
    pub fn log_directive(&self) -> String {
        format!("{}={}", env!("CARGO_CRATE_NAME"), self.log_level)
    }

    fn ensure_data_dir(&self) -> Result<()> {
        if let Some(dir) = self.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("fm", "mrc", "ExpenseTracker")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().join(DB_FILE_NAME))
}

/// Expand a leading `~/` to `$HOME`.
pub fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_explicit_db_path() {
        let config = Config::resolve(Some("/tmp/x/budget.db".into()), None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x/budget.db"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_blank_db_path_falls_back() {
        // Only meaningful where a home directory exists.
        if let Ok(config) = Config::resolve(Some("  ".into()), None) {
            assert!(config.db_path.ends_with(DB_FILE_NAME));
        }
    }

    #[test]
    fn test_log_level_normalized() {
        let config = Config::resolve(Some("a.db".into()), Some(" DEBUG ".into())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_directive(), "expense_tracker=debug");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path.db"), "/abs/path.db");
        assert!(!expand_home("~/x.db").starts_with('~'));
    }

    #[test]
    fn test_ensure_data_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("expenses.db");
        let config = Config::resolve(Some(db.display().to_string()), None).unwrap();
        config.ensure_data_dir().unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
