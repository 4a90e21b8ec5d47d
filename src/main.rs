mod cli;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use expense_tracker::config::Config;
use expense_tracker::store::SqliteStore;
use expense_tracker::Engine;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::from_env()?;
    init_tracing(&config);

    if args.len() < 2 {
        cli::print_usage();
        return Ok(());
    }

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;
    let engine = Engine::open(store)?;
    cli::as_cli(&args, &engine)
}

/// `RUST_LOG` wins when set; otherwise the configured level applies to this
/// crate only. Logs go to stderr.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directive()));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
