use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::path::Path;

use expense_tracker::analytics::{category_breakdown, monthly_totals, trend};
use expense_tracker::backup;
use expense_tracker::config::expand_home;
use expense_tracker::format::{
    bar, format_amount, format_date, format_percent, format_signed, truncate,
};
use expense_tracker::store::RecordStore;
use expense_tracker::{Engine, Flow};

const DEFAULT_TREND_MONTHS: usize = 6;
const BAR_WIDTH: usize = 20;

pub(crate) fn as_cli<S: RecordStore>(args: &[String], engine: &Engine<S>) -> Result<()> {
    match args[1].as_str() {
        "add" | "a" => cli_add(&args[2..], engine),
        "delete" | "rm" => cli_delete(&args[2..], engine),
        "list" | "ls" => cli_list(engine),
        "summary" | "s" => cli_summary(engine),
        "categories" | "c" => cli_categories(engine),
        "trend" => cli_trend(&args[2..], engine),
        "export" => cli_export(&args[2..], engine),
        "backup" => cli_backup(&args[2..], engine),
        "restore" => cli_restore(&args[2..], engine),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("expense-tracker {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("expense-tracker: local income and expense tracker");
    println!();
    println!("Usage: expense-tracker <command>");
    println!();
    println!("Commands:");
    println!("  add <income|expense> <description> <amount> <category>");
    println!("    --date <YYYY-MM-DD[ HH:MM[:SS]]>   When it happened (default: now)");
    println!("  delete <id>                   Delete a transaction");
    println!("  list                          List transactions, newest first");
    println!("  summary                       Totals, balance and savings rate");
    println!("  categories                    Per-category totals with shares");
    println!("  trend [months]                Monthly income and expenses (default: {DEFAULT_TREND_MONTHS})");
    println!("  export <file.csv>             Export transactions to CSV");
    println!("  backup <file.json>            Write a JSON backup");
    println!("  restore <file.json>           Add every record from a JSON backup");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Environment:");
    println!("  {:<29} Database file", expense_tracker::config::DB_ENV);
    println!("  {:<29} Log level (default: info)", expense_tracker::config::LOG_ENV);
}

fn cli_add<S: RecordStore>(args: &[String], engine: &Engine<S>) -> Result<()> {
    let (date, rest) = take_flag(args, "--date");
    if rest.len() != 4 {
        anyhow::bail!(
            "Usage: expense-tracker add <income|expense> <description> <amount> <category> [--date <YYYY-MM-DD>]"
        );
    }

    let flow = Flow::parse(&rest[0])
        .ok_or_else(|| anyhow::anyhow!("Expected 'income' or 'expense', got '{}'", rest[0]))?;
    let date = match date {
        Some(d) => parse_date(&d)?,
        None => Local::now().naive_local(),
    };

    let id = engine.add_transaction(&rest[1], &rest[2], flow.is_income(), &rest[3], date)?;
    let snap = engine.snapshot();
    if let Some(txn) = snap.get(id) {
        println!(
            "Added #{id}: {} {} ({}) on {}",
            txn.description,
            format_signed(txn.amount, txn.is_income),
            txn.category,
            format_date(&txn.date)
        );
    }
    if !flow.is_suggested(&rest[3]) {
        println!("Note: '{}' is a new {} category", rest[3].trim(), flow.as_str().to_lowercase());
    }
    println!("Balance: {}", format_amount(snap.total_balance()));
    Ok(())
}

fn cli_delete<S: RecordStore>(args: &[String], engine: &Engine<S>) -> Result<()> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("Usage: expense-tracker delete <id>"))?;
    let id: i64 = raw
        .trim_start_matches('#')
        .parse()
        .with_context(|| format!("Invalid transaction id: {raw}"))?;

    if engine.delete_transaction(id)? {
        println!("Deleted #{id}");
        println!("Balance: {}", format_amount(engine.total_balance()));
    } else {
        println!("No transaction #{id}");
    }
    Ok(())
}

fn cli_list<S: RecordStore>(engine: &Engine<S>) -> Result<()> {
    let snap = engine.snapshot();
    if snap.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<6} {:<17} {:<28} {:<16} {:>14}",
        "ID", "Date", "Description", "Category", "Amount"
    );
    println!("{}", "─".repeat(85));
    for txn in snap.all_transactions() {
        println!(
            "{:<6} {:<17} {:<28} {:<16} {:>14}",
            txn.id,
            format_date(&txn.date),
            truncate(&txn.description, 28),
            truncate(&txn.category, 16),
            format_signed(txn.amount, txn.is_income),
        );
    }
    println!("{}", "─".repeat(85));
    println!("{:>85}", format!("Balance: {}", format_amount(snap.total_balance())));
    Ok(())
}

fn cli_summary<S: RecordStore>(engine: &Engine<S>) -> Result<()> {
    let snap = engine.snapshot();

    println!("Expense Tracker");
    println!("{}", "─".repeat(40));
    println!("  Income:       {}", format_amount(snap.total_income()));
    println!("  Expenses:     {}", format_amount(snap.total_expenses()));
    println!("  Balance:      {}", format_amount(snap.total_balance()));
    println!("  Savings rate: {}", format_percent(snap.savings_rate()));
    println!("  Total Txns:   {}", snap.len());

    for flow in Flow::all() {
        let sums = snap.by_category(*flow);
        if sums.is_empty() {
            continue;
        }
        println!();
        println!("{} by Category:", flow.as_str());
        for sum in sums {
            println!("  {:<24} {}", sum.category, format_amount(sum.total));
        }
    }
    Ok(())
}

fn cli_categories<S: RecordStore>(engine: &Engine<S>) -> Result<()> {
    let snap = engine.snapshot();
    if snap.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    for flow in Flow::all() {
        let breakdown = category_breakdown(&snap, *flow);
        if breakdown.is_empty() {
            continue;
        }
        println!("{} ({})", flow.as_str(), format_amount(snap.total(*flow)));
        for share in &breakdown {
            println!(
                "  {:<20} {:>14} {:>7}  {}",
                truncate(&share.category, 20),
                format_amount(share.total),
                format_percent(share.share),
                bar(share.relative_to_max, BAR_WIDTH),
            );
        }
        println!();
    }
    Ok(())
}

fn cli_trend<S: RecordStore>(args: &[String], engine: &Engine<S>) -> Result<()> {
    let months = match args.first() {
        Some(n) => n
            .parse::<usize>()
            .with_context(|| format!("Invalid month count: {n}"))?,
        None => DEFAULT_TREND_MONTHS,
    };

    let snap = engine.snapshot();
    let totals = monthly_totals(&snap, months);
    if totals.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<8} {:>14} {:>14} {:>14}",
        "Month", "Income", "Expenses", "Net"
    );
    println!("{}", "─".repeat(53));
    for month in &totals {
        println!(
            "{:<8} {:>14} {:>14} {:>14}",
            month.month,
            format_amount(month.income),
            format_amount(month.expenses),
            format_amount(month.net()),
        );
    }

    if let Some(last) = trend(&snap).last() {
        println!();
        println!(
            "Running balance: {} as of {}",
            format_amount(last.running_balance),
            format_date(&last.date)
        );
    }
    Ok(())
}

fn cli_export<S: RecordStore>(args: &[String], engine: &Engine<S>) -> Result<()> {
    let path = path_arg(args, "Usage: expense-tracker export <file.csv>")?;
    let count = backup::export_csv(Path::new(&path), &engine.all_transactions())?;
    if count == 0 {
        println!("No transactions to export (wrote header to {path})");
    } else {
        println!("Exported {count} transactions to {path}");
    }
    Ok(())
}

fn cli_backup<S: RecordStore>(args: &[String], engine: &Engine<S>) -> Result<()> {
    let path = path_arg(args, "Usage: expense-tracker backup <file.json>")?;
    let count = backup::save_json(Path::new(&path), &engine.all_transactions())?;
    println!("Backed up {count} transactions to {path}");
    Ok(())
}

fn cli_restore<S: RecordStore>(args: &[String], engine: &Engine<S>) -> Result<()> {
    let path = path_arg(args, "Usage: expense-tracker restore <file.json>")?;
    let records = backup::load_json(Path::new(&path))
        .with_context(|| format!("Failed to read backup {path}"))?;
    if records.is_empty() {
        println!("No records in {path}");
        return Ok(());
    }
    let ids = engine.import_records(&records)?;
    println!("Restored {} transactions", ids.len());
    println!("Balance: {}", format_amount(engine.total_balance()));
    Ok(())
}

fn path_arg(args: &[String], usage: &str) -> Result<String> {
    args.first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| expand_home(a))
        .ok_or_else(|| anyhow::anyhow!("{usage}"))
}

/// Remove `flag <value>` from `args`, returning the value and the rest.
fn take_flag(args: &[String], flag: &str) -> (Option<String>, Vec<String>) {
    let mut value = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            value = iter.next().cloned();
        } else {
            rest.push(arg.clone());
        }
    }
    (value, rest)
}

/// Accepts `YYYY-MM-DD`, optionally followed by `HH:MM` or `HH:MM:SS`
/// separated by a space or `T`. A bare date means midnight.
fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("Invalid date '{s}', expected YYYY-MM-DD[ HH:MM[:SS]]"))
}
