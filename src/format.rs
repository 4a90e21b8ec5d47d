//! Display helpers shared by the CLI.
use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Dollar amount as shown in listings and summaries: two decimals, commas
/// between thousands, `-$12.50` for negatives.
pub fn format_amount(val: Decimal) -> String {
    let fixed = format!("{:.2}", val.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if val < Decimal::ZERO { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

/// Amount with a sign for its flow: `+$10.00` for income, `-$10.00` for
/// expenses.
pub fn format_signed(amount: Decimal, is_income: bool) -> String {
    let sign = if is_income { '+' } else { '-' };
    format!("{sign}{}", format_amount(amount.abs()))
}

pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One decimal place, `n/a` when undefined.
pub fn format_percent(pct: Option<Decimal>) -> String {
    match pct {
        Some(p) => format!("{:.1}%", p.round_dp(1)),
        None => "n/a".to_string(),
    }
}

/// Horizontal bar for a 0–100 value, `width` cells wide at 100.
pub fn bar(percent: Decimal, width: usize) -> String {
    let clamped = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let cells = (clamped * Decimal::from(width) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0);
    "█".repeat(cells.min(width))
}

/// Fit a description or category into a `max`-character column. Cut text
/// ends in `…`, which counts toward `max`.
pub fn truncate(s: &str, max: usize) -> String {
    match s.chars().nth(max) {
        None => s.to_string(),
        Some(_) if max == 0 => String::new(),
        Some(_) => {
            let kept: String = s.chars().take(max - 1).collect();
            format!("{kept}…")
        }
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
