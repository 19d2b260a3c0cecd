//! Operator-facing text for the CLI commands.

use std::fmt::Display;

use crate::domain::{DispatchRecord, Trade};

const RULE_WIDTH: usize = 72;

/// Print a section header and separator.
pub fn section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "─".repeat(RULE_WIDTH));
}

pub fn key_value(label: &str, value: impl Display) {
    println!("{label:<14} {value}");
}

pub fn ok(message: &str) {
    println!("✓ {message}");
}

pub fn warn(message: &str) {
    println!("⚠ {message}");
}

/// Print an error status line to stderr.
pub fn error(message: &str) {
    eprintln!("✗ {message}");
}

/// One trade per line: time, side, notional, price, trader, market.
pub fn trade_row(trade: &Trade) {
    let when = trade
        .traded_at()
        .map_or_else(|| trade.timestamp.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    println!(
        "{when:<16}  {:<4} {:>12.2}  {:>5.3}  {}  {}",
        trade.side,
        trade.notional(),
        trade.price,
        trade.wallet.short(),
        trade.market_title,
    );
}

pub fn failed_row(record: &DispatchRecord) {
    println!(
        "{}  {}  {}  attempts={}  {}",
        record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
        record.owner,
        record.tx_hash,
        record.attempts,
        record.last_error.as_deref().unwrap_or("-"),
    );
}

/// Empty-result note so a blank section is not mistaken for a failure.
pub fn none(what: &str) {
    println!("(no {what})");
}
