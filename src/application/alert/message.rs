//! Whale alert message formatting (Telegram HTML).

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{MarketMetadata, Side, Trade};

const SITE: &str = "https://polymarket.com";

/// Categories shown in an alert at most.
const MAX_CATEGORIES: usize = 3;

/// Render the alert text for a trade, with market metadata when known.
#[must_use]
pub fn render_alert(trade: &Trade, market: Option<&MarketMetadata>) -> String {
    let side_emoji = match trade.side {
        Side::Buy => "🟢",
        Side::Sell => "🔴",
    };

    let title = market
        .map(|m| m.title.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(&trade.market_title);

    let market_link = market_link(trade, market);
    let trader_link = format!("{SITE}/profile/{}", trade.wallet);

    let categories = market
        .map(|m| m.categories.as_slice())
        .filter(|c| !c.is_empty())
        .map(|c| {
            let shown: Vec<&str> = c.iter().take(MAX_CATEGORIES).map(String::as_str).collect();
            format!("\n🏷️ Tags: {}", escape_html(&shown.join(", ")))
        })
        .unwrap_or_default();

    let outcome = if trade.outcome.is_empty() {
        String::new()
    } else {
        format!("\n🎯 Outcome: {}", escape_html(&trade.outcome))
    };

    format!(
        "🐋 <b>Whale Trade Alert!</b>\n\
        \n\
        📊 <b>Market:</b> {}{}{}\n\
        \n\
        💰 <b>Trade Details:</b>\n\
        {} <b>{}</b> ${} @ {}\n\
        📦 Size: {} shares\n\
        \n\
        👤 <b>Trader:</b> <a href=\"{}\">{}</a>\n\
        \n\
        🔗 <a href=\"{}\">View Market on Polymarket</a>",
        escape_html(title),
        outcome,
        categories,
        side_emoji,
        trade.side,
        format_usd(trade.notional()),
        format_percent(trade.price),
        format_grouped(trade.size.round_dp(2)),
        trader_link,
        trade.wallet.short(),
        escape_html(&market_link),
    )
}

/// Event page when a slug is known, else the condition page.
fn market_link(trade: &Trade, market: Option<&MarketMetadata>) -> String {
    let slug = market
        .and_then(|m| m.slug.as_deref())
        .filter(|s| !s.is_empty())
        .or_else(|| Some(trade.market_slug.as_str()).filter(|s| !s.is_empty()));

    match (slug, trade.condition_id.as_deref()) {
        (Some(slug), _) => format!("{SITE}/event/{slug}"),
        (None, Some(condition)) => format!("{SITE}/condition/{condition}"),
        (None, None) => SITE.to_string(),
    }
}

/// Two decimal places with thousands separators, e.g. `12,500.00`.
fn format_usd(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format_grouped(rounded);
    match text.split_once('.') {
        Some((whole, frac)) => format!("{whole}.{frac:0<2}"),
        None => format!("{text}.00"),
    }
}

fn format_grouped(value: Decimal) -> String {
    let text = value.normalize().to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (whole, frac) = match unsigned.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Price in [0, 1] as a percentage with one decimal, e.g. `50.0%`.
fn format_percent(price: Decimal) -> String {
    let pct = (price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{pct:.1}%")
}

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}
