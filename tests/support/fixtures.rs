use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use whalewatch::domain::{Address, AlertConfigPatch, Side, Trade, TxHash, UserId};

pub const WHALE: &str = "0x56687bf447db6ffa42ffe2204a05edaa20f55839";
pub const OTHER_WHALE: &str = "0x1111111111111111111111111111111111111111";

pub fn whale() -> Address {
    Address::parse(WHALE).expect("valid address")
}

pub fn other_whale() -> Address {
    Address::parse(OTHER_WHALE).expect("valid address")
}

pub fn user(id: &str) -> UserId {
    UserId::parse(id).expect("valid user id")
}

/// A trade by `wallet` at `timestamp`.
pub fn trade_at(wallet: &Address, hash: &str, timestamp: i64) -> Trade {
    Trade {
        tx_hash: TxHash::new(hash),
        wallet: wallet.clone(),
        side: Side::Buy,
        size: dec!(100),
        price: dec!(0.5),
        outcome: "Yes".into(),
        market_title: "Will it rain tomorrow?".into(),
        market_slug: "will-it-rain-tomorrow".into(),
        condition_id: None,
        timestamp,
    }
}

/// A recent trade by the whale with the given side, size and price.
pub fn whale_trade(hash: &str, side: Side, size: Decimal, price: Decimal) -> Trade {
    Trade {
        side,
        size,
        price,
        ..trade_at(&whale(), hash, Utc::now().timestamp())
    }
}

/// min notional 10,000 USD, price within [0.05, 0.95], BUY only.
pub fn buy_whales_filter() -> AlertConfigPatch {
    AlertConfigPatch {
        min_notional_usd: Some(dec!(10000)),
        min_price: Some(dec!(0.05)),
        max_price: Some(dec!(0.95)),
        sides: Some(vec!["BUY".into()]),
        enabled: Some(true),
        ..Default::default()
    }
}
