//! Data API trade records (`GET /trades?user=`).

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{Address, Side, Trade, TxHash};

/// One trade as returned by the Data API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataApiTrade {
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub size: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub event_slug: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl DataApiTrade {
    /// Convert to a domain trade attributed to `wallet`.
    ///
    /// Records without a hash, with a non-positive size or timestamp, a price
    /// outside `(0, 1]` or an unknown side are dropped.
    #[must_use]
    pub fn into_trade(self, wallet: &Address) -> Option<Trade> {
        let hash = self.transaction_hash.filter(|h| !h.trim().is_empty())?;
        let side = match self.side.parse::<Side>() {
            Ok(side) => side,
            Err(_) => {
                debug!(tx_hash = %hash, side = %self.side, "Skipping trade with unknown side");
                return None;
            }
        };
        if self.size <= Decimal::ZERO
            || self.price <= Decimal::ZERO
            || self.price > Decimal::ONE
            || self.timestamp <= 0
        {
            debug!(tx_hash = %hash, "Skipping malformed trade");
            return None;
        }

        Some(Trade {
            tx_hash: TxHash::new(hash),
            wallet: wallet.clone(),
            side,
            size: self.size,
            price: self.price,
            outcome: self.outcome.unwrap_or_default(),
            market_title: self.title.unwrap_or_default(),
            market_slug: self.event_slug.or(self.slug).unwrap_or_default(),
            condition_id: self.condition_id,
            timestamp: self.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"{
        "proxyWallet": "0x56687bf447db6ffa42ffe2204a05edaa20f55839",
        "side": "BUY",
        "asset": "1234",
        "conditionId": "0xabc",
        "size": 2500,
        "price": 0.42,
        "timestamp": 1724000000,
        "title": "Will BTC close above 100k?",
        "slug": "btc-100k-dec",
        "eventSlug": "btc-100k",
        "outcome": "Yes",
        "transactionHash": "0xDEADBEEF"
    }"#;

    fn wallet() -> Address {
        Address::parse("0x56687bf447db6ffa42ffe2204a05edaa20f55839").unwrap()
    }

    #[test]
    fn parses_data_api_record() {
        let raw: DataApiTrade = serde_json::from_str(SAMPLE).unwrap();
        let trade = raw.into_trade(&wallet()).unwrap();

        assert_eq!(trade.tx_hash.as_str(), "0xdeadbeef");
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.size, dec!(2500));
        assert_eq!(trade.price, dec!(0.42));
        assert_eq!(trade.market_slug, "btc-100k");
        assert_eq!(trade.condition_id.as_deref(), Some("0xabc"));
        assert_eq!(trade.notional(), dec!(1050));
    }

    #[test]
    fn drops_records_without_hash_or_with_bad_values() {
        let mut raw: DataApiTrade = serde_json::from_str(SAMPLE).unwrap();
        raw.transaction_hash = None;
        assert!(raw.into_trade(&wallet()).is_none());

        let mut raw: DataApiTrade = serde_json::from_str(SAMPLE).unwrap();
        raw.price = dec!(1.5);
        assert!(raw.into_trade(&wallet()).is_none());

        let mut raw: DataApiTrade = serde_json::from_str(SAMPLE).unwrap();
        raw.side = "MERGE".into();
        assert!(raw.into_trade(&wallet()).is_none());
    }
}
