mod harness;
mod support;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use whalewatch::domain::{Trade, ValidationError};
use whalewatch::error::Error;
use whalewatch::infrastructure::bootstrap::Services;

use harness::temp_db::TempDb;
use support::fixtures::{trade_at, whale};

/// 150 trades at timestamps 1..=150 with notional `ts * 50` USD.
fn history() -> Vec<Trade> {
    (1..=150)
        .map(|ts| Trade {
            size: Decimal::from(ts * 100),
            ..trade_at(&whale(), &format!("0x{ts:03}"), ts)
        })
        .collect()
}

#[tokio::test]
async fn pages_walk_newest_first_with_unfiltered_total() {
    let db = TempDb::create();
    let storage = db.storage();
    storage.trades.upsert_batch(&history()).await.unwrap();
    let services = Services::new(&storage);

    let page = services.trades.list_recent(50, 100, None).await.unwrap();
    assert_eq!(page.total, 150);
    assert_eq!((page.limit, page.offset), (50, 100));
    let timestamps: Vec<i64> = page.trades.iter().map(|t| t.timestamp).collect();
    let expected: Vec<i64> = (1..=50).rev().collect();
    assert_eq!(timestamps, expected);

    let beyond = services.trades.list_recent(50, 150, None).await.unwrap();
    assert!(beyond.trades.is_empty());
    assert_eq!(beyond.total, 150);
}

#[tokio::test]
async fn min_notional_filters_rows_but_not_total() {
    let db = TempDb::create();
    let storage = db.storage();
    storage.trades.upsert_batch(&history()).await.unwrap();
    let services = Services::new(&storage);

    let page = services
        .trades
        .list_recent(1000, 0, Some(dec!(5000)))
        .await
        .unwrap();

    assert_eq!(page.trades.len(), 51);
    assert!(page.trades.iter().all(|t| t.notional() >= dec!(5000)));
    assert_eq!(page.trades.first().map(|t| t.timestamp), Some(150));
    assert_eq!(page.total, 150);
}

#[tokio::test]
async fn out_of_range_arguments_are_rejected() {
    let db = TempDb::create();
    let services = Services::new(&db.storage());

    for (limit, offset, min_notional) in [
        (0, 0, None),
        (1001, 0, None),
        (10, -1, None),
        (10, 0, Some(dec!(-1))),
    ] {
        let err = services
            .trades
            .list_recent(limit, offset, min_notional)
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Validation(_)),
            "limit={limit} offset={offset}: {err}"
        );
    }

    let err = services.trades.list_recent(0, 0, None).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::LimitOutOfRange { value: 0, .. })
    ));
}
