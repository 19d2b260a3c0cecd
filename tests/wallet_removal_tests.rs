mod harness;
mod support;

use std::sync::Arc;
use std::time::Duration;

use whalewatch::application::{IngestionConfig, IngestionScheduler};
use whalewatch::domain::Removal;
use whalewatch::infrastructure::bootstrap::Services;

use harness::scripted_feed::ScriptedFeed;
use harness::temp_db::TempDb;
use support::fixtures::{trade_at, user, whale, WHALE};

#[tokio::test]
async fn removing_the_last_tracker_deletes_cursor_and_trades() {
    let db = TempDb::create();
    let storage = db.storage();
    let services = Services::new(&storage);
    let (alice, bob) = (user("alice"), user("bob"));
    services.wallets.add(&alice, WHALE).await.unwrap();
    services.wallets.add(&bob, WHALE).await.unwrap();

    let feed = Arc::new(ScriptedFeed::new(10));
    feed.push(&whale(), trade_at(&whale(), "0x01", 100));
    feed.push(&whale(), trade_at(&whale(), "0x02", 200));
    let ingestion = Arc::new(IngestionScheduler::new(
        IngestionConfig::default(),
        storage.clone(),
        feed,
    ));
    ingestion.run_cycle().await.unwrap();
    assert_eq!(storage.trades.count_all().await.unwrap(), 2);

    assert!(services.wallets.remove(&alice, WHALE, Removal::Soft).await.unwrap());
    assert!(storage.cursors.get(&whale()).await.unwrap().is_some());
    assert_eq!(storage.trades.count_all().await.unwrap(), 2);

    assert!(services.wallets.remove(&bob, WHALE, Removal::Hard).await.unwrap());
    assert!(storage.cursors.get(&whale()).await.unwrap().is_none());
    assert_eq!(storage.trades.count_all().await.unwrap(), 0);
    assert!(services.wallets.list(&bob).await.unwrap().is_empty());

    // Removing again is a harmless no-op.
    assert!(!services.wallets.remove(&bob, WHALE, Removal::Hard).await.unwrap());
}

#[tokio::test]
async fn removal_during_in_flight_poll_leaves_nothing_behind() {
    let db = TempDb::create();
    let storage = db.storage();
    let services = Services::new(&storage);
    let alice = user("alice");
    services.wallets.add(&alice, WHALE).await.unwrap();

    let (feed, gate) = ScriptedFeed::gated(10);
    let feed = Arc::new(feed);
    feed.push(&whale(), trade_at(&whale(), "0x01", 100));
    let ingestion = Arc::new(IngestionScheduler::new(
        IngestionConfig::default(),
        storage.clone(),
        Arc::clone(&feed) as Arc<dyn whalewatch::port::TradeFeed>,
    ));

    let cycle = tokio::spawn({
        let ingestion = Arc::clone(&ingestion);
        async move { ingestion.run_cycle().await }
    });
    while !ingestion.is_in_flight(&whale()) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // The wallet disappears while its poll is blocked in the feed.
    services
        .wallets
        .remove(&alice, WHALE, Removal::Hard)
        .await
        .unwrap();
    assert_eq!(ingestion.sweep_orphans().await.unwrap(), 0);

    gate.notify_one();
    let summary = cycle.await.unwrap().unwrap();
    assert_eq!(summary.polled, 1);
    assert_eq!(feed.fetches(), 1);

    assert!(!ingestion.is_in_flight(&whale()));
    assert!(storage.cursors.get(&whale()).await.unwrap().is_none());
    assert_eq!(storage.trades.count_all().await.unwrap(), 0);
}

#[tokio::test]
async fn orphan_sweep_cleans_data_left_by_untracked_wallets() {
    let db = TempDb::create();
    let storage = db.storage();
    storage
        .trades
        .upsert_batch(&[trade_at(&whale(), "0x01", 100)])
        .await
        .unwrap();

    let ingestion = Arc::new(IngestionScheduler::new(
        IngestionConfig::default(),
        storage.clone(),
        Arc::new(ScriptedFeed::new(10)),
    ));

    assert_eq!(ingestion.sweep_orphans().await.unwrap(), 1);
    assert_eq!(storage.trades.count_all().await.unwrap(), 0);
    assert_eq!(ingestion.sweep_orphans().await.unwrap(), 0);
}
