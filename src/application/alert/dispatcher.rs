//! Alert dispatcher.
//!
//! Consumes the trade store in insertion order using its own persisted
//! position, evaluates each trade against the cached filters of every user
//! tracking the trade's wallet, and delivers matching alerts.
//!
//! # Delivery states
//!
//! ```text
//! trade --> claim (owner, tx) as SENDING
//!              |
//!              +-- already recorded ------------------> duplicate (no send)
//!              +-- stale / filtered / unbound --------> SUPPRESSED
//!              +-- send ok ---------------------------> DISPATCHED
//!              +-- endpoint rejected -----------------> SUPPRESSED (binding deactivated)
//!              +-- send errors, attempts exhausted ---> FAILED
//!              +-- store error after the claim -------> FAILED
//! ```
//!
//! The claim is written before the channel is called. A claim still
//! `SENDING` at startup belongs to a crashed run and is resolved to `FAILED`
//! rather than resent, so a user never receives the same alert twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::config::DispatchConfig;
use super::filter_cache::FilterCache;
use super::message::render_alert;
use crate::domain::{
    AlertConfig, AlertOutcome, Claim, DispatchState, FilterVerdict, MarketMetadata,
    SuppressReason, Trade, UserId,
};
use crate::error::Result;
use crate::port::{MarketCatalog, NotificationChannel, Storage};

/// Totals for one dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub trades: usize,
    pub dispatched: usize,
    pub suppressed: usize,
    pub failed: usize,
    pub duplicates: usize,
}

impl DispatchSummary {
    fn record(&mut self, outcome: &AlertOutcome) {
        match outcome {
            AlertOutcome::Dispatched => self.dispatched += 1,
            AlertOutcome::Suppressed(_) => self.suppressed += 1,
            AlertOutcome::Failed(_) => self.failed += 1,
            AlertOutcome::Duplicate(_) => self.duplicates += 1,
        }
    }
}

/// Handle for controlling the dispatcher loop lifecycle.
pub struct DispatchHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl DispatchHandle {
    /// Signal the loop to stop and wait for the current cycle to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

/// Evaluates newly ingested trades and delivers whale alerts.
pub struct AlertDispatcher {
    storage: Storage,
    catalog: Arc<dyn MarketCatalog>,
    channel: Arc<dyn NotificationChannel>,
    config: DispatchConfig,
    filters: FilterCache,
    recovered: bool,
}

impl AlertDispatcher {
    pub fn new(
        config: DispatchConfig,
        storage: Storage,
        catalog: Arc<dyn MarketCatalog>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            filters: FilterCache::new(config.filter_refresh()),
            storage,
            catalog,
            channel,
            config,
            recovered: false,
        }
    }

    /// Resolve claims abandoned by a previous run and, on the very first
    /// start, position the dispatcher at the current head of the trade store
    /// so historical trades are not alerted.
    pub async fn recover(&mut self) -> Result<()> {
        let interrupted = self.storage.dispatch_log.resolve_interrupted().await?;
        if interrupted > 0 {
            warn!(interrupted, "Resolved interrupted deliveries as failed");
        }

        if self.storage.dispatch_log.position().await?.is_none() {
            let head = self.storage.trades.head_seq().await?;
            self.storage.dispatch_log.advance_position(head).await?;
            info!(head, "Dispatcher initialised at trade store head");
        }

        self.recovered = true;
        Ok(())
    }

    /// Process the next batch of trades.
    ///
    /// Filters are refreshed once at the start of the cycle, so a config
    /// change becomes visible at the next cycle, never mid-cycle. The
    /// position advances after each fully processed trade.
    ///
    /// # Errors
    /// Store failures stop the cycle; the unprocessed trade is retried on
    /// the next cycle and already-recorded pairs are not resent.
    pub async fn run_cycle(&mut self) -> Result<DispatchSummary> {
        if !self.recovered {
            self.recover().await?;
        }

        self.filters
            .refresh_if_needed(
                self.storage.reload.as_ref(),
                self.storage.configs.as_ref(),
            )
            .await?;

        let position = self.storage.dispatch_log.position().await?.unwrap_or(0);
        let batch = self
            .storage
            .trades
            .list_after(position, self.config.batch_size)
            .await?;

        let mut summary = DispatchSummary::default();
        for stored in batch {
            let outcomes = self.process_trade(&stored.trade).await?;
            for (_, outcome) in &outcomes {
                summary.record(outcome);
            }
            summary.trades += 1;
            self.storage.dispatch_log.advance_position(stored.seq).await?;
        }

        if summary.dispatched > 0 || summary.failed > 0 {
            info!(
                trades = summary.trades,
                dispatched = summary.dispatched,
                suppressed = summary.suppressed,
                failed = summary.failed,
                "Dispatch cycle complete"
            );
        } else if summary.trades > 0 {
            debug!(
                trades = summary.trades,
                suppressed = summary.suppressed,
                duplicates = summary.duplicates,
                "Dispatch cycle complete, nothing sent"
            );
        }
        Ok(summary)
    }

    /// Evaluate one trade for every interested user, in owner order.
    ///
    /// A user is interested when they actively track the trade's wallet and
    /// have an enabled config in the current filter cache. A store failure
    /// for one user is logged and does not affect the others.
    ///
    /// # Errors
    /// Fails only when the interested users cannot be determined.
    pub async fn process_trade(&self, trade: &Trade) -> Result<Vec<(UserId, AlertOutcome)>> {
        let mut owners = self.storage.wallets.owners_tracking(&trade.wallet).await?;
        owners.sort();
        let interested: Vec<(UserId, &AlertConfig)> = owners
            .into_iter()
            .filter_map(|owner| self.filters.get(&owner).map(|config| (owner, config)))
            .collect();

        if interested.is_empty() {
            return Ok(Vec::new());
        }

        let market = self.market_for(trade).await;
        let categories = market
            .as_ref()
            .map(|m| m.categories.clone())
            .unwrap_or_default();
        let message = render_alert(trade, market.as_ref());

        let mut outcomes = Vec::with_capacity(interested.len());
        for (owner, config) in interested {
            match self
                .evaluate_for(&owner, config, trade, &categories, &message)
                .await
            {
                Ok(outcome) => outcomes.push((owner, outcome)),
                Err(e) => {
                    error!(owner = %owner, tx_hash = %trade.tx_hash, error = %e, "Alert evaluation failed");
                    let detail = e.to_string();
                    self.abandon_claim(&owner, trade, &detail).await;
                    outcomes.push((owner, AlertOutcome::Failed(detail)));
                }
            }
        }
        Ok(outcomes)
    }

    /// Move a claim left `Sending` by a failed evaluation to `Failed`, so it
    /// shows up for operators instead of waiting for the next restart.
    async fn abandon_claim(&self, owner: &UserId, trade: &Trade, detail: &str) {
        let log = &self.storage.dispatch_log;
        let resolved = match log.record(owner, &trade.tx_hash).await {
            Ok(Some(record)) if record.state == DispatchState::Sending => log
                .complete(owner, &trade.tx_hash, DispatchState::Failed, record.attempts, Some(detail))
                .await
                .map(|()| true),
            Ok(_) => Ok(false),
            Err(e) => Err(e),
        };
        match resolved {
            Ok(true) => debug!(owner = %owner, tx_hash = %trade.tx_hash, "Abandoned claim marked failed"),
            Ok(false) => {}
            Err(e) => warn!(
                owner = %owner,
                tx_hash = %trade.tx_hash,
                error = %e,
                "Could not resolve abandoned claim, left for startup recovery"
            ),
        }
    }

    async fn market_for(&self, trade: &Trade) -> Option<MarketMetadata> {
        let condition_id = trade.condition_id.as_deref()?;
        match self.catalog.lookup(condition_id).await {
            Ok(market) => market,
            Err(e) => {
                warn!(condition_id, error = %e, "Market metadata lookup failed, treating as uncategorized");
                None
            }
        }
    }

    fn is_stale(&self, trade: &Trade) -> bool {
        if self.config.max_trade_age_secs == 0 {
            return false;
        }
        let max_age = i64::try_from(self.config.max_trade_age_secs).unwrap_or(i64::MAX);
        Utc::now().timestamp().saturating_sub(trade.timestamp) > max_age
    }

    async fn evaluate_for(
        &self,
        owner: &UserId,
        config: &AlertConfig,
        trade: &Trade,
        categories: &[String],
        message: &str,
    ) -> Result<AlertOutcome> {
        if let Claim::Existing(state) = self
            .storage
            .dispatch_log
            .claim(owner, &trade.tx_hash)
            .await?
        {
            debug!(owner = %owner, tx_hash = %trade.tx_hash, state = %state, "Already handled");
            return Ok(AlertOutcome::Duplicate(state));
        }

        let suppressed = if self.is_stale(trade) {
            Some(SuppressReason::StaleTrade)
        } else {
            match config.evaluate(trade, categories) {
                FilterVerdict::Match => None,
                FilterVerdict::Reject(rejection) => {
                    Some(SuppressReason::Filtered(rejection.to_string()))
                }
            }
        };
        if let Some(reason) = suppressed {
            return self.suppress(owner, trade, reason, 0).await;
        }

        let binding = match self.storage.bindings.binding(owner).await? {
            None => return self.suppress(owner, trade, SuppressReason::NoBinding, 0).await,
            Some(b) if !b.active => {
                return self
                    .suppress(owner, trade, SuppressReason::BindingInactive, 0)
                    .await
            }
            Some(b) => b,
        };

        self.deliver(owner, trade, &binding.endpoint_id, message).await
    }

    async fn suppress(
        &self,
        owner: &UserId,
        trade: &Trade,
        reason: SuppressReason,
        attempts: u32,
    ) -> Result<AlertOutcome> {
        debug!(owner = %owner, tx_hash = %trade.tx_hash, reason = %reason, "Alert suppressed");
        let detail = reason.to_string();
        self.storage
            .dispatch_log
            .complete(
                owner,
                &trade.tx_hash,
                DispatchState::Suppressed,
                attempts,
                Some(detail.as_str()),
            )
            .await?;
        Ok(AlertOutcome::Suppressed(reason))
    }

    /// Send with a per-attempt timeout and bounded linear backoff.
    async fn deliver(
        &self,
        owner: &UserId,
        trade: &Trade,
        endpoint: &str,
        message: &str,
    ) -> Result<AlertOutcome> {
        let max_attempts = self.config.send_max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match timeout(self.config.send_timeout(), self.channel.send(endpoint, message)).await {
                Ok(Ok(true)) => {
                    self.storage
                        .dispatch_log
                        .complete(owner, &trade.tx_hash, DispatchState::Dispatched, attempt, None)
                        .await?;
                    info!(
                        owner = %owner,
                        tx_hash = %trade.tx_hash,
                        wallet = %trade.wallet,
                        notional = %trade.notional(),
                        channel = self.channel.name(),
                        "Whale alert dispatched"
                    );
                    return Ok(AlertOutcome::Dispatched);
                }
                Ok(Ok(false)) => {
                    warn!(owner = %owner, channel = self.channel.name(), "Endpoint rejected delivery, deactivating binding");
                    self.storage.bindings.deactivate(owner).await?;
                    return self
                        .suppress(owner, trade, SuppressReason::EndpointRejected, attempt)
                        .await;
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = format!("send timed out after {}ms", self.config.send_timeout_ms),
            }

            if attempt < max_attempts {
                warn!(
                    owner = %owner,
                    tx_hash = %trade.tx_hash,
                    attempt,
                    max_attempts,
                    error = %last_error,
                    "Alert send failed, retrying"
                );
                if self.config.send_backoff_ms > 0 {
                    sleep(Duration::from_millis(
                        self.config.send_backoff_ms * u64::from(attempt),
                    ))
                    .await;
                }
            }
        }

        error!(
            owner = %owner,
            tx_hash = %trade.tx_hash,
            attempts = max_attempts,
            error = %last_error,
            "Alert delivery failed"
        );
        self.storage
            .dispatch_log
            .complete(
                owner,
                &trade.tx_hash,
                DispatchState::Failed,
                max_attempts,
                Some(last_error.as_str()),
            )
            .await?;
        Ok(AlertOutcome::Failed(last_error))
    }

    /// Start the background dispatch loop.
    pub fn start(mut self) -> DispatchHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let mut tick = tokio::time::interval(self.config.poll_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            channel = self.channel.name(),
            update_mode = ?self.channel.update_mode(),
            "Alert dispatcher started"
        );

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Alert dispatcher shutting down");
                        break;
                    }

                    _ = tick.tick() => {
                        if let Err(e) = self.run_cycle().await {
                            warn!(error = %e, "Dispatch cycle failed");
                        }
                    }
                }
            }
        });

        DispatchHandle { shutdown_tx, task }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::adapter::outbound::sqlite::store::test_store;
    use crate::domain::{Address, AlertConfigPatch, ChannelBinding, Side, TxHash};
    use crate::error::Error;
    use crate::port::{ChannelBindings, NullCatalog};

    const WHALE: &str = "0x56687bf447db6ffa42ffe2204a05edaa20f55839";

    /// Channel that records sends and answers from a script.
    #[derive(Default)]
    struct ScriptedChannel {
        sent: Mutex<Vec<(String, String)>>,
        /// Answers consumed per send; empty means deliver.
        script: Mutex<Vec<Result<bool>>>,
    }

    #[async_trait]
    impl NotificationChannel for ScriptedChannel {
        async fn send(&self, endpoint_id: &str, message: &str) -> Result<bool> {
            self.sent.lock().push((endpoint_id.to_string(), message.to_string()));
            let mut script = self.script.lock();
            if script.is_empty() {
                Ok(true)
            } else {
                script.remove(0)
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    /// Binding store whose reads fail, as under lock contention.
    struct LockedBindings;

    #[async_trait]
    impl ChannelBindings for LockedBindings {
        async fn bind(&self, _binding: &ChannelBinding) -> Result<()> {
            Ok(())
        }

        async fn deactivate(&self, _owner: &UserId) -> Result<bool> {
            Ok(false)
        }

        async fn binding(&self, _owner: &UserId) -> Result<Option<ChannelBinding>> {
            Err(Error::Database("database is locked".into()))
        }
    }

    fn alice() -> UserId {
        UserId::parse("alice").unwrap()
    }

    fn trade(hash: &str, side: Side, size: Decimal, price: Decimal) -> Trade {
        Trade {
            tx_hash: TxHash::new(hash),
            wallet: Address::parse(WHALE).unwrap(),
            side,
            size,
            price,
            outcome: "Yes".into(),
            market_title: "Market".into(),
            market_slug: "market".into(),
            condition_id: None,
            timestamp: Utc::now().timestamp(),
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        storage: Storage,
        channel: Arc<ScriptedChannel>,
        dispatcher: AlertDispatcher,
    }

    async fn fixture() -> Fixture {
        let (dir, store) = test_store();
        let storage = Storage::from_backend(Arc::new(store));
        let channel = Arc::new(ScriptedChannel::default());
        let config = DispatchConfig {
            send_backoff_ms: 0,
            ..Default::default()
        };

        storage
            .wallets
            .add(&alice(), &Address::parse(WHALE).unwrap())
            .await
            .unwrap();
        storage
            .configs
            .upsert(
                &alice(),
                AlertConfigPatch {
                    min_notional_usd: Some(dec!(10000)),
                    min_price: Some(dec!(0.05)),
                    max_price: Some(dec!(0.95)),
                    sides: Some(vec!["BUY".into()]),
                    enabled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        storage
            .bindings
            .bind(&ChannelBinding::new(alice(), "1001").unwrap())
            .await
            .unwrap();

        let mut dispatcher = AlertDispatcher::new(
            config,
            storage.clone(),
            Arc::new(NullCatalog),
            Arc::clone(&channel) as Arc<dyn NotificationChannel>,
        );
        dispatcher.recover().await.unwrap();
        dispatcher
            .filters
            .refresh_if_needed(storage.reload.as_ref(), storage.configs.as_ref())
            .await
            .unwrap();

        Fixture {
            _dir: dir,
            storage,
            channel,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn filter_example_suppresses_sell_and_dispatches_buy() {
        let f = fixture().await;

        let sell = f
            .dispatcher
            .process_trade(&trade("0x01", Side::Sell, dec!(1000), dec!(0.5)))
            .await
            .unwrap();
        assert!(matches!(
            sell[0].1,
            AlertOutcome::Suppressed(SuppressReason::Filtered(_))
        ));

        let buy = f
            .dispatcher
            .process_trade(&trade("0x02", Side::Buy, dec!(25000), dec!(0.5)))
            .await
            .unwrap();
        assert_eq!(buy, vec![(alice(), AlertOutcome::Dispatched)]);

        let sent = f.channel.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "1001");
        assert!(sent[0].1.contains("$12,500.00"));
    }

    #[tokio::test]
    async fn re_evaluation_never_resends() {
        let f = fixture().await;
        let whale_trade = trade("0x02", Side::Buy, dec!(25000), dec!(0.5));

        f.dispatcher.process_trade(&whale_trade).await.unwrap();
        let again = f.dispatcher.process_trade(&whale_trade).await.unwrap();

        assert_eq!(
            again,
            vec![(alice(), AlertOutcome::Duplicate(DispatchState::Dispatched))]
        );
        assert_eq!(f.channel.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn interrupted_claim_is_not_resent_after_restart() {
        let mut f = fixture().await;
        let whale_trade = trade("0x02", Side::Buy, dec!(25000), dec!(0.5));
        f.storage
            .dispatch_log
            .claim(&alice(), &whale_trade.tx_hash)
            .await
            .unwrap();

        f.dispatcher.recover().await.unwrap();
        let outcome = f.dispatcher.process_trade(&whale_trade).await.unwrap();

        assert_eq!(
            outcome,
            vec![(alice(), AlertOutcome::Duplicate(DispatchState::Failed))]
        );
        assert!(f.channel.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn failed_evaluation_releases_claim_as_failed() {
        let mut f = fixture().await;
        f.dispatcher.storage.bindings = Arc::new(LockedBindings);
        let whale_trade = trade("0x02", Side::Buy, dec!(25000), dec!(0.5));

        let outcome = f.dispatcher.process_trade(&whale_trade).await.unwrap();
        assert!(matches!(outcome[0].1, AlertOutcome::Failed(_)));

        let record = f
            .storage
            .dispatch_log
            .record(&alice(), &whale_trade.tx_hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.state, DispatchState::Failed);
        assert_eq!(record.last_error.as_deref(), Some("database error: database is locked"));
        assert_eq!(f.storage.dispatch_log.list_failed(10).await.unwrap().len(), 1);

        let again = f.dispatcher.process_trade(&whale_trade).await.unwrap();
        assert_eq!(
            again,
            vec![(alice(), AlertOutcome::Duplicate(DispatchState::Failed))]
        );
        assert!(f.channel.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn endpoint_rejection_deactivates_binding() {
        let f = fixture().await;
        f.channel.script.lock().push(Ok(false));

        let first = f
            .dispatcher
            .process_trade(&trade("0x02", Side::Buy, dec!(25000), dec!(0.5)))
            .await
            .unwrap();
        assert_eq!(
            first[0].1,
            AlertOutcome::Suppressed(SuppressReason::EndpointRejected)
        );
        assert!(!f.storage.bindings.binding(&alice()).await.unwrap().unwrap().active);

        let second = f
            .dispatcher
            .process_trade(&trade("0x03", Side::Buy, dec!(25000), dec!(0.5)))
            .await
            .unwrap();
        assert_eq!(
            second[0].1,
            AlertOutcome::Suppressed(SuppressReason::BindingInactive)
        );
        assert_eq!(f.channel.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_record_failure() {
        let f = fixture().await;
        {
            let mut script = f.channel.script.lock();
            for _ in 0..3 {
                script.push(Err(Error::ChannelDelivery("network down".into())));
            }
        }
        let whale_trade = trade("0x02", Side::Buy, dec!(25000), dec!(0.5));

        let outcome = f.dispatcher.process_trade(&whale_trade).await.unwrap();
        assert!(matches!(outcome[0].1, AlertOutcome::Failed(_)));
        assert_eq!(f.channel.sent.lock().len(), 3);

        let record = f
            .storage
            .dispatch_log
            .record(&alice(), &whale_trade.tx_hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.state, DispatchState::Failed);
        assert_eq!(record.attempts, 3);
        assert_eq!(f.storage.dispatch_log.list_failed(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transient_error_then_success_dispatches() {
        let f = fixture().await;
        f.channel
            .script
            .lock()
            .push(Err(Error::ChannelDelivery("timeout".into())));

        let outcome = f
            .dispatcher
            .process_trade(&trade("0x02", Side::Buy, dec!(25000), dec!(0.5)))
            .await
            .unwrap();
        assert_eq!(outcome[0].1, AlertOutcome::Dispatched);
        assert_eq!(f.channel.sent.lock().len(), 2);
    }

    #[tokio::test]
    async fn stale_trade_is_suppressed() {
        let f = fixture().await;
        let mut old = trade("0x02", Side::Buy, dec!(25000), dec!(0.5));
        old.timestamp -= 7200;

        let outcome = f.dispatcher.process_trade(&old).await.unwrap();
        assert_eq!(outcome[0].1, AlertOutcome::Suppressed(SuppressReason::StaleTrade));
        assert!(f.channel.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn first_start_skips_existing_trades() {
        let (_dir, store) = test_store();
        let storage = Storage::from_backend(Arc::new(store));
        storage
            .trades
            .upsert(&trade("0x01", Side::Buy, dec!(25000), dec!(0.5)))
            .await
            .unwrap();

        let mut dispatcher = AlertDispatcher::new(
            DispatchConfig::default(),
            storage.clone(),
            Arc::new(NullCatalog),
            Arc::new(ScriptedChannel::default()),
        );
        let summary = dispatcher.run_cycle().await.unwrap();

        assert_eq!(summary.trades, 0);
        assert_eq!(storage.dispatch_log.position().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn cycle_consumes_new_trades_once() {
        let mut f = fixture().await;
        f.storage
            .trades
            .upsert(&trade("0x02", Side::Buy, dec!(25000), dec!(0.5)))
            .await
            .unwrap();

        let first = f.dispatcher.run_cycle().await.unwrap();
        assert_eq!(first.trades, 1);
        assert_eq!(first.dispatched, 1);

        let second = f.dispatcher.run_cycle().await.unwrap();
        assert_eq!(second, DispatchSummary::default());
    }
}
