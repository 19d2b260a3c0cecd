//! Per-wallet trade ingestion.
//!
//! # Architecture
//!
//! ```text
//! WalletRegistry --(active addresses)--> IngestionScheduler
//!                                               |
//!                                               +-- one task per wallet (bounded)
//!                                               |      TradeFeed::fetch_page (paged)
//!                                               |      TradeStore::upsert_batch
//!                                               |      CursorStore::advance
//!                                               |
//!                                               +-- orphan sweep (periodic)
//! ```
//!
//! At most one poll per wallet is in flight; a tick that finds a wallet
//! still being polled skips it. Trades are made durable before the cursor
//! moves, so a crash between the two only causes idempotent re-fetches.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::{DashMap, DashSet};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::backoff::FailureBackoff;
use super::config::IngestionConfig;
use crate::application::wallet::WalletService;
use crate::domain::{Address, CursorPosition, Trade};
use crate::error::{Error, Result};
use crate::port::{PageToken, Storage, TradeFeed};

/// Result of one completed poll of one wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub pages: u32,
    /// Cursor position after the poll; unchanged when nothing new arrived.
    pub new_position: Option<CursorPosition>,
}

/// Totals for one scheduling round across all wallets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub polled: usize,
    /// Wallets still in flight from an earlier round.
    pub in_flight: usize,
    /// Wallets waiting out a failure backoff.
    pub backing_off: usize,
    pub failed: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

enum WalletPoll {
    Done(PollReport),
    InFlight,
    Failed,
}

/// Where an unfinished catch-up pass stopped, and the newest trade it saw.
///
/// Kept in memory only: after a restart the pass starts again from the
/// newest page, which is safe because the cursor did not move.
#[derive(Debug, Clone)]
struct Backlog {
    next: PageToken,
    newest: CursorPosition,
}

fn newer_of(a: Option<CursorPosition>, b: Option<CursorPosition>) -> Option<CursorPosition> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.is_older_than(&b) { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Marks a wallet as being polled until dropped.
struct InFlightGuard {
    set: Arc<DashSet<Address>>,
    wallet: Address,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.wallet);
    }
}

/// Handle for controlling the ingestion loop lifecycle.
pub struct IngestionHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl IngestionHandle {
    /// Signal the loop to stop and wait for it to exit.
    ///
    /// Polls already spawned finish on their own; each only touches its own
    /// wallet, so abandoning them at process exit is safe.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

/// Polls the upstream feed for every actively tracked wallet.
pub struct IngestionScheduler {
    storage: Storage,
    feed: Arc<dyn TradeFeed>,
    wallets: WalletService,
    config: IngestionConfig,
    in_flight: Arc<DashSet<Address>>,
    permits: Arc<Semaphore>,
    backoff: FailureBackoff,
    backlog: DashMap<Address, Backlog>,
}

impl IngestionScheduler {
    pub fn new(config: IngestionConfig, storage: Storage, feed: Arc<dyn TradeFeed>) -> Self {
        let backoff = FailureBackoff::new(
            Duration::from_millis(config.failure_backoff_initial_ms),
            Duration::from_millis(config.failure_backoff_max_ms),
        );
        Self {
            wallets: WalletService::new(storage.clone()),
            storage,
            feed,
            permits: Arc::new(Semaphore::new(config.max_concurrent_polls.max(1))),
            in_flight: Arc::new(DashSet::new()),
            backoff,
            backlog: DashMap::new(),
            config,
        }
    }

    fn try_begin(&self, wallet: &Address) -> Option<InFlightGuard> {
        self.in_flight.insert(wallet.clone()).then(|| InFlightGuard {
            set: Arc::clone(&self.in_flight),
            wallet: wallet.clone(),
        })
    }

    /// True while a poll of `wallet` is running.
    #[must_use]
    pub fn is_in_flight(&self, wallet: &Address) -> bool {
        self.in_flight.contains(wallet)
    }

    /// Poll one wallet unless a poll of it is already running.
    ///
    /// Returns `Ok(None)` when skipped because another poll is in flight.
    ///
    /// # Errors
    /// Feed and store errors abort the poll. A [`Error::StaleCursor`] from
    /// the cursor store aborts it after the trades are stored, which is
    /// harmless because trade upserts are idempotent.
    pub async fn poll(&self, wallet: &Address) -> Result<Option<PollReport>> {
        let Some(_guard) = self.try_begin(wallet) else {
            debug!(wallet = %wallet, "Poll already in flight, skipping");
            return Ok(None);
        };
        self.poll_locked(wallet).await.map(Some)
    }

    async fn poll_locked(&self, wallet: &Address) -> Result<PollReport> {
        let since = self
            .storage
            .cursors
            .get(wallet)
            .await?
            .and_then(|cursor| cursor.position);

        // A backlog pass left unfinished by the previous poll continues
        // where it stopped; the cursor has not moved since.
        let resumed = self
            .backlog
            .remove(wallet)
            .map(|(_, backlog)| backlog)
            .filter(|_| since.is_some());
        let budget = match since {
            Some(_) => self.config.max_pages_per_poll,
            None => self.config.initial_backfill_pages,
        }
        .max(1);

        let mut collected: Vec<Trade> = Vec::new();
        let mut seen = HashSet::new();
        let (mut token, carried) = match resumed {
            Some(Backlog { next, newest }) => (Some(next), Some(newest)),
            None => (None, None),
        };
        let mut pages = 0;
        let mut unfinished = None;

        loop {
            let page = self
                .feed
                .fetch_page(wallet, since.as_ref(), token.as_ref())
                .await?;
            pages += 1;

            for trade in page.trades {
                if seen.insert(trade.tx_hash.clone()) {
                    collected.push(trade);
                }
            }

            match page.next {
                None => break,
                Some(next) if pages >= budget => {
                    if since.is_some() {
                        unfinished = Some(next);
                    } else {
                        debug!(wallet = %wallet, pages, "Initial backfill limit reached");
                    }
                    break;
                }
                Some(next) => token = Some(next),
            }
        }

        let newest = newer_of(carried, CursorPosition::newest_of(&collected));

        // Feeds list newest first; store oldest first so insertion order
        // follows trade time.
        collected.reverse();
        collected.sort_by_key(|trade| trade.timestamp);
        let batch = self.storage.trades.upsert_batch(&collected).await?;

        if let (Some(next), Some(newest)) = (unfinished, newest.clone()) {
            info!(
                wallet = %wallet,
                pages,
                inserted = batch.inserted,
                "Page budget exhausted before reaching cursor, continuing next poll"
            );
            self.backlog.insert(wallet.clone(), Backlog { next, newest });
            return Ok(PollReport {
                inserted: batch.inserted,
                duplicates: batch.duplicates,
                pages,
                new_position: since,
            });
        }

        let Some(newest) = newest else {
            return Ok(PollReport {
                inserted: 0,
                duplicates: 0,
                pages,
                new_position: since,
            });
        };

        let new_position = match since {
            Some(stored) if newest.is_older_than(&stored) => {
                warn!(
                    wallet = %wallet,
                    stored = %stored,
                    newest = %newest,
                    "Feed returned only trades older than cursor (reorg?), keeping cursor"
                );
                stored
            }
            // Same-second siblings of the boundary come back on every poll.
            Some(stored) if !stored.is_older_than(&newest) => stored,
            _ => {
                self.storage.cursors.advance(wallet, &newest).await?;
                newest
            }
        };

        debug!(
            wallet = %wallet,
            inserted = batch.inserted,
            duplicates = batch.duplicates,
            pages,
            position = %new_position,
            "Wallet polled"
        );
        Ok(PollReport {
            inserted: batch.inserted,
            duplicates: batch.duplicates,
            pages,
            new_position: Some(new_position),
        })
    }

    /// Poll inside a concurrency permit, then apply backoff bookkeeping and
    /// clean up if the wallet was removed while the poll ran.
    ///
    /// The in-flight check comes before the permit, so a wallet that is
    /// still being polled is skipped rather than queued behind it.
    async fn poll_tracked(self: Arc<Self>, wallet: Address) -> WalletPoll {
        let Some(guard) = self.try_begin(&wallet) else {
            debug!(wallet = %wallet, "Poll already in flight, skipping");
            return WalletPoll::InFlight;
        };
        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return WalletPoll::Failed;
        };

        let polled = self.poll_locked(&wallet).await;
        drop(permit);
        drop(guard);

        match polled {
            Ok(report) => {
                self.backoff.record_success(&wallet);
                if let Err(e) = self.wallets.purge_if_untracked(&wallet).await {
                    warn!(wallet = %wallet, error = %e, "Post-poll cleanup failed");
                }
                WalletPoll::Done(report)
            }
            Err(e) => {
                let delay = self.backoff.record_failure(&wallet, Instant::now());
                let failures = self.backoff.failures(&wallet);
                match &e {
                    Error::StaleCursor { .. } => {
                        warn!(wallet = %wallet, error = %e, "Poll aborted on stale cursor");
                    }
                    e if e.is_transient() => warn!(
                        wallet = %wallet,
                        error = %e,
                        failures,
                        retry_in_ms = delay.as_millis() as u64,
                        "Transient poll failure"
                    ),
                    e => error!(
                        wallet = %wallet,
                        error = %e,
                        failures,
                        retry_in_ms = delay.as_millis() as u64,
                        "Poll failed"
                    ),
                }
                WalletPoll::Failed
            }
        }
    }

    /// Poll every active wallet once and wait for all polls to finish.
    ///
    /// One wallet's failure never prevents polling of the others.
    ///
    /// # Errors
    /// Only fails when the active wallet set cannot be read.
    pub async fn run_cycle(self: &Arc<Self>) -> Result<CycleSummary> {
        let wallets = self.storage.wallets.active_addresses().await?;
        let now = Instant::now();
        let mut summary = CycleSummary::default();
        let mut tasks = JoinSet::new();

        for wallet in wallets {
            if self.backoff.is_waiting(&wallet, now) {
                summary.backing_off += 1;
                continue;
            }
            tasks.spawn(Arc::clone(self).poll_tracked(wallet));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(WalletPoll::Done(report)) => {
                    summary.polled += 1;
                    summary.inserted += report.inserted;
                    summary.duplicates += report.duplicates;
                }
                Ok(WalletPoll::InFlight) => summary.in_flight += 1,
                Ok(WalletPoll::Failed) => summary.failed += 1,
                Err(e) => {
                    error!(error = %e, "Poll task panicked");
                    summary.failed += 1;
                }
            }
        }

        if summary.inserted > 0 || summary.failed > 0 {
            info!(
                polled = summary.polled,
                inserted = summary.inserted,
                duplicates = summary.duplicates,
                failed = summary.failed,
                backing_off = summary.backing_off,
                "Ingestion cycle complete"
            );
        } else {
            debug!(polled = summary.polled, in_flight = summary.in_flight, "Ingestion cycle idle");
        }
        Ok(summary)
    }

    /// Delete cursors and trades of addresses no longer tracked.
    pub async fn sweep_orphans(&self) -> Result<usize> {
        let purged = self
            .wallets
            .sweep_orphans(|wallet| self.is_in_flight(wallet))
            .await?;
        if purged > 0 {
            info!(purged, "Orphan sweep removed untracked wallet data");
        }
        Ok(purged)
    }

    /// Start the background ingestion loop.
    ///
    /// Each poll tick spawns a round without waiting for the previous one,
    /// so a slow wallet never delays the others; the in-flight set makes
    /// overlapping rounds skip it instead.
    pub fn start(self: Arc<Self>) -> IngestionHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let mut poll_tick = tokio::time::interval(self.config.poll_interval());
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sweep_tick = tokio::time::interval(self.config.orphan_sweep_interval());
        sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            max_concurrent_polls = self.config.max_concurrent_polls,
            "Ingestion scheduler started"
        );

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Ingestion scheduler shutting down");
                        break;
                    }

                    _ = poll_tick.tick() => {
                        let scheduler = Arc::clone(&self);
                        tokio::spawn(async move {
                            if let Err(e) = scheduler.run_cycle().await {
                                warn!(error = %e, "Failed to start ingestion cycle");
                            }
                        });
                    }

                    _ = sweep_tick.tick() => {
                        if let Err(e) = self.sweep_orphans().await {
                            warn!(error = %e, "Orphan sweep failed");
                        }
                    }
                }
            }
        });

        IngestionHandle { shutdown_tx, task }
    }
}
