use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use whalewatch::domain::{Address, CursorPosition, Trade};
use whalewatch::error::Result;
use whalewatch::port::{FeedPage, PageToken, TradeFeed};

/// Deterministic per-wallet trade feed.
///
/// Serves each wallet's history newest first in fixed-size pages, returns
/// only trades newer than the cursor and stops paginating once a page
/// passes it. The same trade may be pushed to several wallets.
pub struct ScriptedFeed {
    histories: Mutex<HashMap<Address, Vec<Trade>>>,
    page_size: usize,
    gate: Option<Arc<Notify>>,
    fetches: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new(page_size: usize) -> Self {
        Self {
            histories: Mutex::new(HashMap::new()),
            page_size,
            gate: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Hold every fetch until the returned gate is notified once per fetch.
    pub fn gated(page_size: usize) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let feed = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new(page_size)
        };
        (feed, gate)
    }

    pub fn push(&self, wallet: &Address, trade: Trade) {
        let mut histories = self.histories.lock();
        let history = histories.entry(wallet.clone()).or_default();
        history.push(trade);
        history.sort_by_key(|t| std::cmp::Reverse(t.timestamp));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeFeed for ScriptedFeed {
    async fn fetch_page(
        &self,
        wallet: &Address,
        since: Option<&CursorPosition>,
        page: Option<&PageToken>,
    ) -> Result<FeedPage> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let offset: usize = page.map_or(0, |p| p.as_str().parse().expect("numeric page token"));
        let window: Vec<Trade> = self
            .histories
            .lock()
            .get(wallet)
            .map(|history| {
                history
                    .iter()
                    .skip(offset)
                    .take(self.page_size)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let crossed = since.is_some_and(|s| window.iter().any(|t| t.timestamp < s.timestamp));
        let next = (window.len() == self.page_size && !crossed)
            .then(|| PageToken::new((offset + window.len()).to_string()));
        let trades = window
            .into_iter()
            .filter(|t| since.map_or(true, |s| is_after(t, s)))
            .collect();

        Ok(FeedPage { trades, next })
    }
}

fn is_after(trade: &Trade, since: &CursorPosition) -> bool {
    trade.timestamp > since.timestamp
        || (trade.timestamp == since.timestamp && trade.tx_hash.as_str() != since.tx_hash)
}
