//! Composition root: builds every adapter once and wires the worker loops.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::adapter::outbound::notifier::LogChannel;
#[cfg(feature = "telegram")]
use crate::adapter::outbound::notifier::telegram::{TelegramChannel, TelegramSettings};
use crate::adapter::outbound::polymarket::{CachedCatalog, PolymarketClient};
use crate::adapter::outbound::sqlite::database::connection::{
    create_pool, enable_wal, run_migrations,
};
use crate::adapter::outbound::sqlite::SqliteStore;
use crate::application::{
    AlertConfigService, AlertDispatcher, BindingService, DispatchHandle, IngestionHandle,
    IngestionScheduler, TradeQueryService, WalletService,
};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{MarketCatalog, NotificationChannel, Storage, TradeFeed};

/// Open the database, apply migrations and expose it as [`Storage`].
///
/// # Errors
/// Fails when the pool cannot be created or a migration fails.
pub fn open_storage(database: &str) -> Result<Storage> {
    let pool = create_pool(database)?;
    run_migrations(&pool)?;
    if let Err(e) = enable_wal(&pool) {
        warn!(error = %e, "Failed to enable WAL, continuing with default journal");
    }
    info!(database, "Database ready");
    Ok(Storage::from_backend(Arc::new(SqliteStore::new(pool))))
}

/// Build the notification channel from configuration.
///
/// Telegram is used only when enabled, a token is present and dry-run is
/// off; every other case falls back to the log channel.
#[cfg(feature = "telegram")]
pub fn build_channel(config: &Config) -> Arc<dyn NotificationChannel> {
    if config.dry_run {
        info!("Dry run, alerts are logged only");
        return Arc::new(LogChannel);
    }
    if !config.telegram.enabled {
        return Arc::new(LogChannel);
    }
    match TelegramSettings::token_from_env() {
        Some(token) => {
            info!("Telegram channel enabled");
            Arc::new(TelegramChannel::new(&config.telegram.settings(token)))
        }
        None => {
            warn!("Telegram enabled but TELEGRAM_BOT_TOKEN not set, alerts are logged only");
            Arc::new(LogChannel)
        }
    }
}

/// Build the notification channel from configuration (non-telegram variant).
#[cfg(not(feature = "telegram"))]
pub fn build_channel(config: &Config) -> Arc<dyn NotificationChannel> {
    if config.telegram.enabled {
        warn!("Telegram enabled in config but the telegram feature is not compiled in");
    }
    Arc::new(LogChannel)
}

/// Use cases offered to the account/API layer, sharing one storage backend.
#[derive(Clone)]
pub struct Services {
    pub wallets: WalletService,
    pub alert_configs: AlertConfigService,
    pub bindings: BindingService,
    pub trades: TradeQueryService,
}

impl Services {
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        Self {
            wallets: WalletService::new(storage.clone()),
            alert_configs: AlertConfigService::new(storage.clone()),
            bindings: BindingService::new(storage.clone()),
            trades: TradeQueryService::new(storage.clone()),
        }
    }
}

/// Running ingestion and dispatch loops.
pub struct Worker {
    pub services: Services,
    ingestion: IngestionHandle,
    dispatch: DispatchHandle,
}

impl Worker {
    /// Wire every dependency and start both loops.
    ///
    /// # Errors
    /// Fails when storage cannot be opened or dispatcher recovery fails.
    pub async fn start(config: &Config) -> Result<Self> {
        let storage = open_storage(&config.database)?;

        let client = Arc::new(PolymarketClient::from_config(&config.polymarket));
        let feed: Arc<dyn TradeFeed> = client.clone();
        let catalog: Arc<dyn MarketCatalog> = Arc::new(CachedCatalog::new(
            client,
            Duration::from_secs(config.polymarket.http.metadata_ttl_secs),
        ));
        let channel = build_channel(config);

        let scheduler = Arc::new(IngestionScheduler::new(
            config.ingestion.clone(),
            storage.clone(),
            feed,
        ));

        let mut dispatcher =
            AlertDispatcher::new(config.dispatch.clone(), storage.clone(), catalog, channel);
        dispatcher.recover().await?;

        let ingestion = scheduler.start();
        let dispatch = dispatcher.start();
        info!(dry_run = config.dry_run, "Worker started");

        Ok(Self {
            services: Services::new(&storage),
            ingestion,
            dispatch,
        })
    }

    /// Stop both loops, letting the current dispatch cycle finish.
    pub async fn shutdown(self) {
        self.ingestion.shutdown().await;
        self.dispatch.shutdown().await;
        info!("Worker stopped");
    }
}
