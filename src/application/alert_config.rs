//! Alert configuration use cases.

use tracing::info;

use crate::domain::{AlertConfig, AlertConfigPatch, UserId};
use crate::error::Result;
use crate::port::Storage;

/// Read and update per-user alert filters.
#[derive(Clone)]
pub struct AlertConfigService {
    storage: Storage,
}

impl AlertConfigService {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The user's config, or defaults if they never saved one.
    pub async fn get(&self, owner: &UserId) -> Result<AlertConfig> {
        self.storage.configs.get(owner).await
    }

    /// Apply a partial update.
    ///
    /// # Errors
    /// Returns a validation error, with nothing written, when the result
    /// would violate a field invariant.
    pub async fn update(&self, owner: &UserId, patch: AlertConfigPatch) -> Result<AlertConfig> {
        let config = self.storage.configs.upsert(owner, patch).await?;
        info!(
            owner = %owner,
            enabled = config.enabled,
            min_notional_usd = %config.min_notional_usd,
            "Alert config updated"
        );
        Ok(config)
    }
}
