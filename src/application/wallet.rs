//! Wallet tracking use cases.
//!
//! Removing the last active target for an address cascades to the address's
//! cursor and stored trades. The cascade is idempotent, so it is safe to run
//! again after a poll that raced the removal wrote stray data.

use tracing::{debug, info};

use crate::domain::{Address, Removal, UserId, WalletTarget};
use crate::error::Result;
use crate::port::Storage;

/// Data deleted for an address no active target tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Purge {
    pub cursor_removed: bool,
    pub trades_removed: usize,
}

/// Add, remove and list tracked wallets.
#[derive(Clone)]
pub struct WalletService {
    storage: Storage,
}

impl WalletService {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Start tracking an address for a user.
    ///
    /// # Errors
    /// Returns a validation error for a malformed address.
    pub async fn add(&self, owner: &UserId, address: &str) -> Result<WalletTarget> {
        let address = Address::parse(address)?;
        let target = self.storage.wallets.add(owner, &address).await?;
        info!(owner = %owner, wallet = %address, "Wallet tracked");
        Ok(target)
    }

    /// Stop tracking an address for a user.
    ///
    /// Returns whether a target was affected. When no active target for the
    /// address remains, its cursor and trades are deleted as well.
    pub async fn remove(&self, owner: &UserId, address: &str, removal: Removal) -> Result<bool> {
        let address = Address::parse(address)?;
        let removed = self.storage.wallets.remove(owner, &address, removal).await?;
        if removed {
            info!(owner = %owner, wallet = %address, ?removal, "Wallet untracked");
        }
        self.purge_if_untracked(&address).await?;
        Ok(removed)
    }

    pub async fn list(&self, owner: &UserId) -> Result<Vec<WalletTarget>> {
        self.storage.wallets.list_for_owner(owner).await
    }

    /// Delete an address's cursor and trades if nobody actively tracks it.
    ///
    /// Returns `None` when the address is still tracked.
    pub async fn purge_if_untracked(&self, address: &Address) -> Result<Option<Purge>> {
        if !self.storage.wallets.owners_tracking(address).await?.is_empty() {
            return Ok(None);
        }

        let purge = Purge {
            cursor_removed: self.storage.cursors.remove(address).await?,
            trades_removed: self.storage.trades.delete_by_wallet(address).await?,
        };
        if purge.cursor_removed || purge.trades_removed > 0 {
            info!(
                wallet = %address,
                cursor_removed = purge.cursor_removed,
                trades_removed = purge.trades_removed,
                "Purged untracked wallet data"
            );
        }
        Ok(Some(purge))
    }

    /// Purge every address that has a cursor or trades but no active target.
    ///
    /// Addresses in `skip` (e.g. currently being polled) are left for the
    /// next sweep. Returns the number of addresses purged.
    pub async fn sweep_orphans(&self, skip: impl Fn(&Address) -> bool) -> Result<usize> {
        let mut candidates = self.storage.cursors.addresses().await?;
        candidates.extend(self.storage.trades.wallets().await?);
        candidates.sort();
        candidates.dedup();

        let mut purged = 0;
        for address in candidates {
            if skip(&address) {
                debug!(wallet = %address, "Orphan sweep skipping wallet in flight");
                continue;
            }
            if self.purge_if_untracked(&address).await?.is_some() {
                purged += 1;
            }
        }
        Ok(purged)
    }
}
