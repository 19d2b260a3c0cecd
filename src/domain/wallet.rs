//! Tracked wallets and notification endpoint bindings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::id::{Address, UserId};

/// A wallet a user wants the ingester to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTarget {
    pub owner: UserId,
    pub address: Address,
    pub active: bool,
}

/// How a wallet is removed from a user's tracking set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Removal {
    /// Keep the row with `active = false`.
    #[default]
    Soft,
    /// Delete the row entirely.
    Hard,
}

/// Opaque address of a user's messaging endpoint (e.g. a Telegram chat).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub owner: UserId,
    pub endpoint_id: String,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl ChannelBinding {
    /// Create an active binding.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyEndpoint`] for a blank endpoint id.
    pub fn new(owner: UserId, endpoint_id: impl Into<String>) -> Result<Self, ValidationError> {
        let endpoint_id = endpoint_id.into();
        if endpoint_id.trim().is_empty() {
            return Err(ValidationError::EmptyEndpoint);
        }
        Ok(Self {
            owner,
            endpoint_id,
            active: true,
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_requires_endpoint() {
        let owner = UserId::parse("u1").unwrap();
        assert_eq!(
            ChannelBinding::new(owner.clone(), " "),
            Err(ValidationError::EmptyEndpoint)
        );
        let binding = ChannelBinding::new(owner, "12345").unwrap();
        assert!(binding.active);
    }
}
