//! Notification endpoint binding, called by the account layer.

use tracing::info;

use crate::domain::{ChannelBinding, UserId};
use crate::error::Result;
use crate::port::Storage;

#[derive(Clone)]
pub struct BindingService {
    storage: Storage,
}

impl BindingService {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Bind (or rebind) a user's endpoint and mark it active.
    ///
    /// # Errors
    /// Returns a validation error for a blank endpoint id.
    pub async fn bind(&self, owner: &UserId, endpoint_id: &str) -> Result<ChannelBinding> {
        let binding = ChannelBinding::new(owner.clone(), endpoint_id.trim())?;
        self.storage.bindings.bind(&binding).await?;
        info!(owner = %owner, "Notification endpoint bound");
        Ok(binding)
    }

    /// Deactivate a user's binding. Later alerts for them are suppressed.
    pub async fn unbind(&self, owner: &UserId) -> Result<bool> {
        let existed = self.storage.bindings.deactivate(owner).await?;
        if existed {
            info!(owner = %owner, "Notification endpoint unbound");
        }
        Ok(existed)
    }

    pub async fn binding(&self, owner: &UserId) -> Result<Option<ChannelBinding>> {
        self.storage.bindings.binding(owner).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapter::outbound::sqlite::store::test_store;

    #[tokio::test]
    async fn bind_and_unbind() {
        let (_dir, store) = test_store();
        let service = BindingService::new(Storage::from_backend(Arc::new(store)));
        let alice = UserId::parse("alice").unwrap();

        assert!(service.bind(&alice, "  ").await.is_err());
        service.bind(&alice, " 42 ").await.unwrap();
        assert_eq!(service.binding(&alice).await.unwrap().unwrap().endpoint_id, "42");

        assert!(service.unbind(&alice).await.unwrap());
        assert!(!service.binding(&alice).await.unwrap().unwrap().active);
    }
}
