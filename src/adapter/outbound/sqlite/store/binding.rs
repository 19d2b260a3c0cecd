use async_trait::async_trait;
use diesel::prelude::*;

use super::{format_time, now, parse_time, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::ChannelBindingRow;
use crate::adapter::outbound::sqlite::database::schema::channel_bindings;
use crate::domain::{ChannelBinding, UserId};
use crate::error::{Error, Result};
use crate::port::outbound::store::ChannelBindings;

#[async_trait]
impl ChannelBindings for SqliteStore {
    async fn bind(&self, binding: &ChannelBinding) -> Result<()> {
        let row = ChannelBindingRow {
            owner: binding.owner.as_str().to_string(),
            endpoint_id: binding.endpoint_id.clone(),
            active: binding.active,
            updated_at: format_time(binding.updated_at),
        };
        let mut conn = self.conn()?;

        diesel::replace_into(channel_bindings::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn deactivate(&self, owner: &UserId) -> Result<bool> {
        let mut conn = self.conn()?;
        let updated = diesel::update(channel_bindings::table.find(owner.as_str()))
            .set((
                channel_bindings::active.eq(false),
                channel_bindings::updated_at.eq(format_time(now())),
            ))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(updated > 0)
    }

    async fn binding(&self, owner: &UserId) -> Result<Option<ChannelBinding>> {
        let mut conn = self.conn()?;
        let row: Option<ChannelBindingRow> = channel_bindings::table
            .find(owner.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(|row| {
            Ok(ChannelBinding {
                owner: UserId::parse(row.owner)?,
                endpoint_id: row.endpoint_id,
                active: row.active,
                updated_at: parse_time(&row.updated_at)?,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::store::test_store;

    #[tokio::test]
    async fn bind_deactivate_rebind() {
        let (_dir, store) = test_store();
        let alice = UserId::parse("alice").unwrap();
        assert!(store.binding(&alice).await.unwrap().is_none());
        assert!(!store.deactivate(&alice).await.unwrap());

        store
            .bind(&ChannelBinding::new(alice.clone(), "12345").unwrap())
            .await
            .unwrap();
        assert!(store.binding(&alice).await.unwrap().unwrap().active);

        assert!(store.deactivate(&alice).await.unwrap());
        let binding = store.binding(&alice).await.unwrap().unwrap();
        assert!(!binding.active);
        assert_eq!(binding.endpoint_id, "12345");

        store
            .bind(&ChannelBinding::new(alice.clone(), "67890").unwrap())
            .await
            .unwrap();
        let binding = store.binding(&alice).await.unwrap().unwrap();
        assert!(binding.active);
        assert_eq!(binding.endpoint_id, "67890");
    }
}
