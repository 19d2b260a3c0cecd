use async_trait::async_trait;
use diesel::prelude::*;

use super::{format_time, now, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::WalletTargetRow;
use crate::adapter::outbound::sqlite::database::schema::wallet_targets;
use crate::domain::{Address, Removal, UserId, WalletTarget};
use crate::error::{Error, Result};
use crate::port::outbound::store::WalletRegistry;

fn from_row(row: WalletTargetRow) -> Result<WalletTarget> {
    Ok(WalletTarget {
        owner: UserId::parse(row.owner)?,
        address: Address::parse(&row.address)?,
        active: row.active,
    })
}

#[async_trait]
impl WalletRegistry for SqliteStore {
    async fn add(&self, owner: &UserId, address: &Address) -> Result<WalletTarget> {
        let row = WalletTargetRow {
            owner: owner.as_str().to_string(),
            address: address.as_str().to_string(),
            active: true,
            created_at: format_time(now()),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(wallet_targets::table)
            .values(&row)
            .on_conflict((wallet_targets::owner, wallet_targets::address))
            .do_update()
            .set(wallet_targets::active.eq(true))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(WalletTarget {
            owner: owner.clone(),
            address: address.clone(),
            active: true,
        })
    }

    async fn remove(&self, owner: &UserId, address: &Address, removal: Removal) -> Result<bool> {
        let mut conn = self.conn()?;
        let target = wallet_targets::table
            .filter(wallet_targets::owner.eq(owner.as_str()))
            .filter(wallet_targets::address.eq(address.as_str()));

        let affected = match removal {
            Removal::Soft => diesel::update(target.filter(wallet_targets::active.eq(true)))
                .set(wallet_targets::active.eq(false))
                .execute(&mut conn),
            Removal::Hard => diesel::delete(target).execute(&mut conn),
        }
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(affected > 0)
    }

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<WalletTarget>> {
        let mut conn = self.conn()?;
        let rows: Vec<WalletTargetRow> = wallet_targets::table
            .filter(wallet_targets::owner.eq(owner.as_str()))
            .order(wallet_targets::address.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(from_row).collect()
    }

    async fn active_addresses(&self) -> Result<Vec<Address>> {
        let mut conn = self.conn()?;
        let raw: Vec<String> = wallet_targets::table
            .filter(wallet_targets::active.eq(true))
            .select(wallet_targets::address)
            .distinct()
            .order(wallet_targets::address.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        raw.iter()
            .map(|a| Address::parse(a).map_err(Error::from))
            .collect()
    }

    async fn owners_tracking(&self, address: &Address) -> Result<Vec<UserId>> {
        let mut conn = self.conn()?;
        let raw: Vec<String> = wallet_targets::table
            .filter(wallet_targets::address.eq(address.as_str()))
            .filter(wallet_targets::active.eq(true))
            .select(wallet_targets::owner)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        raw.into_iter()
            .map(|o| UserId::parse(o).map_err(Error::from))
            .collect()
    }
}
