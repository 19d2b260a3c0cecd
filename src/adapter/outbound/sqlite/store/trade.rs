use async_trait::async_trait;
use diesel::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use super::{format_time, now, parse_decimal, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::{NewTradeRow, TradeRow};
use crate::adapter::outbound::sqlite::database::schema::trades;
use crate::domain::{Address, Side, StoredTrade, Trade, TxHash, UpsertOutcome};
use crate::error::{Error, Result};
use crate::port::outbound::store::{BatchUpsert, TradeStore};

fn to_row(trade: &Trade, ingested_at: &str) -> NewTradeRow {
    NewTradeRow {
        tx_hash: trade.tx_hash.as_str().to_string(),
        wallet: trade.wallet.as_str().to_string(),
        side: trade.side.as_str().to_string(),
        size: trade.size.to_string(),
        price: trade.price.to_string(),
        notional: trade.notional().to_f64().unwrap_or(0.0),
        outcome: trade.outcome.clone(),
        market_title: trade.market_title.clone(),
        market_slug: trade.market_slug.clone(),
        condition_id: trade.condition_id.clone(),
        traded_at: trade.timestamp,
        ingested_at: ingested_at.to_string(),
    }
}

fn from_row(row: TradeRow) -> Result<StoredTrade> {
    let trade = Trade {
        tx_hash: TxHash::new(row.tx_hash),
        wallet: Address::parse(&row.wallet)?,
        side: row.side.parse::<Side>()?,
        size: parse_decimal("size", &row.size)?,
        price: parse_decimal("price", &row.price)?,
        outcome: row.outcome,
        market_title: row.market_title,
        market_slug: row.market_slug,
        condition_id: row.condition_id,
        timestamp: row.traded_at,
    };
    Ok(StoredTrade {
        seq: row.seq,
        trade,
    })
}

#[async_trait]
impl TradeStore for SqliteStore {
    async fn upsert(&self, trade: &Trade) -> Result<UpsertOutcome> {
        let row = to_row(trade, &format_time(now()));
        let mut conn = self.conn()?;

        let inserted = diesel::insert_or_ignore_into(trades::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(UpsertOutcome {
            inserted: inserted > 0,
        })
    }

    async fn upsert_batch(&self, batch: &[Trade]) -> Result<BatchUpsert> {
        if batch.is_empty() {
            return Ok(BatchUpsert::default());
        }

        let ingested_at = format_time(now());
        let mut conn = self.conn()?;

        let inserted = conn.immediate_transaction(|conn| {
            let mut inserted = 0;
            for trade in batch {
                inserted += diesel::insert_or_ignore_into(trades::table)
                    .values(&to_row(trade, &ingested_at))
                    .execute(conn)?;
            }
            Ok::<usize, Error>(inserted)
        })?;

        let outcome = BatchUpsert {
            inserted,
            duplicates: batch.len() - inserted,
        };
        debug!(
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            "Upserted trade batch"
        );
        Ok(outcome)
    }

    async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
        min_notional: Option<Decimal>,
    ) -> Result<Vec<Trade>> {
        let mut conn = self.conn()?;

        let mut query = trades::table
            .select(TradeRow::as_select())
            .order((trades::traded_at.desc(), trades::seq.desc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(min) = min_notional {
            query = query.filter(trades::notional.ge(min.to_f64().unwrap_or(0.0)));
        }

        let rows: Vec<TradeRow> = query
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| from_row(row).map(|stored| stored.trade))
            .collect()
    }

    async fn count_all(&self) -> Result<i64> {
        let mut conn = self.conn()?;
        trades::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn delete_by_wallet(&self, address: &Address) -> Result<usize> {
        let mut conn = self.conn()?;
        diesel::delete(trades::table.filter(trades::wallet.eq(address.as_str())))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_after(&self, seq: i64, limit: i64) -> Result<Vec<StoredTrade>> {
        let mut conn = self.conn()?;
        let rows: Vec<TradeRow> = trades::table
            .select(TradeRow::as_select())
            .filter(trades::seq.gt(seq))
            .order(trades::seq.asc())
            .limit(limit)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(from_row).collect()
    }

    async fn head_seq(&self) -> Result<i64> {
        let mut conn = self.conn()?;
        let head: Option<i64> = trades::table
            .select(diesel::dsl::max(trades::seq))
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(head.unwrap_or(0))
    }

    async fn wallets(&self) -> Result<Vec<Address>> {
        let mut conn = self.conn()?;
        let raw: Vec<String> = trades::table
            .select(trades::wallet)
            .distinct()
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        raw.iter()
            .map(|a| Address::parse(a).map_err(Error::from))
            .collect()
    }
}
