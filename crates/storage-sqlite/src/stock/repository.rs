use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;

use carehome_core::errors::{MedicationError, MedicationErrorCode};
use carehome_core::stock::{StockLevel, StockRepositoryTrait};
use carehome_core::Result;

use super::model::StockLevelDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::stock_levels;

pub struct StockRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl StockRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        StockRepository { pool, writer }
    }
}

fn upsert(conn: &mut SqliteConnection, row: &StockLevelDB) -> Result<StockLevelDB> {
    Ok(diesel::insert_into(stock_levels::table)
        .values(row)
        .on_conflict(stock_levels::medication_id)
        .do_update()
        .set(row)
        .returning(StockLevelDB::as_returning())
        .get_result(conn)
        .map_err(StorageError::from)?)
}

/// Reads the current level (or a zero level) and writes back the result of
/// `apply` on the same connection. Only call from inside a writer job.
fn modify_level<F>(conn: &mut SqliteConnection, medication_id: &str, apply: F) -> Result<StockLevel>
where
    F: FnOnce(&mut StockLevel) -> Result<()>,
{
    let mut level = stock_levels::table
        .find(medication_id)
        .first::<StockLevelDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .map(StockLevelDB::into_domain)
        .transpose()?
        .unwrap_or_else(|| StockLevel::new(medication_id));
    apply(&mut level)?;
    level.updated_at = Utc::now();
    upsert(conn, &StockLevelDB::from_domain(&level))?.into_domain()
}

#[async_trait]
impl StockRepositoryTrait for StockRepository {
    fn get_stock_level(&self, medication_id: &str) -> Result<Option<StockLevel>> {
        let mut conn = get_connection(&self.pool)?;
        stock_levels::table
            .find(medication_id)
            .first::<StockLevelDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(StockLevelDB::into_domain)
            .transpose()
    }

    fn list_stock_levels(&self) -> Result<Vec<StockLevel>> {
        let mut conn = get_connection(&self.pool)?;
        stock_levels::table
            .order(stock_levels::medication_id.asc())
            .load::<StockLevelDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(StockLevelDB::into_domain)
            .collect()
    }

    async fn receive_quantity(
        &self,
        medication_id: &str,
        quantity: Decimal,
        expiry_date: Option<NaiveDate>,
    ) -> Result<StockLevel> {
        let medication_id = medication_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<StockLevel> {
                modify_level(conn, &medication_id, |level| {
                    level.quantity += quantity;
                    if expiry_date.is_some() {
                        level.expiry_date = expiry_date;
                    }
                    Ok(())
                })
            })
            .await
    }

    async fn update_thresholds(
        &self,
        medication_id: &str,
        reorder_threshold: Decimal,
        critical_threshold: Decimal,
    ) -> Result<StockLevel> {
        let medication_id = medication_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<StockLevel> {
                modify_level(conn, &medication_id, |level| {
                    level.reorder_threshold = reorder_threshold;
                    level.critical_threshold = critical_threshold;
                    Ok(())
                })
            })
            .await
    }

    async fn adjust_quantity(&self, medication_id: &str, delta: Decimal) -> Result<StockLevel> {
        let medication_id = medication_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<StockLevel> {
                let level = modify_level(conn, &medication_id, |level| {
                    let next = level.quantity + delta;
                    if next < Decimal::ZERO {
                        return Err(MedicationError::new(
                            MedicationErrorCode::InsufficientStock,
                            format!(
                                "Cannot remove {} of {}: {} on hand",
                                -delta, level.medication_id, level.quantity
                            ),
                        )
                        .into());
                    }
                    level.quantity = next;
                    Ok(())
                })?;
                debug!("Stock for {} adjusted by {}", medication_id, delta);
                Ok(level)
            })
            .await
    }
}
