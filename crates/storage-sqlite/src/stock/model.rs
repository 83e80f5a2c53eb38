use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use carehome_core::stock::StockLevel;
use carehome_core::utils::time_utils::{parse_db_timestamp, to_db_timestamp};
use carehome_core::Result;

use crate::errors::StorageError;
use crate::utils::{decimal_from_db, decimal_to_db};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::stock_levels)]
#[diesel(primary_key(medication_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct StockLevelDB {
    pub medication_id: String,
    pub quantity: String,
    pub reorder_threshold: String,
    pub critical_threshold: String,
    pub expiry_date: Option<String>,
    pub updated_at: String,
}

impl StockLevelDB {
    pub fn from_domain(level: &StockLevel) -> Self {
        Self {
            medication_id: level.medication_id.clone(),
            quantity: decimal_to_db(level.quantity),
            reorder_threshold: decimal_to_db(level.reorder_threshold),
            critical_threshold: decimal_to_db(level.critical_threshold),
            expiry_date: level.expiry_date.map(|d| d.format(DATE_FORMAT).to_string()),
            updated_at: to_db_timestamp(&level.updated_at),
        }
    }

    pub fn into_domain(self) -> Result<StockLevel> {
        let expiry_date = self
            .expiry_date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d, DATE_FORMAT).map_err(|e| {
                    StorageError::InvalidValue(format!("'{}' is not a date: {}", d, e))
                })
            })
            .transpose()?;
        Ok(StockLevel {
            medication_id: self.medication_id,
            quantity: decimal_from_db(&self.quantity)?,
            reorder_threshold: decimal_from_db(&self.reorder_threshold)?,
            critical_threshold: decimal_from_db(&self.critical_threshold)?,
            expiry_date,
            updated_at: parse_db_timestamp(&self.updated_at)?,
        })
    }
}
