use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Days before expiry at which an `ExpiringSoon` alert is raised.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub medication_id: String,
    pub quantity: Decimal,
    pub reorder_threshold: Decimal,
    pub critical_threshold: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl StockLevel {
    pub fn new(medication_id: impl Into<String>) -> Self {
        Self {
            medication_id: medication_id.into(),
            quantity: Decimal::ZERO,
            reorder_threshold: Decimal::ZERO,
            critical_threshold: Decimal::ZERO,
            expiry_date: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockAlertKind {
    Reorder,
    Critical,
    OutOfStock,
    ExpiringSoon,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlert {
    pub medication_id: String,
    pub kind: StockAlertKind,
    pub quantity: Decimal,
    pub threshold: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
    pub message: String,
}
