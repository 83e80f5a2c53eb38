use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{StockAlert, StockLevel};
use crate::errors::Result;

#[async_trait]
pub trait StockRepositoryTrait: Send + Sync {
    fn get_stock_level(&self, medication_id: &str) -> Result<Option<StockLevel>>;

    fn list_stock_levels(&self) -> Result<Vec<StockLevel>>;

    /// Atomically adds a delivery and, when given, replaces the expiry date.
    async fn receive_quantity(
        &self,
        medication_id: &str,
        quantity: Decimal,
        expiry_date: Option<NaiveDate>,
    ) -> Result<StockLevel>;

    /// Replaces only the threshold columns.
    async fn update_thresholds(
        &self,
        medication_id: &str,
        reorder_threshold: Decimal,
        critical_threshold: Decimal,
    ) -> Result<StockLevel>;

    /// Atomically adds `delta` (negative to consume). Fails with
    /// `INSUFFICIENT_STOCK` rather than going below zero.
    async fn adjust_quantity(&self, medication_id: &str, delta: Decimal) -> Result<StockLevel>;
}

#[async_trait]
pub trait StockServiceTrait: Send + Sync {
    fn get_stock_level(&self, medication_id: &str) -> Result<StockLevel>;

    /// `true` when at least `quantity` is on hand.
    fn check_availability(&self, medication_id: &str, quantity: Decimal) -> Result<bool>;

    async fn receive_stock(
        &self,
        medication_id: &str,
        quantity: Decimal,
        expiry_date: Option<NaiveDate>,
    ) -> Result<StockLevel>;

    async fn set_thresholds(
        &self,
        medication_id: &str,
        reorder_threshold: Decimal,
        critical_threshold: Decimal,
    ) -> Result<StockLevel>;

    async fn consume(&self, medication_id: &str, quantity: Decimal) -> Result<StockLevel>;

    fn list_alerts(&self, today: NaiveDate) -> Result<Vec<StockAlert>>;
}
