use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;

use super::{
    StockAlert, StockAlertKind, StockLevel, StockRepositoryTrait, StockServiceTrait,
    EXPIRY_WARNING_DAYS,
};
use crate::errors::{Error, Result};

/// Alerts for one stock level: at most one quantity alert (the most severe)
/// plus at most one expiry alert.
pub fn evaluate_stock_alerts(level: &StockLevel, today: NaiveDate) -> Vec<StockAlert> {
    let mut alerts = Vec::new();
    let quantity = level.quantity;

    let quantity_alert = if quantity <= Decimal::ZERO {
        Some((StockAlertKind::OutOfStock, None, "Out of stock".to_string()))
    } else if quantity <= level.critical_threshold {
        Some((
            StockAlertKind::Critical,
            Some(level.critical_threshold),
            format!(
                "Critically low stock: {} remaining",
                quantity.normalize()
            ),
        ))
    } else if quantity <= level.reorder_threshold {
        Some((
            StockAlertKind::Reorder,
            Some(level.reorder_threshold),
            format!("Reorder required: {} remaining", quantity.normalize()),
        ))
    } else {
        None
    };

    if let Some((kind, threshold, message)) = quantity_alert {
        alerts.push(StockAlert {
            medication_id: level.medication_id.clone(),
            kind,
            quantity,
            threshold,
            expiry_date: level.expiry_date,
            message,
        });
    }

    if let Some(expiry) = level.expiry_date {
        let days_left = (expiry - today).num_days();
        let expiry_alert = if days_left < 0 {
            Some((StockAlertKind::Expired, format!("Stock expired on {}", expiry)))
        } else if days_left <= EXPIRY_WARNING_DAYS {
            Some((
                StockAlertKind::ExpiringSoon,
                format!("Stock expires in {} days ({})", days_left, expiry),
            ))
        } else {
            None
        };
        if let Some((kind, message)) = expiry_alert {
            alerts.push(StockAlert {
                medication_id: level.medication_id.clone(),
                kind,
                quantity,
                threshold: None,
                expiry_date: Some(expiry),
                message,
            });
        }
    }

    alerts
}

pub struct StockService {
    repository: Arc<dyn StockRepositoryTrait>,
}

impl StockService {
    pub fn new(repository: Arc<dyn StockRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl StockServiceTrait for StockService {
    fn get_stock_level(&self, medication_id: &str) -> Result<StockLevel> {
        self.repository
            .get_stock_level(medication_id)?
            .ok_or_else(|| Error::not_found(format!("stock level for {}", medication_id)))
    }

    fn check_availability(&self, medication_id: &str, quantity: Decimal) -> Result<bool> {
        Ok(self
            .repository
            .get_stock_level(medication_id)?
            .map(|level| level.quantity >= quantity)
            .unwrap_or(false))
    }

    async fn receive_stock(
        &self,
        medication_id: &str,
        quantity: Decimal,
        expiry_date: Option<NaiveDate>,
    ) -> Result<StockLevel> {
        if quantity <= Decimal::ZERO {
            return Err(Error::invalid_input("Received quantity must be positive"));
        }
        let level = self
            .repository
            .receive_quantity(medication_id, quantity, expiry_date)
            .await?;
        info!(
            "Received {} of medication {} (now {})",
            quantity, medication_id, level.quantity
        );
        Ok(level)
    }

    async fn set_thresholds(
        &self,
        medication_id: &str,
        reorder_threshold: Decimal,
        critical_threshold: Decimal,
    ) -> Result<StockLevel> {
        if reorder_threshold < Decimal::ZERO || critical_threshold < Decimal::ZERO {
            return Err(Error::invalid_input("Thresholds cannot be negative"));
        }
        if critical_threshold > reorder_threshold {
            return Err(Error::invalid_input(
                "Critical threshold cannot exceed the reorder threshold",
            ));
        }
        self.repository
            .update_thresholds(medication_id, reorder_threshold, critical_threshold)
            .await
    }

    async fn consume(&self, medication_id: &str, quantity: Decimal) -> Result<StockLevel> {
        if quantity <= Decimal::ZERO {
            return Err(Error::invalid_input("Consumed quantity must be positive"));
        }
        let level = self
            .repository
            .adjust_quantity(medication_id, -quantity)
            .await?;
        debug!(
            "Consumed {} of medication {} ({} left)",
            quantity, medication_id, level.quantity
        );
        Ok(level)
    }

    fn list_alerts(&self, today: NaiveDate) -> Result<Vec<StockAlert>> {
        Ok(self
            .repository
            .list_stock_levels()?
            .iter()
            .flat_map(|level| evaluate_stock_alerts(level, today))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MedicationErrorCode;
    use crate::test_support::InMemoryStockRepository;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    fn level(quantity: Decimal) -> StockLevel {
        StockLevel {
            medication_id: "med-1".to_string(),
            quantity,
            reorder_threshold: dec!(20),
            critical_threshold: dec!(5),
            expiry_date: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn quantity_alert_picks_most_severe() {
        let kinds = |q| {
            evaluate_stock_alerts(&level(q), today())
                .into_iter()
                .map(|a| a.kind)
                .collect::<Vec<_>>()
        };
        assert!(kinds(dec!(21)).is_empty());
        assert_eq!(kinds(dec!(20)), vec![StockAlertKind::Reorder]);
        assert_eq!(kinds(dec!(5)), vec![StockAlertKind::Critical]);
        assert_eq!(kinds(dec!(0)), vec![StockAlertKind::OutOfStock]);
    }

    #[test]
    fn expiry_alerts() {
        let mut soon = level(dec!(100));
        soon.expiry_date = NaiveDate::from_ymd_opt(2026, 5, 20);
        let alerts = evaluate_stock_alerts(&soon, today());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, StockAlertKind::ExpiringSoon);

        let mut expired = level(dec!(100));
        expired.expiry_date = NaiveDate::from_ymd_opt(2026, 5, 3);
        assert_eq!(
            evaluate_stock_alerts(&expired, today())[0].kind,
            StockAlertKind::Expired
        );
    }

    #[tokio::test]
    async fn receive_then_consume_never_goes_negative() {
        let service = StockService::new(Arc::new(InMemoryStockRepository::default()));
        service
            .receive_stock("med-1", dec!(10), None)
            .await
            .expect("receive");
        let after = service.consume("med-1", dec!(4)).await.expect("consume");
        assert_eq!(after.quantity, dec!(6));

        let err = service
            .consume("med-1", dec!(7))
            .await
            .expect_err("cannot overdraw");
        assert_eq!(
            err.medication_code(),
            Some(MedicationErrorCode::InsufficientStock)
        );
        assert_eq!(
            service.get_stock_level("med-1").expect("level").quantity,
            dec!(6)
        );
        assert!(service.check_availability("med-1", dec!(6)).expect("check"));
        assert!(!service.check_availability("med-2", dec!(1)).expect("check"));
    }

    #[tokio::test]
    async fn thresholds_are_validated() {
        let service = StockService::new(Arc::new(InMemoryStockRepository::default()));
        assert!(service
            .set_thresholds("med-1", dec!(5), dec!(10))
            .await
            .is_err());
        let level = service
            .set_thresholds("med-1", dec!(10), dec!(5))
            .await
            .expect("thresholds");
        assert_eq!(level.quantity, dec!(0));
        assert_eq!(service.list_alerts(today()).expect("alerts").len(), 1);
    }
}
