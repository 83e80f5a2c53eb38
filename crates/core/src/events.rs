//! Domain events emitted after mutations.
//!
//! Services publish events through a [`DomainEventSink`]; runtimes decide what
//! to do with them (log, fan out to listeners, trigger follow-up work).

use serde::{Deserialize, Serialize};

use crate::medications::AdministrationStatus;
use crate::stock::StockAlert;
use crate::sync::{SyncItemType, SyncPassResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    MedicationAdministered {
        record_id: String,
        resident_id: String,
        medication_id: String,
        status: AdministrationStatus,
    },
    SafetyWarning {
        resident_id: String,
        medication_id: String,
        message: String,
    },
    StockAlertRaised {
        alert: StockAlert,
    },
    SyncItemSynced {
        item_id: String,
        item_type: SyncItemType,
    },
    SyncItemFailed {
        item_id: String,
        item_type: SyncItemType,
        retry_count: i32,
        error: String,
        exhausted: bool,
    },
    SyncPassCompleted {
        result: SyncPassResult,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MedicationAdministered { .. } => "medication_administered",
            Self::SafetyWarning { .. } => "safety_warning",
            Self::StockAlertRaised { .. } => "stock_alert_raised",
            Self::SyncItemSynced { .. } => "sync_item_synced",
            Self::SyncItemFailed { .. } => "sync_item_failed",
            Self::SyncPassCompleted { .. } => "sync_pass_completed",
        }
    }
}

pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);

    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Sink that drops every event. Default for services built without a runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}
