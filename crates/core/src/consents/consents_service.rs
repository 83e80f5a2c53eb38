use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use uuid::Uuid;

use super::{
    Consent, ConsentRepositoryTrait, ConsentServiceTrait, ConsentStatus, ConsentWithdrawal,
    NewConsent,
};
use crate::errors::{Error, Result};
use crate::sync::{NewSyncQueueItem, OfflineSyncServiceTrait, SyncItemType};

pub struct ConsentService {
    repository: Arc<dyn ConsentRepositoryTrait>,
    sync_service: Arc<dyn OfflineSyncServiceTrait>,
}

impl ConsentService {
    pub fn new(
        repository: Arc<dyn ConsentRepositoryTrait>,
        sync_service: Arc<dyn OfflineSyncServiceTrait>,
    ) -> Self {
        Self {
            repository,
            sync_service,
        }
    }
}

fn sync_item(item_type: SyncItemType, consent: &Consent) -> Result<NewSyncQueueItem> {
    Ok(NewSyncQueueItem::new(
        item_type,
        serde_json::to_value(consent)?,
    ))
}

#[async_trait]
impl ConsentServiceTrait for ConsentService {
    fn get_consent(&self, consent_id: &str) -> Result<Consent> {
        self.repository
            .get_consent(consent_id)?
            .ok_or_else(|| Error::not_found(format!("consent {}", consent_id)))
    }

    fn list_consents_for_resident(&self, resident_id: &str) -> Result<Vec<Consent>> {
        self.repository.list_consents_for_resident(resident_id)
    }

    async fn record_consent(&self, new_consent: NewConsent) -> Result<Consent> {
        if new_consent.consent_type.trim().is_empty() {
            return Err(Error::invalid_input("Consent type is required"));
        }
        if new_consent.granted_by.trim().is_empty() {
            return Err(Error::invalid_input("Consent must name who granted it"));
        }
        let now = Utc::now();
        let consent = Consent {
            id: Uuid::now_v7().to_string(),
            resident_id: new_consent.resident_id,
            consent_type: new_consent.consent_type,
            granted_by: new_consent.granted_by,
            status: ConsentStatus::Granted,
            signature_id: new_consent.signature_id,
            notes: new_consent.notes,
            granted_at: now,
            withdrawn_at: None,
            withdrawn_by: None,
            withdrawal_reason: None,
            updated_at: now,
        };
        let item = sync_item(SyncItemType::Consent, &consent)?;
        let consent = self.repository.insert_consent(consent, item).await?;
        info!(
            "Recorded {} consent {} for resident {}",
            consent.consent_type, consent.id, consent.resident_id
        );
        self.sync_service.notify_enqueued();
        Ok(consent)
    }

    async fn withdraw_consent(
        &self,
        consent_id: &str,
        withdrawal: ConsentWithdrawal,
    ) -> Result<Consent> {
        if withdrawal.withdrawn_by.trim().is_empty() {
            return Err(Error::invalid_input("Withdrawal must name who withdrew consent"));
        }
        let mut consent = self.get_consent(consent_id)?;
        if consent.status == ConsentStatus::Withdrawn {
            return Err(Error::invalid_input(format!(
                "Consent {} is already withdrawn",
                consent_id
            )));
        }
        let now = Utc::now();
        consent.status = ConsentStatus::Withdrawn;
        consent.withdrawn_at = Some(now);
        consent.withdrawn_by = Some(withdrawal.withdrawn_by);
        consent.withdrawal_reason = withdrawal.reason;
        consent.updated_at = now;

        let item = sync_item(SyncItemType::Withdrawal, &consent)?;
        let consent = self.repository.update_consent(consent, item).await?;
        info!("Consent {} withdrawn", consent.id);
        self.sync_service.notify_enqueued();
        Ok(consent)
    }
}
