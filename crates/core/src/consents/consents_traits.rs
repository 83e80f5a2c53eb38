use async_trait::async_trait;

use super::{Consent, ConsentWithdrawal, NewConsent};
use crate::errors::Result;
use crate::sync::NewSyncQueueItem;

/// Writes a consent together with its sync queue item in one transaction.
#[async_trait]
pub trait ConsentRepositoryTrait: Send + Sync {
    fn get_consent(&self, consent_id: &str) -> Result<Option<Consent>>;

    fn list_consents_for_resident(&self, resident_id: &str) -> Result<Vec<Consent>>;

    async fn insert_consent(&self, consent: Consent, sync_item: NewSyncQueueItem)
        -> Result<Consent>;

    async fn update_consent(&self, consent: Consent, sync_item: NewSyncQueueItem)
        -> Result<Consent>;
}

#[async_trait]
pub trait ConsentServiceTrait: Send + Sync {
    fn get_consent(&self, consent_id: &str) -> Result<Consent>;

    fn list_consents_for_resident(&self, resident_id: &str) -> Result<Vec<Consent>>;

    async fn record_consent(&self, new_consent: NewConsent) -> Result<Consent>;

    async fn withdraw_consent(
        &self,
        consent_id: &str,
        withdrawal: ConsentWithdrawal,
    ) -> Result<Consent>;
}
