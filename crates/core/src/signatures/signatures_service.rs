use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{error, info};
use uuid::Uuid;

use super::{
    EncryptedSignature, Signature, SignatureInput, SignatureRepositoryTrait, SignatureServiceTrait,
};
use crate::errors::{Error, Result, SignatureError};
use crate::security::crypto::{decrypt, derive_key, encrypt};
use crate::security::RootKey;
use crate::sync::{NewSyncQueueItem, OfflineSyncServiceTrait, SyncItemType};

const SIGNATURE_KEY_PURPOSE: &str = "signatures";
pub const SIGNATURE_KEY_VERSION: u32 = 1;

pub struct SignatureService {
    repository: Arc<dyn SignatureRepositoryTrait>,
    sync_service: Arc<dyn OfflineSyncServiceTrait>,
    data_key: [u8; 32],
}

impl SignatureService {
    pub fn new(
        repository: Arc<dyn SignatureRepositoryTrait>,
        sync_service: Arc<dyn OfflineSyncServiceTrait>,
        root_key: &RootKey,
    ) -> Result<Self> {
        Ok(Self {
            repository,
            sync_service,
            data_key: derive_key(root_key, SIGNATURE_KEY_PURPOSE, SIGNATURE_KEY_VERSION)?,
        })
    }

    async fn seal_and_store(&self, input: SignatureInput) -> Result<String> {
        let data = input
            .signature_data
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| Error::invalid_input("signature_data is required"))?;

        let signature = EncryptedSignature {
            id: Uuid::now_v7().to_string(),
            signer_id: input.signer_id,
            signer_name: input.signer_name,
            reference_id: input.reference_id,
            encrypted_data: encrypt(&self.data_key, &data)?,
            key_version: SIGNATURE_KEY_VERSION as i32,
            created_at: Utc::now(),
        };
        let item = NewSyncQueueItem::new(SyncItemType::Signature, serde_json::to_value(&signature)?);
        let stored = self.repository.insert_signature(signature, item).await?;
        Ok(stored.id)
    }
}

#[async_trait]
impl SignatureServiceTrait for SignatureService {
    async fn store_signature(&self, input: SignatureInput) -> Result<String> {
        let signer_id = input.signer_id.clone();
        match self.seal_and_store(input).await {
            Ok(id) => {
                info!("Stored signature {} for signer {}", id, signer_id);
                self.sync_service.notify_enqueued();
                Ok(id)
            }
            Err(err) => {
                error!("Failed to store signature for signer {}: {}", signer_id, err);
                Err(SignatureError::StoreFailed.into())
            }
        }
    }

    fn get_signature(&self, signature_id: &str) -> Result<Signature> {
        let stored = self
            .repository
            .get_signature(signature_id)?
            .ok_or(SignatureError::NotFound)?;
        if stored.key_version != SIGNATURE_KEY_VERSION as i32 {
            return Err(SignatureError::Corrupted(format!(
                "unsupported key version {}",
                stored.key_version
            ))
            .into());
        }
        let signature_data = decrypt(&self.data_key, &stored.encrypted_data)
            .map_err(|e| SignatureError::Corrupted(e.to_string()))?;
        Ok(Signature {
            id: stored.id,
            signer_id: stored.signer_id,
            signer_name: stored.signer_name,
            reference_id: stored.reference_id,
            signature_data,
            created_at: stored.created_at,
        })
    }
}
