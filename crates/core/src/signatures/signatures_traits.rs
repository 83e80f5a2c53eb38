use async_trait::async_trait;

use super::{EncryptedSignature, Signature, SignatureInput};
use crate::errors::Result;
use crate::sync::NewSyncQueueItem;

#[async_trait]
pub trait SignatureRepositoryTrait: Send + Sync {
    fn get_signature(&self, signature_id: &str) -> Result<Option<EncryptedSignature>>;

    /// Persists the signature and its sync queue item atomically.
    async fn insert_signature(
        &self,
        signature: EncryptedSignature,
        sync_item: NewSyncQueueItem,
    ) -> Result<EncryptedSignature>;
}

#[async_trait]
pub trait SignatureServiceTrait: Send + Sync {
    /// Returns the new signature id.
    async fn store_signature(&self, input: SignatureInput) -> Result<String>;

    fn get_signature(&self, signature_id: &str) -> Result<Signature>;
}
