use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use super::{hash_pin, verify_pin};
use crate::errors::Result;

#[async_trait]
pub trait StaffCredentialRepositoryTrait: Send + Sync {
    fn get_pin_hash(&self, staff_id: &str) -> Result<Option<String>>;

    async fn set_pin_hash(&self, staff_id: &str, pin_hash: String) -> Result<()>;
}

#[async_trait]
pub trait StaffPinServiceTrait: Send + Sync {
    async fn set_pin(&self, staff_id: &str, pin: &str) -> Result<()>;

    /// `false` for a wrong PIN or a staff member without a PIN on file.
    async fn verify(&self, staff_id: &str, pin: &str) -> Result<bool>;
}

pub struct StaffPinService {
    repository: Arc<dyn StaffCredentialRepositoryTrait>,
}

impl StaffPinService {
    pub fn new(repository: Arc<dyn StaffCredentialRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl StaffPinServiceTrait for StaffPinService {
    async fn set_pin(&self, staff_id: &str, pin: &str) -> Result<()> {
        let pin = pin.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_pin(&pin))
            .await
            .map_err(|e| crate::Error::Unexpected(format!("PIN hashing task failed: {}", e)))??;
        self.repository.set_pin_hash(staff_id, hash).await
    }

    async fn verify(&self, staff_id: &str, pin: &str) -> Result<bool> {
        let Some(stored) = self.repository.get_pin_hash(staff_id)? else {
            warn!("PIN verification requested for staff {} with no PIN on file", staff_id);
            return Ok(false);
        };
        let pin = pin.to_string();
        tokio::task::spawn_blocking(move || verify_pin(&pin, &stored))
            .await
            .map_err(|e| crate::Error::Unexpected(format!("PIN verification task failed: {}", e)))?
    }
}
