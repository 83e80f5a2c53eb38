use async_trait::async_trait;

use super::{NewResident, Resident};
use crate::errors::Result;

#[async_trait]
pub trait ResidentRepositoryTrait: Send + Sync {
    fn get_resident(&self, resident_id: &str) -> Result<Option<Resident>>;

    async fn insert_resident(&self, new_resident: NewResident) -> Result<Resident>;

    async fn update_resident(&self, resident: Resident) -> Result<Resident>;
}
