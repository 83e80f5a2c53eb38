use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use carehome_core::signatures::EncryptedSignature;
use carehome_core::utils::time_utils::{parse_db_timestamp, to_db_timestamp};
use carehome_core::Result;

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::signatures)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SignatureDB {
    pub id: String,
    pub signer_id: String,
    pub signer_name: String,
    pub reference_id: Option<String>,
    pub encrypted_data: String,
    pub key_version: i32,
    pub created_at: String,
}

impl SignatureDB {
    pub fn from_domain(signature: &EncryptedSignature) -> Self {
        Self {
            id: signature.id.clone(),
            signer_id: signature.signer_id.clone(),
            signer_name: signature.signer_name.clone(),
            reference_id: signature.reference_id.clone(),
            encrypted_data: signature.encrypted_data.clone(),
            key_version: signature.key_version,
            created_at: to_db_timestamp(&signature.created_at),
        }
    }

    pub fn into_domain(self) -> Result<EncryptedSignature> {
        Ok(EncryptedSignature {
            id: self.id,
            signer_id: self.signer_id,
            signer_name: self.signer_name,
            reference_id: self.reference_id,
            encrypted_data: self.encrypted_data,
            key_version: self.key_version,
            created_at: parse_db_timestamp(&self.created_at)?,
        })
    }
}
