use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use carehome_core::consents::Consent;
use carehome_core::utils::time_utils::{
    parse_db_timestamp, parse_optional_db_timestamp, to_db_timestamp,
};
use carehome_core::Result;

use crate::utils::{enum_from_db, enum_to_db};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::consents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ConsentDB {
    pub id: String,
    pub resident_id: String,
    pub consent_type: String,
    pub granted_by: String,
    pub status: String,
    pub signature_id: Option<String>,
    pub notes: Option<String>,
    pub granted_at: String,
    pub withdrawn_at: Option<String>,
    pub withdrawn_by: Option<String>,
    pub withdrawal_reason: Option<String>,
    pub updated_at: String,
}

impl ConsentDB {
    pub fn from_domain(consent: &Consent) -> Result<Self> {
        Ok(Self {
            id: consent.id.clone(),
            resident_id: consent.resident_id.clone(),
            consent_type: consent.consent_type.clone(),
            granted_by: consent.granted_by.clone(),
            status: enum_to_db(&consent.status)?,
            signature_id: consent.signature_id.clone(),
            notes: consent.notes.clone(),
            granted_at: to_db_timestamp(&consent.granted_at),
            withdrawn_at: consent.withdrawn_at.as_ref().map(to_db_timestamp),
            withdrawn_by: consent.withdrawn_by.clone(),
            withdrawal_reason: consent.withdrawal_reason.clone(),
            updated_at: to_db_timestamp(&consent.updated_at),
        })
    }

    pub fn into_domain(self) -> Result<Consent> {
        Ok(Consent {
            id: self.id,
            resident_id: self.resident_id,
            consent_type: self.consent_type,
            granted_by: self.granted_by,
            status: enum_from_db(&self.status)?,
            signature_id: self.signature_id,
            notes: self.notes,
            granted_at: parse_db_timestamp(&self.granted_at)?,
            withdrawn_at: parse_optional_db_timestamp(self.withdrawn_at.as_deref())?,
            withdrawn_by: self.withdrawn_by,
            withdrawal_reason: self.withdrawal_reason,
            updated_at: parse_db_timestamp(&self.updated_at)?,
        })
    }
}
