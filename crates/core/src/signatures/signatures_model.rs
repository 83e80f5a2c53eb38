use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signature as captured on a device. `signature_data` is typically a data
/// URL of the drawn stroke image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInput {
    pub signer_id: String,
    pub signer_name: String,
    /// Record the signature attests to, e.g. a consent id.
    pub reference_id: Option<String>,
    pub signature_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: String,
    pub signer_id: String,
    pub signer_name: String,
    pub reference_id: Option<String>,
    pub signature_data: String,
    pub created_at: DateTime<Utc>,
}

/// Stored form; `encrypted_data` is base64(nonce || ciphertext).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedSignature {
    pub id: String,
    pub signer_id: String,
    pub signer_name: String,
    pub reference_id: Option<String>,
    pub encrypted_data: String,
    pub key_version: i32,
    pub created_at: DateTime<Utc>,
}
