//! Authenticated encryption for sensitive records stored at rest.
//!
//! Keys are derived from a root key with HKDF-SHA256 per purpose; payloads are
//! sealed with ChaCha20-Poly1305 and encoded as base64(nonce || ciphertext).

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use crate::errors::{Error, Result};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Root secret from configuration. Never printed.
#[derive(Clone)]
pub struct RootKey([u8; KEY_LEN]);

impl RootKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| Error::Security(format!("root key is not valid base64: {}", e)))?;
        let bytes: [u8; KEY_LEN] = decoded.try_into().map_err(|v: Vec<u8>| {
            Error::Security(format!(
                "root key must be {} bytes, got {}",
                KEY_LEN,
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootKey(**redacted**)")
    }
}

/// Derives a purpose-bound data key, e.g. `("signatures", 1)`.
pub fn derive_key(root_key: &RootKey, purpose: &str, key_version: u32) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, root_key.as_bytes());
    let info = format!("carehome-{}-v{}", purpose, key_version);
    let mut key = [0u8; KEY_LEN];
    hk.expand(info.as_bytes(), &mut key)
        .map_err(|e| Error::Security(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}

pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &str) -> Result<String> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| Error::Security(format!("Cipher creation failed: {}", e)))?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|e| Error::Security(format!("Encryption failed: {}", e)))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(sealed))
}

pub fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<String> {
    let sealed = BASE64
        .decode(encoded)
        .map_err(|e| Error::Security(format!("Invalid ciphertext encoding: {}", e)))?;
    if sealed.len() <= NONCE_LEN {
        return Err(Error::Security("Ciphertext is too short".to_string()));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| Error::Security(format!("Cipher creation failed: {}", e)))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| Error::Security(format!("Decryption failed: {}", e)))?;
    String::from_utf8(plaintext)
        .map_err(|e| Error::Security(format!("Decrypted payload is not UTF-8: {}", e)))
}
