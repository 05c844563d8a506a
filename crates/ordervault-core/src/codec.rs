//! Sealed secret payloads.
//!
//! Wire format is a hex triple `{iv, authTag, data}`: 12-byte IV,
//! 16-byte tag, ciphertext. A payload decrypts only under the exact
//! machine key that produced it; the tag check runs before any
//! plaintext is released.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::crypto::{self, IV_LEN, TAG_LEN};
use crate::error::{Result, SecurityError};
use crate::keystore::KeyStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedSecret {
    pub iv: String,
    pub auth_tag: String,
    pub data: String,
}

pub struct SecretCodec {
    keys: Arc<KeyStore>,
}

impl SecretCodec {
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys }
    }

    /// Seal a secret string under the machine key with a fresh random IV.
    pub fn encrypt(&self, plaintext: &str) -> Result<SealedSecret> {
        let key = self.keys.machine_key()?;
        let iv = crypto::generate_iv();
        let sealed = crypto::seal(&*key, &iv, plaintext.as_bytes())?;
        let (data, tag) = sealed.split_at(sealed.len() - TAG_LEN);
        Ok(SealedSecret {
            iv: hex::encode(iv),
            auth_tag: hex::encode(tag),
            data: hex::encode(data),
        })
    }

    /// Open a sealed payload. Malformed hex or wrong field lengths are
    /// `Format` errors; any tag or key mismatch is `Authentication`.
    pub fn decrypt(&self, payload: &SealedSecret) -> Result<String> {
        let iv = decode_fixed("iv", &payload.iv, IV_LEN)?;
        let tag = decode_fixed("authTag", &payload.auth_tag, TAG_LEN)?;
        let mut buf = hex::decode(&payload.data)
            .map_err(|_| SecurityError::Format("data field is not valid hex".into()))?;
        buf.extend_from_slice(&tag);

        let iv: [u8; IV_LEN] = iv.try_into().expect("length checked above");
        let key = self.keys.machine_key()?;
        let plaintext = crypto::open(&*key, &iv, &buf)?;
        String::from_utf8(plaintext.to_vec())
            .map_err(|_| SecurityError::Format("plaintext is not valid UTF-8".into()))
    }
}

fn decode_fixed(field: &str, value: &str, expected_len: usize) -> Result<Vec<u8>> {
    let bytes = hex::decode(value)
        .map_err(|_| SecurityError::Format(format!("{field} field is not valid hex")))?;
    if bytes.len() != expected_len {
        return Err(SecurityError::Format(format!(
            "{field} field has wrong length"
        )));
    }
    Ok(bytes)
}
