//! File-backed credential records.
//!
//! One `{salt, hash}` record per username, Argon2id-derived, stored as
//! JSON in `credentials.json` under the security directory. Records
//! are overwritten on re-registration. Verification recomputes the
//! derivation with the stored salt and compares digests in constant
//! time; a mismatch is a boolean `false`, never an error.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::crypto::{self, CREDENTIAL_HASH_LEN, SALT_LEN};
use crate::error::{Result, SecurityError};
use crate::storage;

const STORE_FILE: &str = "credentials.json";

/// Salt fed to the derivation for unknown usernames, so a lookup miss
/// costs the same as a wrong password.
const BURN_SALT: [u8; SALT_LEN] = [0u8; SALT_LEN];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// 16-byte salt, hex.
    pub salt: String,
    /// 32-byte Argon2id digest, hex.
    pub hash: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialDocument {
    #[serde(default)]
    users: HashMap<String, CredentialRecord>,
    #[serde(default = "default_version")]
    version: u32,
}

fn default_version() -> u32 {
    1
}

pub struct CredentialStore {
    path: PathBuf,
    users: RwLock<HashMap<String, CredentialRecord>>,
}

impl CredentialStore {
    /// Load the store document if one exists; otherwise start empty.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(STORE_FILE);
        let users = if path.exists() {
            let bytes = fs::read(&path)
                .map_err(|e| SecurityError::Storage(format!("read credential store: {e}")))?;
            let doc: CredentialDocument = serde_json::from_slice(&bytes)
                .map_err(|e| SecurityError::Storage(format!("parse credential store: {e}")))?;
            doc.users
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    /// Derive and persist a record for `username`, overwriting any
    /// existing one.
    pub fn store(&self, username: &str, password: &str) -> Result<()> {
        let salt = crypto::generate_salt();
        let hash = crypto::derive_credential_hash(password, &salt)?;
        let record = CredentialRecord {
            salt: hex::encode(salt),
            hash: hex::encode(&*hash),
        };

        let mut users = self.users.write();
        users.insert(username.to_string(), record);
        self.persist(&users)?;
        tracing::debug!(username, "credential stored");
        Ok(())
    }

    /// True iff `password` matches the stored record for `username`.
    /// Unknown users and wrong passwords are both `false`; neither is
    /// distinguishable by error kind, and both pay one derivation.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        let record = self.users.read().get(username).cloned();
        let Some(record) = record else {
            let _ = crypto::derive_credential_hash(password, &BURN_SALT);
            return false;
        };

        let Ok(salt) = hex::decode(&record.salt) else {
            return false;
        };
        let Ok(expected) = hex::decode(&record.hash) else {
            return false;
        };
        if salt.len() != SALT_LEN || expected.len() != CREDENTIAL_HASH_LEN {
            return false;
        }

        match crypto::derive_credential_hash(password, &salt) {
            Ok(derived) => crypto::constant_time_eq(&*derived, &expected),
            Err(_) => false,
        }
    }

    fn persist(&self, users: &HashMap<String, CredentialRecord>) -> Result<()> {
        let doc = CredentialDocument {
            users: users.clone(),
            version: default_version(),
        };
        let bytes = serde_json::to_vec(&doc)?;
        storage::write_atomic(&self.path, &bytes)
            .map_err(|e| SecurityError::Storage(format!("write credential store: {e}")))
    }
}
