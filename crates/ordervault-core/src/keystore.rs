//! Per-installation machine key.
//!
//! One 256-bit key per security directory, stored as hex text in
//! `machine.key` with owner-only permissions. Created lazily on the
//! first encryption or decryption call; never rotated. Deleting the
//! key file invalidates every payload sealed under it.

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{self, MACHINE_KEY_LEN};
use crate::error::{Result, SecurityError};
use crate::storage;

const KEY_FILE: &str = "machine.key";

pub struct KeyStore {
    dir: PathBuf,
    cached: RwLock<Option<Zeroizing<[u8; MACHINE_KEY_LEN]>>>,
}

impl KeyStore {
    /// Idempotent setup: ensures the security directory exists.
    pub fn initialize(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| SecurityError::Storage(format!("create security dir: {e}")))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            cached: RwLock::new(None),
        })
    }

    /// Return the machine key, generating and persisting it on first
    /// use. Subsequent calls serve a cached copy.
    pub fn machine_key(&self) -> Result<Zeroizing<[u8; MACHINE_KEY_LEN]>> {
        if let Some(key) = self.cached.read().as_ref() {
            return Ok(key.clone());
        }
        let mut guard = self.cached.write();
        // Another caller may have filled the cache while we waited.
        if let Some(key) = guard.as_ref() {
            return Ok(key.clone());
        }
        let key = self.load_or_create()?;
        *guard = Some(key.clone());
        Ok(key)
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    fn load_or_create(&self) -> Result<Zeroizing<[u8; MACHINE_KEY_LEN]>> {
        let path = self.key_path();
        if path.exists() {
            self.load(&path)
        } else {
            let key = crypto::generate_machine_key();
            storage::write_atomic(&path, hex::encode(&*key).as_bytes())
                .map_err(|e| SecurityError::Storage(format!("write key file: {e}")))?;
            tracing::info!("generated new machine key");
            Ok(key)
        }
    }

    fn load(&self, path: &Path) -> Result<Zeroizing<[u8; MACHINE_KEY_LEN]>> {
        let text = fs::read_to_string(path)
            .map_err(|e| SecurityError::Storage(format!("read key file: {e}")))?;
        let mut bytes = hex::decode(text.trim())
            .map_err(|_| SecurityError::Storage("key file is not valid hex".into()))?;
        if bytes.len() != MACHINE_KEY_LEN {
            bytes.zeroize();
            return Err(SecurityError::Storage("key file has wrong length".into()));
        }
        let mut key = Zeroizing::new([0u8; MACHINE_KEY_LEN]);
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn key_is_created_lazily_and_persisted() {
        let dir = tempdir().unwrap();
        let store = KeyStore::initialize(dir.path()).unwrap();
        assert!(!store.key_path().exists());

        let key1 = store.machine_key().unwrap();
        assert!(store.key_path().exists());

        // A fresh handle over the same directory loads the same key.
        let store2 = KeyStore::initialize(dir.path()).unwrap();
        let key2 = store2.machine_key().unwrap();
        assert_eq!(&*key1, &*key2);
    }

    #[test]
    fn corrupt_key_file_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let store = KeyStore::initialize(dir.path()).unwrap();
        fs::write(store.key_path(), "not hex at all").unwrap();
        assert!(matches!(
            store.machine_key(),
            Err(SecurityError::Storage(_))
        ));
    }

    #[test]
    fn truncated_key_file_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let store = KeyStore::initialize(dir.path()).unwrap();
        fs::write(store.key_path(), hex::encode([0u8; 16])).unwrap();
        assert!(matches!(
            store.machine_key(),
            Err(SecurityError::Storage(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let store = KeyStore::initialize(dir.path()).unwrap();
        store.machine_key().unwrap();
        let mode = fs::metadata(store.key_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
