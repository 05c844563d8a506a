//! Validated-file registry.
//!
//! Paths the application marks as known/trusted, each with a SHA-256
//! content fingerprint. Used to detect unauthorized modification, not
//! to store secrets. Persisted as JSON in `registry.json` so tamper
//! checks survive restarts.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Result, SecurityError};
use crate::storage;

const REGISTRY_FILE: &str = "registry.json";

/// Buffer size for file hashing (64KB).
const HASH_BUFFER_SIZE: usize = 65536;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub sha256: String,
    pub size: u64,
}

pub struct FileRegistry {
    path: PathBuf,
    entries: RwLock<HashMap<PathBuf, FileFingerprint>>,
}

impl FileRegistry {
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(REGISTRY_FILE);
        let entries = if path.exists() {
            let bytes = fs::read(&path)
                .map_err(|e| SecurityError::Storage(format!("read file registry: {e}")))?;
            serde_json::from_slice(&bytes)
                .map_err(|e| SecurityError::Storage(format!("parse file registry: {e}")))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Fingerprint `file` and add it to the registry. Fails with a
    /// storage error if the file cannot be read.
    pub fn register(&self, file: &Path) -> Result<()> {
        let fingerprint = fingerprint_file(file)
            .map_err(|e| SecurityError::Storage(format!("fingerprint {}: {e}", file.display())))?;
        let mut entries = self.entries.write();
        entries.insert(file.to_path_buf(), fingerprint);
        self.persist(&entries)?;
        tracing::debug!(path = %file.display(), "file registered");
        Ok(())
    }

    /// True iff `file` is registered, still exists, and its content
    /// matches the registered fingerprint.
    pub fn validate(&self, file: &Path) -> bool {
        let Some(expected) = self.entries.read().get(file).cloned() else {
            return false;
        };
        match fingerprint_file(file) {
            Ok(actual) => actual == expected,
            Err(_) => false,
        }
    }

    /// Every registered path currently failing validation: missing,
    /// unreadable, or altered.
    pub fn validate_all(&self) -> Vec<PathBuf> {
        let entries = self.entries.read();
        let mut failing = Vec::new();
        for (path, expected) in entries.iter() {
            let ok = match fingerprint_file(path) {
                Ok(actual) => actual == *expected,
                Err(_) => false,
            };
            if !ok {
                failing.push(path.clone());
            }
        }
        failing.sort();
        failing
    }

    fn persist(&self, entries: &HashMap<PathBuf, FileFingerprint>) -> Result<()> {
        let bytes = serde_json::to_vec(entries)?;
        storage::write_atomic(&self.path, &bytes)
            .map_err(|e| SecurityError::Storage(format!("write file registry: {e}")))
    }
}

fn fingerprint_file(path: &Path) -> std::io::Result<FileFingerprint> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUFFER_SIZE];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        size += n as u64;
        hasher.update(&buffer[..n]);
    }
    Ok(FileFingerprint {
        sha256: hex::encode(hasher.finalize()),
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn altered_and_missing_files_fail_validation() {
        let dir = tempdir().unwrap();
        let registry = FileRegistry::open(dir.path()).unwrap();

        let doc = dir.path().join("invoice.pdf");
        fs::write(&doc, b"original invoice").unwrap();
        registry.register(&doc).unwrap();
        assert!(registry.validate(&doc));
        assert!(registry.validate_all().is_empty());

        fs::write(&doc, b"doctored invoice").unwrap();
        assert!(!registry.validate(&doc));
        assert_eq!(registry.validate_all(), vec![doc.clone()]);

        fs::remove_file(&doc).unwrap();
        assert!(!registry.validate(&doc));
        assert_eq!(registry.validate_all(), vec![doc]);
    }

    #[test]
    fn unregistered_paths_are_invalid() {
        let dir = tempdir().unwrap();
        let registry = FileRegistry::open(dir.path()).unwrap();
        assert!(!registry.validate(Path::new("/nonexistent")));
    }

    #[test]
    fn registry_survives_reopen() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("contract.txt");
        fs::write(&doc, b"terms").unwrap();

        FileRegistry::open(dir.path()).unwrap().register(&doc).unwrap();
        let reopened = FileRegistry::open(dir.path()).unwrap();
        assert!(reopened.validate(&doc));
    }
}
