//! The `SecretStore` facade.
//!
//! A single handle over the key store, secret codec, credential store,
//! session table and file registry, constructed once at startup with
//! the application's security directory and threaded through all
//! calls. Hosts that must represent "not yet initialised" hold an
//! `Option<SecretStore>` and map `None` to
//! [`SecurityError::NotInitialized`](crate::SecurityError::NotInitialized).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::{SealedSecret, SecretCodec};
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::keystore::KeyStore;
use crate::registry::FileRegistry;
use crate::session::SessionTable;

pub struct SecretStore {
    dir: PathBuf,
    codec: SecretCodec,
    credentials: CredentialStore,
    sessions: SessionTable,
    registry: FileRegistry,
}

impl SecretStore {
    /// Idempotent setup: ensures the security directory exists and
    /// loads the persisted stores. Failures here must block the host
    /// from any feature that touches secrets.
    pub fn initialize(security_dir: &Path) -> Result<Self> {
        let keys = Arc::new(KeyStore::initialize(security_dir)?);
        let codec = SecretCodec::new(Arc::clone(&keys));
        let credentials = CredentialStore::open(security_dir)?;
        let registry = FileRegistry::open(security_dir)?;
        tracing::info!(dir = %security_dir.display(), "secret store initialised");
        Ok(Self {
            dir: security_dir.to_path_buf(),
            codec,
            credentials,
            sessions: SessionTable::new(),
            registry,
        })
    }

    pub fn security_dir(&self) -> &Path {
        &self.dir
    }

    // ── Secrets ──────────────────────────────────────────────────────

    pub fn encrypt(&self, plaintext: &str) -> Result<SealedSecret> {
        self.codec.encrypt(plaintext)
    }

    pub fn decrypt(&self, payload: &SealedSecret) -> Result<String> {
        self.codec.decrypt(payload)
    }

    // ── Credentials ──────────────────────────────────────────────────

    /// Deliberately slow (Argon2id); keep it off latency-sensitive
    /// paths.
    pub fn store_credential(&self, username: &str, password: &str) -> Result<()> {
        self.credentials.store(username, password)
    }

    /// Also deliberately slow. Never errors for bad credentials.
    pub fn validate_credential(&self, username: &str, password: &str) -> bool {
        self.credentials.validate(username, password)
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn create_session(&self, user_id: &str, ttl_ms: Option<i64>) -> String {
        self.sessions.create(user_id, ttl_ms)
    }

    pub fn validate_session(&self, user_id: &str, token: &str) -> bool {
        self.sessions.validate(user_id, token)
    }

    pub fn invalidate_session(&self, user_id: &str) {
        self.sessions.invalidate(user_id)
    }

    pub fn purge_expired_sessions(&self) -> usize {
        self.sessions.purge_expired()
    }

    // ── File registry ────────────────────────────────────────────────

    pub fn register_file(&self, path: &Path) -> Result<()> {
        self.registry.register(path)
    }

    pub fn validate_file(&self, path: &Path) -> bool {
        self.registry.validate(path)
    }

    pub fn validate_all(&self) -> Vec<PathBuf> {
        self.registry.validate_all()
    }
}
