//! ordervault-core — at-rest secret store & session authority
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize secret material on drop; never log keys or plaintext.
//! - No process-wide globals: all state hangs off a [`SecretStore`]
//!   handle constructed once at startup and threaded through calls.
//!
//! # Module layout
//! - `crypto`      — AES-256-GCM seal/open, Argon2id derivation, RNG helpers
//! - `storage`     — atomic owner-only file writes for the security directory
//! - `keystore`    — per-installation machine key (lazy create, hex key file)
//! - `codec`       — sealed `{iv, authTag, data}` payloads for secret strings
//! - `credentials` — salted slow-KDF password records, file backed
//! - `session`     — in-memory TTL'd session tokens, one per user
//! - `registry`    — integrity fingerprints for application-trusted files
//! - `store`       — [`SecretStore`] facade over the above
//! - `error`       — unified error type

pub mod codec;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod registry;
pub mod session;
pub mod storage;
pub mod store;

pub use codec::SealedSecret;
pub use error::{Result, SecurityError};
pub use store::SecretStore;
