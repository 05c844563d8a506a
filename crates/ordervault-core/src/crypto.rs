//! Cryptographic primitives.
//!
//! AES-256-GCM for sealing secrets (96-bit random IV, 128-bit tag),
//! Argon2id for credential hashing, OS RNG for all randomness.
//! The nonce must be unique per (key, message); every caller gets a
//! fresh one from [`generate_iv`].

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{Result, SecurityError};

pub const MACHINE_KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const SALT_LEN: usize = 16;
pub const CREDENTIAL_HASH_LEN: usize = 32;
pub const SESSION_TOKEN_LEN: usize = 32;

/// Argon2id cost parameters, tuned for interactive desktop use: a
/// derivation costs tens of milliseconds on commodity hardware. Fixed
/// for the life of a credential store; changing them orphans every
/// stored record.
pub const KDF_MEMORY_COST: u32 = 65536; // 64 MiB
pub const KDF_TIME_COST: u32 = 3;
pub const KDF_PARALLELISM: u32 = 1;

pub fn generate_machine_key() -> Zeroizing<[u8; MACHINE_KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; MACHINE_KEY_LEN]);
    OsRng.fill_bytes(&mut *key);
    key
}

pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Opaque session token: 32 random bytes, hex-encoded. Carries no
/// decodable structure.
pub fn generate_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derive a credential hash from a password and per-user salt.
pub fn derive_credential_hash(
    password: &str,
    salt: &[u8],
) -> Result<Zeroizing<[u8; CREDENTIAL_HASH_LEN]>> {
    let params = Params::new(
        KDF_MEMORY_COST,
        KDF_TIME_COST,
        KDF_PARALLELISM,
        Some(CREDENTIAL_HASH_LEN),
    )
    .expect("static Argon2 params are always valid");
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut hash = Zeroizing::new([0u8; CREDENTIAL_HASH_LEN]);
    argon
        .hash_password_into(password.as_bytes(), salt, &mut *hash)
        .map_err(|e| SecurityError::Crypto(format!("credential derivation: {e}")))?;
    Ok(hash)
}

/// Encrypt `plaintext` under `key` with the given IV. Returns
/// ciphertext with the 16-byte tag appended.
pub fn seal(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| SecurityError::Crypto("invalid key length".into()))?;
    cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| SecurityError::Crypto("encrypt failure".into()))
}

/// Decrypt ciphertext+tag. Every failure surfaces as the same
/// `Authentication` error, whether the data was tampered with or the
/// key is wrong, and no plaintext is released.
pub fn open(key: &[u8], iv: &[u8; IV_LEN], ciphertext_and_tag: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SecurityError::Authentication)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), ciphertext_and_tag)
        .map_err(|_| SecurityError::Authentication)?;
    Ok(Zeroizing::new(plaintext))
}

/// Timing-independent equality for derived hashes and tokens.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = generate_machine_key();
        let iv = generate_iv();
        let sealed = seal(&*key, &iv, b"delivery manifest #4411").unwrap();
        let opened = open(&*key, &iv, &sealed).unwrap();
        assert_eq!(&*opened, b"delivery manifest #4411");
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let key = generate_machine_key();
        let iv = generate_iv();
        let mut sealed = seal(&*key, &iv, b"secret").unwrap();
        sealed[0] ^= 0x01;
        assert!(matches!(
            open(&*key, &iv, &sealed),
            Err(SecurityError::Authentication)
        ));
    }

    #[test]
    fn wrong_key_fails_closed() {
        let k1 = generate_machine_key();
        let k2 = generate_machine_key();
        let iv = generate_iv();
        let sealed = seal(&*k1, &iv, b"secret").unwrap();
        assert!(matches!(
            open(&*k2, &iv, &sealed),
            Err(SecurityError::Authentication)
        ));
    }

    #[test]
    fn derivation_is_deterministic_per_salt() {
        let salt = generate_salt();
        let h1 = derive_credential_hash("hunter2", &salt).unwrap();
        let h2 = derive_credential_hash("hunter2", &salt).unwrap();
        assert_eq!(&*h1, &*h2);

        let other_salt = generate_salt();
        let h3 = derive_credential_hash("hunter2", &other_salt).unwrap();
        assert_ne!(&*h1, &*h3);
    }

    #[test]
    fn constant_time_eq_handles_length_mismatch() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
