//! Argon2id key derivation from a KEM shared secret.
//!
//! One derivation yields both the ChaCha20-Poly1305 key and its nonce. Every
//! envelope carries a fresh salt, so a (key, nonce) pair is never reused.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Salt length in bytes.
pub const SALT_SIZE: usize = 32;

/// Symmetric key length in bytes.
pub const KEY_SIZE: usize = 32;

/// AEAD nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

/// Argon2 memory cost in KiB (19 MiB).
const MEMORY_COST_KIB: u32 = 19 * 1024;

/// Argon2 passes.
const TIME_COST: u32 = 2;

/// Argon2 lanes.
const PARALLELISM: u32 = 1;

/// Errors that can occur during key derivation.
#[derive(Error, Debug)]
pub enum KdfError {
    #[error("Argon2 error: {0}")]
    Argon2Error(String),
}

/// Symmetric key material derived for one envelope.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_SIZE],
    nonce: [u8; NONCE_SIZE],
}

impl DerivedKey {
    /// The AEAD key.
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// The AEAD nonce.
    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }
}

/// Generates a fresh random salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

fn argon2_instance() -> Result<Argon2<'static>, KdfError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| KdfError::Argon2Error(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Derives the envelope key and nonce from `secret` and `salt`.
///
/// Deterministic: the same inputs always give the same output.
pub fn derive_key(secret: &[u8], salt: &[u8]) -> Result<DerivedKey, KdfError> {
    let mut output = [0u8; KEY_SIZE + NONCE_SIZE];
    let result = argon2_instance()?.hash_password_into(secret, salt, &mut output);
    if let Err(e) = result {
        output.zeroize();
        return Err(KdfError::Argon2Error(e.to_string()));
    }

    let mut derived = DerivedKey {
        key: [0u8; KEY_SIZE],
        nonce: [0u8; NONCE_SIZE],
    };
    derived.key.copy_from_slice(&output[..KEY_SIZE]);
    derived.nonce.copy_from_slice(&output[KEY_SIZE..]);
    output.zeroize();

    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let salt = generate_salt();
        let a = derive_key(b"shared secret bytes", &salt).unwrap();
        let b = derive_key(b"shared secret bytes", &salt).unwrap();

        assert_eq!(a.key(), b.key());
        assert_eq!(a.nonce(), b.nonce());
    }

    #[test]
    fn test_salt_changes_output() {
        let a = derive_key(b"shared secret bytes", &generate_salt()).unwrap();
        let b = derive_key(b"shared secret bytes", &generate_salt()).unwrap();

        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_salts_are_fresh() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_short_salt_rejected() {
        // Argon2 requires at least 8 bytes of salt
        let result = derive_key(b"secret", b"abc");
        assert!(matches!(result, Err(KdfError::Argon2Error(_))));
    }
}
