//! ML-KEM-1024 key encapsulation.
//!
//! Thin typed wrappers over `pqcrypto-mlkem` so the rest of the crate never
//! touches raw key byte slices without a length check.

use pqcrypto_mlkem::mlkem1024;
use pqcrypto_traits::kem::{
    Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _,
};
use thiserror::Error;
use zeroize::Zeroizing;

use super::armor::{armor, dearmor, ArmorError, PUBLIC_KEY_LABEL, SECRET_KEY_LABEL};

/// Algorithm identifier stored in key records and transfer records.
pub const ALGORITHM: &str = "MLKEM_1024";

/// Size of an ML-KEM-1024 public (encapsulation) key.
pub const PUBLIC_KEY_SIZE: usize = 1568;
/// Size of an ML-KEM-1024 secret (decapsulation) key.
pub const SECRET_KEY_SIZE: usize = 3168;
/// Size of an ML-KEM-1024 ciphertext.
pub const CIPHERTEXT_SIZE: usize = 1568;
/// Size of the shared secret.
pub const SHARED_SECRET_SIZE: usize = 32;

/// Errors that can occur during KEM operations.
#[derive(Error, Debug)]
pub enum KemError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid ciphertext length: expected {expected}, got {got}")]
    InvalidCiphertextLength { expected: usize, got: usize },

    #[error("Armor error: {0}")]
    ArmorError(#[from] ArmorError),
}

/// ML-KEM-1024 public key.
#[derive(Clone)]
pub struct PublicKey {
    inner: mlkem1024::PublicKey,
}

/// ML-KEM-1024 secret key.
#[derive(Clone)]
pub struct SecretKey {
    inner: mlkem1024::SecretKey,
}

/// Shared secret produced by encapsulation or decapsulation. Zeroed on drop.
pub struct SharedSecret(Zeroizing<[u8; SHARED_SECRET_SIZE]>);

impl SharedSecret {
    fn from_kem(secret: &mlkem1024::SharedSecret) -> Self {
        let mut bytes = Zeroizing::new([0u8; SHARED_SECRET_SIZE]);
        bytes.copy_from_slice(secret.as_bytes());
        Self(bytes)
    }

    /// Returns the secret bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &ALGORITHM)
            .field("size", &self.as_bytes().len())
            .finish()
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("algorithm", &ALGORITHM)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

/// Generates a fresh ML-KEM-1024 key pair.
pub fn generate_keypair() -> (PublicKey, SecretKey) {
    let (public, secret) = mlkem1024::keypair();
    (PublicKey { inner: public }, SecretKey { inner: secret })
}

impl PublicKey {
    /// Builds a public key from raw bytes, checking the length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KemError> {
        let inner =
            mlkem1024::PublicKey::from_bytes(bytes).map_err(|_| KemError::InvalidKeyLength {
                expected: PUBLIC_KEY_SIZE,
                got: bytes.len(),
            })?;
        Ok(Self { inner })
    }

    /// Parses an armored public key.
    pub fn from_armored(text: &str) -> Result<Self, KemError> {
        Self::from_bytes(&dearmor(PUBLIC_KEY_LABEL, text)?)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Returns the armored form of this key.
    pub fn to_armored(&self) -> String {
        armor(PUBLIC_KEY_LABEL, self.as_bytes())
    }

    /// Encapsulates a fresh shared secret to this key.
    ///
    /// Returns the KEM ciphertext and the shared secret.
    pub fn encapsulate(&self) -> (Vec<u8>, SharedSecret) {
        let (shared, ciphertext) = mlkem1024::encapsulate(&self.inner);
        (ciphertext.as_bytes().to_vec(), SharedSecret::from_kem(&shared))
    }
}

impl SecretKey {
    /// Builds a secret key from raw bytes, checking the length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KemError> {
        let inner =
            mlkem1024::SecretKey::from_bytes(bytes).map_err(|_| KemError::InvalidKeyLength {
                expected: SECRET_KEY_SIZE,
                got: bytes.len(),
            })?;
        Ok(Self { inner })
    }

    /// Parses an armored secret key.
    pub fn from_armored(text: &str) -> Result<Self, KemError> {
        let bytes = Zeroizing::new(dearmor(SECRET_KEY_LABEL, text)?);
        Self::from_bytes(&bytes)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Returns the armored form of this key.
    pub fn to_armored(&self) -> String {
        armor(SECRET_KEY_LABEL, self.as_bytes())
    }

    /// Recovers the shared secret from a KEM ciphertext.
    ///
    /// ML-KEM uses implicit rejection: a well-sized ciphertext made for a
    /// different key yields an unrelated secret rather than an error.
    pub fn decapsulate(&self, ciphertext: &[u8]) -> Result<SharedSecret, KemError> {
        let ct = mlkem1024::Ciphertext::from_bytes(ciphertext).map_err(|_| {
            KemError::InvalidCiphertextLength {
                expected: CIPHERTEXT_SIZE,
                got: ciphertext.len(),
            }
        })?;
        let shared = mlkem1024::decapsulate(&ct, &self.inner);
        Ok(SharedSecret::from_kem(&shared))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_match_library() {
        assert_eq!(mlkem1024::public_key_bytes(), PUBLIC_KEY_SIZE);
        assert_eq!(mlkem1024::secret_key_bytes(), SECRET_KEY_SIZE);
        assert_eq!(mlkem1024::ciphertext_bytes(), CIPHERTEXT_SIZE);
        assert_eq!(mlkem1024::shared_secret_bytes(), SHARED_SECRET_SIZE);
    }

    #[test]
    fn test_encapsulate_decapsulate() {
        let (public, secret) = generate_keypair();
        let (ciphertext, sent) = public.encapsulate();
        let received = secret.decapsulate(&ciphertext).unwrap();

        assert_eq!(ciphertext.len(), CIPHERTEXT_SIZE);
        assert_eq!(sent.as_bytes(), received.as_bytes());
    }

    #[test]
    fn test_wrong_key_gives_different_secret() {
        let (public, _) = generate_keypair();
        let (_, other_secret) = generate_keypair();

        let (ciphertext, sent) = public.encapsulate();
        let received = other_secret.decapsulate(&ciphertext).unwrap();

        assert_ne!(sent.as_bytes(), received.as_bytes());
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let (public, secret) = generate_keypair();
        let (ciphertext, _) = public.encapsulate();

        let result = secret.decapsulate(&ciphertext[..100]);
        assert!(matches!(
            result,
            Err(KemError::InvalidCiphertextLength { got: 100, .. })
        ));
    }

    #[test]
    fn test_armored_roundtrip() {
        let (public, secret) = generate_keypair();

        let public2 = PublicKey::from_armored(&public.to_armored()).unwrap();
        let secret2 = SecretKey::from_armored(&secret.to_armored()).unwrap();

        assert_eq!(public.as_bytes(), public2.as_bytes());
        assert_eq!(secret.as_bytes(), secret2.as_bytes());
    }

    #[test]
    fn test_public_key_wrong_length() {
        let result = PublicKey::from_bytes(&[0u8; 32]);
        assert!(matches!(
            result,
            Err(KemError::InvalidKeyLength { expected: PUBLIC_KEY_SIZE, got: 32 })
        ));
    }

    #[test]
    fn test_secret_armor_not_accepted_as_public() {
        let (_, secret) = generate_keypair();
        let result = PublicKey::from_armored(&secret.to_armored());
        assert!(matches!(result, Err(KemError::ArmorError(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let (_, secret) = generate_keypair();
        let debug = format!("{:?}", secret);
        assert!(debug.contains("REDACTED"));
    }
}
