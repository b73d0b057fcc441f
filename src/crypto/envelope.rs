//! KEM envelope encryption.
//!
//! Encryption:
//! 1. Encapsulate a shared secret to the recipient's ML-KEM-1024 public key
//! 2. Derive key + nonce from the shared secret and a fresh salt (Argon2id)
//! 3. Encrypt with ChaCha20-Poly1305, keeping the tag detached
//! 4. Collect everything into an [`Envelope`]
//!
//! Decryption reverses the steps and fails closed: a tag mismatch never
//! yields any plaintext.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    ChaCha20Poly1305, Key, Nonce, Tag,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroize;

use super::kdf::{derive_key, generate_salt, KdfError};
use super::kem::{PublicKey, SecretKey};

/// AEAD tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during envelope encryption and decryption.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Covers both a wrong key and tampered data.
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(#[from] KdfError),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Everything a recipient needs to decrypt a message with their secret key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Name of the recipient key pair. Informational only.
    pub recipient: String,
    /// Argon2id salt, fresh for every encryption.
    pub kdf_salt: Vec<u8>,
    /// ML-KEM-1024 ciphertext bound to the recipient's public key.
    pub kem_ciphertext: Vec<u8>,
    /// ChaCha20-Poly1305 authentication tag.
    pub verification_tag: Vec<u8>,
    /// Encrypted message body.
    pub ciphertext: Vec<u8>,
}

/// Wire form: every byte field as standard base64.
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    recipient: String,
    kdf_salt: String,
    kem_ciphertext: String,
    verification_tag: String,
    ciphertext: String,
}

impl Envelope {
    /// Serializes the envelope into the byte blob handed to the codec.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let wire = WireEnvelope {
            recipient: self.recipient.clone(),
            kdf_salt: BASE64.encode(&self.kdf_salt),
            kem_ciphertext: BASE64.encode(&self.kem_ciphertext),
            verification_tag: BASE64.encode(&self.verification_tag),
            ciphertext: BASE64.encode(&self.ciphertext),
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Parses an envelope from its serialized form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let wire: WireEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| EnvelopeError::MalformedEnvelope(e.to_string()))?;

        let field = |name: &str, value: &str| {
            BASE64
                .decode(value)
                .map_err(|e| EnvelopeError::MalformedEnvelope(format!("{}: {}", name, e)))
        };

        Ok(Self {
            kdf_salt: field("kdf_salt", &wire.kdf_salt)?,
            kem_ciphertext: field("kem_ciphertext", &wire.kem_ciphertext)?,
            verification_tag: field("verification_tag", &wire.verification_tag)?,
            ciphertext: field("ciphertext", &wire.ciphertext)?,
            recipient: wire.recipient,
        })
    }
}

/// Encrypts `plaintext` to `recipient_key`.
///
/// `recipient` is recorded in the envelope for display; it is not
/// authenticated.
pub fn encrypt(
    plaintext: &[u8],
    recipient: &str,
    recipient_key: &PublicKey,
) -> Result<Envelope, EnvelopeError> {
    let (kem_ciphertext, shared_secret) = recipient_key.encapsulate();

    let salt = generate_salt();
    let derived = derive_key(shared_secret.as_bytes(), &salt)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(derived.key()));
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(derived.nonce()), b"", &mut buffer)
        .map_err(|_| EnvelopeError::EncryptionFailed)?;

    debug!(
        recipient,
        plaintext_len = plaintext.len(),
        "encrypted message into envelope"
    );

    Ok(Envelope {
        recipient: recipient.to_string(),
        kdf_salt: salt.to_vec(),
        kem_ciphertext,
        verification_tag: tag.to_vec(),
        ciphertext: buffer,
    })
}

/// Encrypts to an armored public key.
///
/// Fails with [`EnvelopeError::InvalidKeyFormat`] if the armor or the key
/// bytes are malformed.
pub fn encrypt_to_armored(
    plaintext: &[u8],
    recipient: &str,
    armored_public_key: &str,
) -> Result<Envelope, EnvelopeError> {
    let key = PublicKey::from_armored(armored_public_key)
        .map_err(|e| EnvelopeError::InvalidKeyFormat(e.to_string()))?;
    encrypt(plaintext, recipient, &key)
}

/// Decrypts `envelope` with `secret_key`.
///
/// Any failure (malformed ciphertext, wrong key, tampered field) is reported
/// as [`EnvelopeError::DecryptionFailed`].
pub fn decrypt(envelope: &Envelope, secret_key: &SecretKey) -> Result<Vec<u8>, EnvelopeError> {
    let shared_secret = secret_key
        .decapsulate(&envelope.kem_ciphertext)
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    if envelope.verification_tag.len() != TAG_SIZE {
        return Err(EnvelopeError::DecryptionFailed);
    }

    // Argon2 rejects short salts; a mangled salt is tampering like any other
    let derived = derive_key(shared_secret.as_bytes(), &envelope.kdf_salt)
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(derived.key()));
    let mut buffer = envelope.ciphertext.clone();
    let result = cipher.decrypt_in_place_detached(
        Nonce::from_slice(derived.nonce()),
        b"",
        &mut buffer,
        Tag::from_slice(&envelope.verification_tag),
    );

    if result.is_err() {
        buffer.zeroize();
        return Err(EnvelopeError::DecryptionFailed);
    }

    debug!(
        recipient = %envelope.recipient,
        plaintext_len = buffer.len(),
        "decrypted envelope"
    );

    Ok(buffer)
}
