//! Cryptographic operations for pqstego.
//!
//! This module provides:
//! - Text-safe armor for key material
//! - ML-KEM-1024 key encapsulation
//! - Argon2id key derivation from the shared secret
//! - Envelope encryption (KEM + KDF + ChaCha20-Poly1305)

pub mod armor;
pub mod envelope;
pub mod kdf;
pub mod kem;

pub use armor::{armor, dearmor, ArmorError, PUBLIC_KEY_LABEL, SECRET_KEY_LABEL};
pub use envelope::{decrypt, encrypt, encrypt_to_armored, Envelope, EnvelopeError};
pub use kdf::{derive_key, generate_salt, DerivedKey, KdfError};
pub use kem::{generate_keypair, KemError, PublicKey, SecretKey, SharedSecret, ALGORITHM};
