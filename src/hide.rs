//! Hiding encrypted messages in carrier images.
//!
//! This module orchestrates the hiding process:
//! 1. Look up the recipient's public key in the key store
//! 2. Encrypt the message into an envelope (ML-KEM + Argon2id + ChaCha20-Poly1305)
//! 3. Serialize the envelope
//! 4. Embed the serialized envelope into the carrier's pixel LSBs

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::crypto::{encrypt, EnvelopeError};
use crate::keystore::{KeyStore, KeyStoreError};
use crate::stego::{self, Framing, ImageIoError, PixelGrid, StegoError};

/// Errors that can occur while hiding a message.
#[derive(Error, Debug)]
pub enum HideError {
    #[error("Key store error: {0}")]
    KeyStoreError(#[from] KeyStoreError),

    #[error("Encryption error: {0}")]
    EnvelopeError(#[from] EnvelopeError),

    #[error("Steganography error: {0}")]
    StegoError(#[from] StegoError),

    #[error("Image error: {0}")]
    ImageIoError(#[from] ImageIoError),
}

/// Configuration for hiding.
#[derive(Debug, Clone, Copy, Default)]
pub struct HideConfig {
    /// How the end of the envelope is marked in the carrier.
    pub framing: Framing,
}

/// Encrypts `message` for `recipient` and embeds it in a copy of `carrier`.
///
/// The carrier itself is never modified.
pub fn hide_message(
    store: &KeyStore,
    carrier: &PixelGrid,
    message: &[u8],
    recipient: &str,
    config: &HideConfig,
) -> Result<PixelGrid, HideError> {
    let public_key = store.require(recipient)?.public_key()?;

    let envelope = encrypt(message, recipient, &public_key)?;
    let payload = envelope.to_bytes()?;

    let stego = stego::embed(carrier, &payload, config.framing)?;

    info!(
        recipient,
        message_len = message.len(),
        payload_len = payload.len(),
        framing = %config.framing,
        "hid message"
    );
    Ok(stego)
}

/// Loads `carrier_path`, hides `message` in it and writes the result.
///
/// Writes to `output`, or to [`stego::default_output_path`] when `None`.
/// Returns the path written.
pub fn hide_file(
    store: &KeyStore,
    carrier_path: &Path,
    message: &[u8],
    recipient: &str,
    output: Option<&Path>,
    config: &HideConfig,
) -> Result<PathBuf, HideError> {
    let carrier = stego::load_grid(carrier_path)?;
    let stego_grid = hide_message(store, &carrier, message, recipient, config)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| stego::default_output_path(carrier_path));
    stego::save_grid(&stego_grid, &output)?;

    Ok(output)
}
