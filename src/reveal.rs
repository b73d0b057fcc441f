//! Recovering hidden messages from stego images.
//!
//! Reverse of [`crate::hide`]: extract the envelope from the pixel LSBs,
//! parse it, and decrypt it with a key pair's secret key.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::crypto::{decrypt, Envelope, EnvelopeError};
use crate::keystore::{KeyStore, KeyStoreError};
use crate::stego::{self, Framing, ImageIoError, PixelGrid, StegoError};

/// Errors that can occur while revealing a message.
#[derive(Error, Debug)]
pub enum RevealError {
    #[error("Key store error: {0}")]
    KeyStoreError(#[from] KeyStoreError),

    #[error("Decryption error: {0}")]
    EnvelopeError(#[from] EnvelopeError),

    #[error("Steganography error: {0}")]
    StegoError(#[from] StegoError),

    #[error("Image error: {0}")]
    ImageIoError(#[from] ImageIoError),
}

/// Configuration for revealing. The framing must match the one used to hide.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevealConfig {
    pub framing: Framing,
}

/// Extracts and decrypts the message hidden in `stego_grid` using the
/// secret key of `decryptor`.
///
/// The key pair must exist ([`KeyStoreError::NotFound`]) and hold a secret
/// key ([`KeyStoreError::SecretKeyUnavailable`]). A wrong key and a
/// tampered image both fail with [`EnvelopeError::DecryptionFailed`].
pub fn reveal_message(
    store: &KeyStore,
    stego_grid: &PixelGrid,
    decryptor: &str,
    config: &RevealConfig,
) -> Result<Vec<u8>, RevealError> {
    let secret_key = store.require(decryptor)?.secret_key()?;

    let payload = stego::extract(stego_grid, config.framing)?;
    let envelope = Envelope::from_bytes(&payload)?;
    let message = decrypt(&envelope, &secret_key)?;

    info!(
        decryptor,
        recipient = %envelope.recipient,
        message_len = message.len(),
        "revealed message"
    );
    Ok(message)
}

/// Loads `path` and reveals the message hidden in it.
pub fn reveal_file(
    store: &KeyStore,
    path: &Path,
    decryptor: &str,
    config: &RevealConfig,
) -> Result<Vec<u8>, RevealError> {
    let stego_grid = stego::load_grid(path)?;
    reveal_message(store, &stego_grid, decryptor, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hide::{hide_message, HideConfig};
    use tempfile::TempDir;

    fn create_test_grid(width: u32, height: u32) -> PixelGrid {
        let samples = (0..(width * height * 3) as usize)
            .map(|i| ((i * 13) % 256) as u8)
            .collect();
        PixelGrid::new(width, height, 3, samples).unwrap()
    }

    fn setup() -> (TempDir, KeyStore) {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_hide_then_reveal() {
        let (_dir, store) = setup();
        store.generate("alice").unwrap();
        let carrier = create_test_grid(200, 200);

        for framing in [Framing::Delimiter, Framing::LengthPrefix] {
            let stego_grid =
                hide_message(&store, &carrier, b"hello", "alice", &HideConfig { framing }).unwrap();
            let message =
                reveal_message(&store, &stego_grid, "alice", &RevealConfig { framing }).unwrap();
            assert_eq!(message, b"hello");
        }
    }

    #[test]
    fn test_public_only_cannot_reveal() {
        let (_dir, store) = setup();
        let source = store.generate("bob-full").unwrap();
        store.import_public("bob", source.armored_public_key()).unwrap();

        let carrier = create_test_grid(200, 200);
        let stego_grid =
            hide_message(&store, &carrier, b"secret", "bob", &HideConfig::default()).unwrap();

        let result = reveal_message(&store, &stego_grid, "bob", &RevealConfig::default());
        assert!(matches!(
            result,
            Err(RevealError::KeyStoreError(KeyStoreError::SecretKeyUnavailable(_)))
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let (_dir, store) = setup();
        store.generate("alice").unwrap();
        store.generate("eve").unwrap();

        let carrier = create_test_grid(200, 200);
        let stego_grid =
            hide_message(&store, &carrier, b"for alice", "alice", &HideConfig::default()).unwrap();

        let result = reveal_message(&store, &stego_grid, "eve", &RevealConfig::default());
        assert!(matches!(
            result,
            Err(RevealError::EnvelopeError(EnvelopeError::DecryptionFailed))
        ));
    }

    #[test]
    fn test_clean_carrier_has_no_data() {
        let (_dir, store) = setup();
        store.generate("alice").unwrap();

        let carrier = PixelGrid::new(100, 100, 3, vec![0x80; 30_000]).unwrap();
        let result = reveal_message(&store, &carrier, "alice", &RevealConfig::default());
        assert!(matches!(
            result,
            Err(RevealError::StegoError(StegoError::NoHiddenData))
        ));
    }

    #[test]
    fn test_unknown_decryptor() {
        let (_dir, store) = setup();
        let carrier = create_test_grid(10, 10);

        let result = reveal_message(&store, &carrier, "nobody", &RevealConfig::default());
        assert!(matches!(
            result,
            Err(RevealError::KeyStoreError(KeyStoreError::NotFound(_)))
        ));
    }
}
