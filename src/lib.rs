//! # pqstego - post-quantum image steganography
//!
//! pqstego hides encrypted messages in the pixels of ordinary images.
//!
//! ## Overview
//!
//! - Messages are encrypted to a recipient's **ML-KEM-1024** public key
//! - The KEM shared secret is stretched with **Argon2id** into a
//!   ChaCha20-Poly1305 key and nonce (fresh salt per message)
//! - The resulting envelope is embedded in the **least significant bits** of
//!   the carrier's pixel samples
//! - Key pairs live in a directory-backed [`KeyStore`]; public keys travel as
//!   small JSON transfer records
//!
//! ## Security Model
//!
//! - Only the holder of the recipient's secret key can read the message
//! - Tampering and wrong keys are indistinguishable: both are
//!   [`crypto::EnvelopeError::DecryptionFailed`]
//! - LSB embedding survives only lossless formats (PNG, BMP); it is not
//!   designed to resist steganalysis
//!
//! ## Example Usage
//!
//! ```no_run
//! use pqstego::stego::PixelGrid;
//! use pqstego::{hide_message, reveal_message, HideConfig, KeyStore, RevealConfig};
//!
//! let store = KeyStore::open("/tmp/pqstego-keys").unwrap();
//! store.generate("alice").unwrap();
//!
//! let carrier = PixelGrid::new(400, 400, 3, vec![128; 400 * 400 * 3]).unwrap();
//! let stego = hide_message(&store, &carrier, b"hello", "alice", &HideConfig::default()).unwrap();
//!
//! let message = reveal_message(&store, &stego, "alice", &RevealConfig::default()).unwrap();
//! assert_eq!(message, b"hello");
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: armor, ML-KEM, key derivation, envelope encryption
//! - [`keystore`]: named key pairs and transfer records
//! - [`stego`]: LSB codec and image file I/O
//! - [`hide`] / [`reveal`]: the end-to-end pipeline
//! - [`config`]: TOML configuration

pub mod config;
pub mod crypto;
pub mod hide;
pub mod keystore;
pub mod reveal;
pub mod stego;

// Re-export commonly used types at the crate root
pub use config::{Config, ConfigError};
pub use hide::{hide_file, hide_message, HideConfig, HideError};
pub use keystore::{KeyPair, KeyStore, KeyStoreError, TransferRecord};
pub use reveal::{reveal_file, reveal_message, RevealConfig, RevealError};
pub use stego::{Framing, PixelGrid};
