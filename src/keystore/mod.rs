//! Durable registry of named key pairs.
//!
//! Each key pair is stored as `<dir>/<name>.json`. A [`KeyStore`] is an
//! explicit handle over one directory; callers pass it to every operation
//! that needs keys.
//!
//! Writes go to disk first (temporary file + atomic rename) and only then
//! update the in-memory registry, so a failed write never leaves memory and
//! disk disagreeing.

mod record;

pub use record::{validate_name, KeyPair, TransferRecord, MAX_NAME_LEN};

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::crypto::generate_keypair;
use record::StoredRecord;

/// Extension of key pair record files.
const RECORD_EXTENSION: &str = "json";

/// Extension of exported public key files.
pub const TRANSFER_FILE_EXTENSION: &str = "qkey";

/// Errors that can occur when managing key pairs.
#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Key pair not found: {0}")]
    NotFound(String),

    #[error("Secret key not available for '{0}' (public key only)")]
    SecretKeyUnavailable(String),

    #[error("Invalid key pair name {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A directory-backed registry of key pairs.
#[derive(Debug)]
pub struct KeyStore {
    dir: PathBuf,
    keys: RwLock<BTreeMap<String, KeyPair>>,
}

impl KeyStore {
    /// Opens the store in `dir`, creating the directory if needed and
    /// loading every record in it.
    ///
    /// Files that cannot be read or validated are skipped with a warning.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, KeyStoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let keys = load_records(&dir)?;
        debug!(dir = %dir.display(), count = keys.len(), "opened key store");

        Ok(Self {
            dir,
            keys: RwLock::new(keys),
        })
    }

    /// The directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generates a fresh key pair and registers it under `name`.
    ///
    /// An existing key pair with the same name is replaced without asking;
    /// confirming that is the caller's job.
    pub fn generate(&self, name: &str) -> Result<KeyPair, KeyStoreError> {
        validate_name(name)?;

        let (public, secret) = generate_keypair();
        let keypair = KeyPair::new(name.to_string(), &public, Some(&secret));

        let mut keys = self.write_keys();
        self.persist(&keypair)?;
        let replaced = keys.insert(name.to_string(), keypair.clone()).is_some();

        info!(name, replaced, "generated key pair");
        Ok(keypair)
    }

    /// Imports a public key under `name`, replacing any existing entry.
    ///
    /// Fails with [`KeyStoreError::InvalidKeyFormat`] unless the armored text
    /// decodes to an ML-KEM-1024 public key.
    pub fn import_public(
        &self,
        name: &str,
        armored_public_key: &str,
    ) -> Result<KeyPair, KeyStoreError> {
        let keypair = KeyPair::from_armored_public(name.to_string(), armored_public_key)?;

        let mut keys = self.write_keys();
        self.persist(&keypair)?;
        let replaced = keys.insert(name.to_string(), keypair.clone()).is_some();

        info!(name, replaced, "imported public key");
        Ok(keypair)
    }

    /// Returns a copy of the key pair registered under `name`.
    pub fn get(&self, name: &str) -> Option<KeyPair> {
        self.read_keys().get(name).cloned()
    }

    /// Returns the key pair registered under `name` or [`KeyStoreError::NotFound`].
    pub fn require(&self, name: &str) -> Result<KeyPair, KeyStoreError> {
        self.get(name)
            .ok_or_else(|| KeyStoreError::NotFound(name.to_string()))
    }

    /// Check if a key pair exists.
    pub fn contains(&self, name: &str) -> bool {
        self.read_keys().contains_key(name)
    }

    /// All key pair names in ascending order.
    pub fn list(&self) -> Vec<String> {
        self.read_keys().keys().cloned().collect()
    }

    /// Number of key pairs in the store.
    pub fn len(&self) -> usize {
        self.read_keys().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read_keys().is_empty()
    }

    /// Deletes a key pair and its record file.
    ///
    /// An absent name fails with [`KeyStoreError::NotFound`].
    pub fn delete(&self, name: &str) -> Result<(), KeyStoreError> {
        let mut keys = self.write_keys();
        if !keys.contains_key(name) {
            return Err(KeyStoreError::NotFound(name.to_string()));
        }

        match fs::remove_file(self.record_path(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(name, "record file already missing");
            }
            Err(e) => return Err(e.into()),
        }
        keys.remove(name);

        info!(name, "deleted key pair");
        Ok(())
    }

    /// Serializes the public half of `name` as a transfer record.
    pub fn encode_for_transfer(&self, name: &str) -> Result<Vec<u8>, KeyStoreError> {
        self.require(name)?.to_transfer_record().to_bytes()
    }

    /// Parses a transfer record into a public-only key pair without
    /// registering it.
    pub fn decode_from_transfer(bytes: &[u8]) -> Result<KeyPair, KeyStoreError> {
        TransferRecord::from_bytes(bytes)?.into_keypair()
    }

    /// Returns `base` if it is free, otherwise the first free `base_N`
    /// (N = 1, 2, ...). A base too long to take the suffix is shortened.
    pub fn unique_name(&self, base: &str) -> String {
        unique_name_in(&self.read_keys(), base)
    }

    /// Decodes a transfer record and registers it, renaming on collision.
    pub fn import_transfer(&self, bytes: &[u8]) -> Result<KeyPair, KeyStoreError> {
        let decoded = Self::decode_from_transfer(bytes)?;

        let mut keys = self.write_keys();
        let name = unique_name_in(&keys, decoded.name());
        validate_name(&name)?;
        if name != decoded.name() {
            info!(original = decoded.name(), renamed = %name, "resolved name collision");
        }

        let keypair = decoded.renamed(name.clone());
        self.persist(&keypair)?;
        keys.insert(name.clone(), keypair.clone());

        info!(name = %name, "imported transfer record");
        Ok(keypair)
    }

    /// Writes the transfer record of `name` to `path`, or to
    /// `<name>_public_key.qkey` when no path is given.
    pub fn export_public_to_file(
        &self,
        name: &str,
        path: Option<&Path>,
    ) -> Result<PathBuf, KeyStoreError> {
        let record = self.require(name)?.to_transfer_record();
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(format!("{}_public_key.{}", name, TRANSFER_FILE_EXTENSION)),
        };

        let content = serde_json::to_string_pretty(&record)?;
        fs::write(&path, content)?;

        info!(name, path = %path.display(), "exported public key");
        Ok(path)
    }

    /// Imports a transfer record file, renaming on collision.
    pub fn import_public_from_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<KeyPair, KeyStoreError> {
        let bytes = fs::read(path.as_ref())?;
        self.import_transfer(&bytes)
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, RECORD_EXTENSION))
    }

    /// Writes the record to a temporary file and renames it into place.
    fn persist(&self, keypair: &KeyPair) -> Result<(), KeyStoreError> {
        let content = serde_json::to_string_pretty(&StoredRecord::from(keypair))?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;

        // Restrictive permissions on secret material (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = if keypair.has_secret_key() { 0o600 } else { 0o644 };
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))?;
        }

        tmp.persist(self.record_path(keypair.name()))
            .map_err(|e| KeyStoreError::IoError(e.error))?;
        Ok(())
    }

    fn read_keys(&self) -> RwLockReadGuard<'_, BTreeMap<String, KeyPair>> {
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_keys(&self) -> RwLockWriteGuard<'_, BTreeMap<String, KeyPair>> {
        self.keys.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unique_name_in(keys: &BTreeMap<String, KeyPair>, base: &str) -> String {
    if !keys.contains_key(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| {
            // Shorten the base so the suffixed name stays within MAX_NAME_LEN
            let suffix = format!("_{}", n);
            let mut cut = base.len().min(MAX_NAME_LEN.saturating_sub(suffix.len()));
            while !base.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}{}", &base[..cut], suffix)
        })
        .find(|candidate| !keys.contains_key(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Loads every `*.json` record in `dir`.
fn load_records(dir: &Path) -> Result<BTreeMap<String, KeyPair>, KeyStoreError> {
    let mut keys = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
            continue;
        }

        match load_record(&path) {
            Ok(keypair) => {
                keys.insert(keypair.name().to_string(), keypair);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping key pair record");
            }
        }
    }

    Ok(keys)
}

fn load_record(path: &Path) -> Result<KeyPair, KeyStoreError> {
    let content = fs::read_to_string(path)?;
    let record: StoredRecord = serde_json::from_str(&content)?;
    let keypair = KeyPair::try_from(record)?;

    // delete() addresses records by name, so the file stem has to agree
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem != keypair.name() {
        return Err(KeyStoreError::InvalidName(format!(
            "{:?}: stored in file {:?}",
            keypair.name(),
            stem
        )));
    }

    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, KeyStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = KeyStore::open(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_generate_and_get() {
        let (_dir, store) = setup_store();

        let keypair = store.generate("alice").unwrap();
        assert_eq!(keypair.name(), "alice");
        assert_eq!(keypair.algorithm(), "MLKEM_1024");
        assert!(keypair.has_secret_key());

        assert_eq!(store.get("alice"), Some(keypair));
        assert!(store.get("Alice").is_none());
        assert!(store.dir().join("alice.json").exists());
    }

    #[test]
    fn test_generate_overwrites() {
        let (_dir, store) = setup_store();

        let first = store.generate("alice").unwrap();
        let second = store.generate("alice").unwrap();

        assert_ne!(first.armored_public_key(), second.armored_public_key());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("alice").unwrap(), second);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let (dir, store) = setup_store();

        let alice = store.generate("alice").unwrap();
        let bob_pub = store.generate("bob-src").unwrap().armored_public_key().to_string();
        store.import_public("bob", &bob_pub).unwrap();
        drop(store);

        let reopened = KeyStore::open(dir.path()).unwrap();
        assert_eq!(reopened.list(), vec!["alice", "bob", "bob-src"]);
        assert_eq!(reopened.get("alice").unwrap(), alice);
        assert!(!reopened.get("bob").unwrap().has_secret_key());
    }

    #[test]
    fn test_list_is_sorted() {
        let (_dir, store) = setup_store();
        let source = store.generate("zed").unwrap();
        store.import_public("carol", source.armored_public_key()).unwrap();
        store.import_public("amy", source.armored_public_key()).unwrap();

        assert_eq!(store.list(), vec!["amy", "carol", "zed"]);
    }

    #[test]
    fn test_import_invalid_key() {
        let (_dir, store) = setup_store();

        let result = store.import_public("bob", "not a key");
        assert!(matches!(result, Err(KeyStoreError::InvalidKeyFormat(_))));
        assert!(store.is_empty());

        let short = crate::crypto::armor(crate::crypto::PUBLIC_KEY_LABEL, &[1u8; 64]);
        let result = store.import_public("bob", &short);
        assert!(matches!(result, Err(KeyStoreError::InvalidKeyFormat(_))));
        assert!(!store.dir().join("bob.json").exists());
    }

    #[test]
    fn test_invalid_name_rejected() {
        let (dir, store) = setup_store();

        let result = store.generate("../escape");
        assert!(matches!(result, Err(KeyStoreError::InvalidName(_))));
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = setup_store();
        store.generate("alice").unwrap();

        store.delete("alice").unwrap();
        assert!(!store.contains("alice"));
        assert!(!store.dir().join("alice.json").exists());

        let result = store.delete("alice");
        assert!(matches!(result, Err(KeyStoreError::NotFound(_))));
    }

    #[test]
    fn test_transfer_roundtrip() {
        let (_dir, store) = setup_store();
        let alice = store.generate("alice").unwrap();

        let bytes = store.encode_for_transfer("alice").unwrap();
        let decoded = KeyStore::decode_from_transfer(&bytes).unwrap();

        assert_eq!(decoded.name(), "alice");
        assert_eq!(decoded.armored_public_key(), alice.armored_public_key());
        assert!(!decoded.has_secret_key());
        // Decoding does not register anything
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_encode_for_transfer_missing() {
        let (_dir, store) = setup_store();
        let result = store.encode_for_transfer("nobody");
        assert!(matches!(result, Err(KeyStoreError::NotFound(_))));
    }

    #[test]
    fn test_import_transfer_resolves_collisions() {
        let (_dir, store) = setup_store();
        store.generate("alice").unwrap();
        let bytes = store.encode_for_transfer("alice").unwrap();

        let first = store.import_transfer(&bytes).unwrap();
        let second = store.import_transfer(&bytes).unwrap();

        assert_eq!(first.name(), "alice_1");
        assert_eq!(second.name(), "alice_2");
        assert!(store.get("alice").unwrap().has_secret_key());
        assert!(!store.get("alice_1").unwrap().has_secret_key());
        assert_eq!(store.unique_name("alice"), "alice_3");
        assert_eq!(store.unique_name("dave"), "dave");
    }

    #[test]
    fn test_import_transfer_long_name_collision() {
        let (_dir, store) = setup_store();
        let long = "k".repeat(MAX_NAME_LEN);
        store.generate(&long).unwrap();
        let transfer = store.encode_for_transfer(&long).unwrap();

        let first = store.import_transfer(&transfer).unwrap();
        assert_eq!(first.name(), format!("{}_1", "k".repeat(MAX_NAME_LEN - 2)));

        let second = store.import_transfer(&transfer).unwrap();
        assert_eq!(second.name(), format!("{}_2", "k".repeat(MAX_NAME_LEN - 2)));
        assert_eq!(store.len(), 3);

        // Multi-byte chars are never split
        let wide = "\u{e9}".repeat(MAX_NAME_LEN / 2);
        store.generate(&wide).unwrap();
        let renamed = store
            .import_transfer(&store.encode_for_transfer(&wide).unwrap())
            .unwrap();
        assert!(renamed.name().len() <= MAX_NAME_LEN);
        assert!(renamed.name().ends_with("_1"));
        assert!(renamed.name().starts_with('\u{e9}'));
    }

    #[test]
    fn test_export_and_import_file() {
        let (dir, store) = setup_store();
        store.generate("alice").unwrap();

        let path = dir.path().join("alice.qkey");
        let written = store.export_public_to_file("alice", Some(path.as_path())).unwrap();
        assert_eq!(written, path);

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("SECRET"));

        let other_dir = TempDir::new().unwrap();
        let other = KeyStore::open(other_dir.path()).unwrap();
        let imported = other.import_public_from_file(&path).unwrap();

        assert_eq!(imported.name(), "alice");
        assert_eq!(
            imported.armored_public_key(),
            store.get("alice").unwrap().armored_public_key()
        );
    }

    #[test]
    fn test_open_skips_bad_records() {
        let (dir, store) = setup_store();
        store.generate("alice").unwrap();
        drop(store);

        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let alice = fs::read_to_string(dir.path().join("alice.json")).unwrap();
        fs::write(dir.path().join("mallory.json"), alice).unwrap();

        let reopened = KeyStore::open(dir.path()).unwrap();
        assert_eq!(reopened.list(), vec!["alice"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_secret_record_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, store) = setup_store();
        store.generate("alice").unwrap();

        let mode = fs::metadata(dir.path().join("alice.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
