//! Key pair records: the in-memory type and its two JSON forms.
//!
//! - Stored record (`<name>.json` in the store): `{name, algorithm, public_key, secret_key}`
//! - Transfer record (QR, file, clipboard): `{name, algorithm, public_key}`
//!
//! The secret key never appears in a transfer record.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::KeyStoreError;
use crate::crypto::{PublicKey, SecretKey, ALGORITHM};

/// Longest accepted key pair name, in bytes.
pub const MAX_NAME_LEN: usize = 128;

/// A named ML-KEM-1024 key pair. The secret half is absent for imported keys.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    name: String,
    algorithm: String,
    public_key: String,
    secret_key: Option<String>,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl KeyPair {
    pub(crate) fn new(
        name: String,
        public_key: &PublicKey,
        secret_key: Option<&SecretKey>,
    ) -> Self {
        Self {
            name,
            algorithm: ALGORITHM.to_string(),
            public_key: public_key.to_armored(),
            secret_key: secret_key.map(SecretKey::to_armored),
        }
    }

    /// Builds a public-only key pair from an armored key, validating it.
    pub(crate) fn from_armored_public(
        name: String,
        armored_public_key: &str,
    ) -> Result<Self, KeyStoreError> {
        validate_name(&name)?;
        PublicKey::from_armored(armored_public_key)
            .map_err(|e| KeyStoreError::InvalidKeyFormat(e.to_string()))?;

        // Keep the caller's armor so transfer records round-trip byte for byte
        Ok(Self {
            name,
            algorithm: ALGORITHM.to_string(),
            public_key: armored_public_key.to_string(),
            secret_key: None,
        })
    }

    pub(crate) fn renamed(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// The unique name of this key pair.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The algorithm identifier, always [`ALGORITHM`].
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The armored public key.
    pub fn armored_public_key(&self) -> &str {
        &self.public_key
    }

    /// Returns true if the secret half is present.
    pub fn has_secret_key(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Parses the public key.
    pub fn public_key(&self) -> Result<PublicKey, KeyStoreError> {
        PublicKey::from_armored(&self.public_key)
            .map_err(|e| KeyStoreError::InvalidKeyFormat(e.to_string()))
    }

    /// Parses the secret key.
    ///
    /// Public-only key pairs fail with [`KeyStoreError::SecretKeyUnavailable`].
    pub fn secret_key(&self) -> Result<SecretKey, KeyStoreError> {
        let armored = self
            .secret_key
            .as_deref()
            .ok_or_else(|| KeyStoreError::SecretKeyUnavailable(self.name.clone()))?;
        SecretKey::from_armored(armored).map_err(|e| KeyStoreError::InvalidKeyFormat(e.to_string()))
    }

    /// SHA-256 fingerprint of the public key bytes, as colon-separated hex
    /// groups of two bytes.
    pub fn fingerprint(&self) -> Result<String, KeyStoreError> {
        let public = self.public_key()?;
        let hash = Sha256::digest(public.as_bytes());

        let groups: Vec<String> = hash
            .chunks(2)
            .map(|pair| pair.iter().map(|b| format!("{:02X}", b)).collect())
            .collect();
        Ok(groups.join(":"))
    }

    /// The transfer record for this key pair (public half only).
    pub fn to_transfer_record(&self) -> TransferRecord {
        TransferRecord {
            name: self.name.clone(),
            algorithm: self.algorithm.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// Persisted form of a key pair.
#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct StoredRecord {
    pub name: String,
    pub algorithm: String,
    pub public_key: String,
    pub secret_key: Option<String>,
}

impl From<&KeyPair> for StoredRecord {
    fn from(keypair: &KeyPair) -> Self {
        Self {
            name: keypair.name.clone(),
            algorithm: keypair.algorithm.clone(),
            public_key: keypair.public_key.clone(),
            secret_key: keypair.secret_key.clone(),
        }
    }
}

impl TryFrom<StoredRecord> for KeyPair {
    type Error = KeyStoreError;

    fn try_from(record: StoredRecord) -> Result<Self, Self::Error> {
        validate_name(&record.name)?;
        check_algorithm(&record.algorithm)?;
        PublicKey::from_armored(&record.public_key)
            .map_err(|e| KeyStoreError::InvalidKeyFormat(e.to_string()))?;
        if let Some(secret) = &record.secret_key {
            SecretKey::from_armored(secret)
                .map_err(|e| KeyStoreError::InvalidKeyFormat(e.to_string()))?;
        }

        Ok(Self {
            name: record.name,
            algorithm: record.algorithm,
            public_key: record.public_key,
            secret_key: record.secret_key,
        })
    }
}

/// Self-contained public key record exchanged between users.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub name: String,
    pub algorithm: String,
    pub public_key: String,
}

impl TransferRecord {
    /// Serializes the record as compact JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>, KeyStoreError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses a record; missing fields or a foreign algorithm are
    /// [`KeyStoreError::InvalidKeyFormat`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyStoreError> {
        let record: TransferRecord = serde_json::from_slice(bytes)
            .map_err(|e| KeyStoreError::InvalidKeyFormat(format!("transfer record: {}", e)))?;
        check_algorithm(&record.algorithm)?;
        Ok(record)
    }

    /// Converts the record into a validated public-only key pair.
    pub fn into_keypair(self) -> Result<KeyPair, KeyStoreError> {
        KeyPair::from_armored_public(self.name, &self.public_key)
    }
}

fn check_algorithm(algorithm: &str) -> Result<(), KeyStoreError> {
    if algorithm != ALGORITHM {
        return Err(KeyStoreError::InvalidKeyFormat(format!(
            "unsupported algorithm '{}', expected {}",
            algorithm, ALGORITHM
        )));
    }
    Ok(())
}

/// Checks that `name` can be used as a key pair name and record file stem.
pub fn validate_name(name: &str) -> Result<(), KeyStoreError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.len() > MAX_NAME_LEN {
        Some("name is too long")
    } else if name.starts_with('.') {
        Some("name starts with '.'")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name.chars().any(char::is_control) {
        Some("name contains control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(KeyStoreError::InvalidName(format!("{:?}: {}", name, reason))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_keypair;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("alice").is_ok());
        assert!(validate_name("Bob Smith_2").is_ok());
        assert!(validate_name("ключ").is_ok());

        for bad in ["", ".hidden", "../etc", "a/b", "a\\b", "tab\there", "nul\0"] {
            assert!(
                matches!(validate_name(bad), Err(KeyStoreError::InvalidName(_))),
                "accepted {:?}",
                bad
            );
        }
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_secret_key_unavailable() {
        let (public, _) = generate_keypair();
        let keypair = KeyPair::new("bob".to_string(), &public, None);

        assert!(!keypair.has_secret_key());
        assert!(matches!(
            keypair.secret_key(),
            Err(KeyStoreError::SecretKeyUnavailable(name)) if name == "bob"
        ));
    }

    #[test]
    fn test_fingerprint_format() {
        let (public, secret) = generate_keypair();
        let keypair = KeyPair::new("alice".to_string(), &public, Some(&secret));

        let fingerprint = keypair.fingerprint().unwrap();
        let groups: Vec<&str> = fingerprint.split(':').collect();
        assert_eq!(groups.len(), 16);
        assert!(groups.iter().all(|g| g.len() == 4));

        // Public-only copy has the same fingerprint
        let public_only = KeyPair::new("alice".to_string(), &public, None);
        assert_eq!(public_only.fingerprint().unwrap(), fingerprint);
    }

    #[test]
    fn test_transfer_record_excludes_secret() {
        let (public, secret) = generate_keypair();
        let keypair = KeyPair::new("alice".to_string(), &public, Some(&secret));

        let bytes = keypair.to_transfer_record().to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("\"name\":\"alice\""));
        assert!(text.contains("MLKEM_1024"));
        assert!(!text.contains("secret_key"));
        assert!(!text.contains("SECRET KEY"));
    }

    #[test]
    fn test_transfer_record_missing_field() {
        let result = TransferRecord::from_bytes(br#"{"name":"x","algorithm":"MLKEM_1024"}"#);
        assert!(matches!(result, Err(KeyStoreError::InvalidKeyFormat(_))));
    }

    #[test]
    fn test_transfer_record_wrong_algorithm() {
        let (public, _) = generate_keypair();
        let record = TransferRecord {
            name: "x".to_string(),
            algorithm: "X25519".to_string(),
            public_key: public.to_armored(),
        };
        let result = TransferRecord::from_bytes(&record.to_bytes().unwrap());
        assert!(matches!(result, Err(KeyStoreError::InvalidKeyFormat(_))));
    }

    #[test]
    fn test_stored_record_roundtrip() {
        let (public, secret) = generate_keypair();
        let keypair = KeyPair::new("alice".to_string(), &public, Some(&secret));

        let json = serde_json::to_string(&StoredRecord::from(&keypair)).unwrap();
        let record: StoredRecord = serde_json::from_str(&json).unwrap();
        let loaded = KeyPair::try_from(record).unwrap();

        assert_eq!(loaded, keypair);
        assert_eq!(loaded.secret_key().unwrap().as_bytes(), secret.as_bytes());
    }

    #[test]
    fn test_stored_record_public_only_is_null() {
        let (public, _) = generate_keypair();
        let keypair = KeyPair::new("bob".to_string(), &public, None);

        let json = serde_json::to_string(&StoredRecord::from(&keypair)).unwrap();
        assert!(json.contains("\"secret_key\":null"));
    }
}
