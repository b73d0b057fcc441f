//! Text-safe armor for binary key material.
//!
//! Key bytes are wrapped in PEM-style markers around base64 text:
//!
//! ```text
//! -----BEGIN MLKEM_1024 PUBLIC KEY-----
//! <base64, 64 columns per line>
//! -----END MLKEM_1024 PUBLIC KEY-----
//! ```
//!
//! The codec knows nothing about the KEM; callers pick the label.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

/// Label for armored ML-KEM-1024 public keys.
pub const PUBLIC_KEY_LABEL: &str = "MLKEM_1024 PUBLIC KEY";

/// Label for armored ML-KEM-1024 secret keys.
pub const SECRET_KEY_LABEL: &str = "MLKEM_1024 SECRET KEY";

/// Base64 characters per armored line.
const LINE_WIDTH: usize = 64;

/// Errors that can occur while removing armor.
#[derive(Error, Debug)]
pub enum ArmorError {
    #[error("Missing armor header for {0}")]
    MissingHeader(String),

    #[error("Missing armor footer for {0}")]
    MissingFooter(String),

    #[error("Armor footer appears before header")]
    MisorderedMarkers,

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

fn header(label: &str) -> String {
    format!("-----BEGIN {}-----", label)
}

fn footer(label: &str) -> String {
    format!("-----END {}-----", label)
}

/// Armors `bytes` under `label`.
pub fn armor(label: &str, bytes: &[u8]) -> String {
    let encoded = BASE64.encode(bytes);

    let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 80);
    out.push_str(&header(label));
    out.push('\n');
    // base64 output is ASCII, so every byte offset is a char boundary
    for start in (0..encoded.len()).step_by(LINE_WIDTH) {
        let end = (start + LINE_WIDTH).min(encoded.len());
        out.push_str(&encoded[start..end]);
        out.push('\n');
    }
    out.push_str(&footer(label));
    out.push('\n');
    out
}

/// Removes the armor from `text`, which must carry the markers for `label`.
///
/// Whitespace between the markers (line breaks, indentation, CRLF) is ignored.
pub fn dearmor(label: &str, text: &str) -> Result<Vec<u8>, ArmorError> {
    let header = header(label);
    let footer = footer(label);

    let start = text
        .find(&header)
        .ok_or_else(|| ArmorError::MissingHeader(label.to_string()))?
        + header.len();

    let end = text
        .find(&footer)
        .ok_or_else(|| ArmorError::MissingFooter(label.to_string()))?;

    if start > end {
        return Err(ArmorError::MisorderedMarkers);
    }

    let body: String = text[start..end]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    Ok(BASE64.decode(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_roundtrip() {
        let data: Vec<u8> = (0..=255).collect();
        let armored = armor(PUBLIC_KEY_LABEL, &data);
        assert_eq!(dearmor(PUBLIC_KEY_LABEL, &armored).unwrap(), data);
    }

    #[test]
    fn test_armor_layout() {
        let armored = armor(SECRET_KEY_LABEL, &[7u8; 100]);
        let lines: Vec<&str> = armored.lines().collect();

        assert_eq!(lines[0], "-----BEGIN MLKEM_1024 SECRET KEY-----");
        assert_eq!(*lines.last().unwrap(), "-----END MLKEM_1024 SECRET KEY-----");
        assert!(lines[1..lines.len() - 1].iter().all(|l| l.len() <= LINE_WIDTH));
        assert!(armored.ends_with('\n'));
    }

    #[test]
    fn test_armor_body_is_exact_base64() {
        // 48 bytes encode to exactly one full line; 49 spill into a second
        for len in [0usize, 1, 48, 49, 200] {
            let data: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let armored = armor(PUBLIC_KEY_LABEL, &data);
            let lines: Vec<&str> = armored.lines().collect();

            let body: String = lines[1..lines.len() - 1].concat();
            assert_eq!(body, BASE64.encode(&data));
            assert_eq!(lines.len() - 2, BASE64.encode(&data).len().div_ceil(LINE_WIDTH));
        }
    }

    #[test]
    fn test_dearmor_tolerates_whitespace() {
        let armored = armor(PUBLIC_KEY_LABEL, b"hello armor");
        let mangled = format!("  \r\n{}", armored.replace('\n', "\r\n    "));
        assert_eq!(dearmor(PUBLIC_KEY_LABEL, &mangled).unwrap(), b"hello armor");
    }

    #[test]
    fn test_dearmor_wrong_label() {
        let armored = armor(SECRET_KEY_LABEL, b"secret");
        let result = dearmor(PUBLIC_KEY_LABEL, &armored);
        assert!(matches!(result, Err(ArmorError::MissingHeader(_))));
    }

    #[test]
    fn test_dearmor_missing_footer() {
        let text = "-----BEGIN MLKEM_1024 PUBLIC KEY-----\nAAAA\n";
        let result = dearmor(PUBLIC_KEY_LABEL, text);
        assert!(matches!(result, Err(ArmorError::MissingFooter(_))));
    }

    #[test]
    fn test_dearmor_misordered() {
        let text = "-----END MLKEM_1024 PUBLIC KEY-----\n-----BEGIN MLKEM_1024 PUBLIC KEY-----\n";
        let result = dearmor(PUBLIC_KEY_LABEL, text);
        assert!(matches!(result, Err(ArmorError::MisorderedMarkers)));
    }

    #[test]
    fn test_dearmor_bad_base64() {
        let text = "-----BEGIN MLKEM_1024 PUBLIC KEY-----\n!!!not base64!!!\n-----END MLKEM_1024 PUBLIC KEY-----\n";
        let result = dearmor(PUBLIC_KEY_LABEL, text);
        assert!(matches!(result, Err(ArmorError::Base64Error(_))));
    }
}
