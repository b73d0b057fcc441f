//! LSB (Least Significant Bit) codec over raw pixel samples.
//!
//! A framed payload is written one bit per sample, MSB-first per byte,
//! traversing samples row-major and channel-minor. Only bit 0 of a sample is
//! ever changed.
//!
//! Two framings are supported:
//! - [`Framing::Delimiter`]: `[payload] + b"###END###"`
//! - [`Framing::LengthPrefix`]: `[4 bytes big-endian length] + [payload]`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// End-of-payload marker for delimiter framing.
pub const DELIMITER: &[u8] = b"###END###";

/// Size of the length header for length-prefix framing.
const LENGTH_PREFIX_SIZE: usize = 4;

/// Errors that can occur while embedding or extracting.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StegoError {
    #[error("Carrier too small to hide data: need {needed} bytes, have capacity for {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    #[error("No hidden data found in carrier")]
    NoHiddenData,

    #[error("Payload contains the end-of-data delimiter; use length-prefix framing")]
    PayloadContainsDelimiter,

    #[error("Invalid pixel grid: {0}")]
    InvalidGrid(String),
}

/// How the end of the payload is marked inside the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// Payload followed by [`DELIMITER`].
    #[default]
    Delimiter,
    /// 4-byte big-endian length followed by the payload.
    LengthPrefix,
}

impl Framing {
    /// Bytes the framing adds around a payload.
    pub fn overhead(self) -> usize {
        match self {
            Framing::Delimiter => DELIMITER.len(),
            Framing::LengthPrefix => LENGTH_PREFIX_SIZE,
        }
    }

    fn frame(self, payload: &[u8]) -> Result<Vec<u8>, StegoError> {
        let mut framed = Vec::with_capacity(payload.len() + self.overhead());
        match self {
            Framing::Delimiter => {
                framed.extend_from_slice(payload);
                framed.extend_from_slice(DELIMITER);
                // A payload ending in a delimiter prefix would complete an
                // earlier match with the appended marker
                if find(&framed, DELIMITER) != Some(payload.len()) {
                    return Err(StegoError::PayloadContainsDelimiter);
                }
            }
            Framing::LengthPrefix => {
                let len = u32::try_from(payload.len()).map_err(|_| {
                    StegoError::CapacityExceeded {
                        needed: payload.len(),
                        capacity: u32::MAX as usize,
                    }
                })?;
                framed.extend_from_slice(&len.to_be_bytes());
                framed.extend_from_slice(payload);
            }
        }
        Ok(framed)
    }
}

impl std::str::FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "delimiter" => Ok(Framing::Delimiter),
            "length-prefix" | "length" => Ok(Framing::LengthPrefix),
            other => Err(format!(
                "unknown framing '{}', expected 'delimiter' or 'length-prefix'",
                other
            )),
        }
    }
}

impl std::fmt::Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framing::Delimiter => f.write_str("delimiter"),
            Framing::LengthPrefix => f.write_str("length-prefix"),
        }
    }
}

/// A rectangular grid of 8-bit samples, row-major and channel-minor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

impl PixelGrid {
    /// Builds a grid, checking that the sample count matches the shape.
    pub fn new(width: u32, height: u32, channels: u8, samples: Vec<u8>) -> Result<Self, StegoError> {
        if !(1..=4).contains(&channels) {
            return Err(StegoError::InvalidGrid(format!(
                "channel count must be 1 to 4, got {}",
                channels
            )));
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels as usize))
            .ok_or_else(|| StegoError::InvalidGrid("dimensions overflow".to_string()))?;
        if samples.len() != expected {
            return Err(StegoError::InvalidGrid(format!(
                "{}x{}x{} needs {} samples, got {}",
                width,
                height,
                channels,
                expected,
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// All samples in traversal order.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Consumes the grid and returns its samples.
    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Whole bytes that fit in the LSBs, before framing.
    fn raw_capacity(&self) -> usize {
        self.samples.len() / 8
    }
}

/// Usable payload bytes for `grid` under `framing`.
pub fn capacity(grid: &PixelGrid, framing: Framing) -> usize {
    grid.raw_capacity().saturating_sub(framing.overhead())
}

/// Embeds `payload` into a copy of `grid`.
///
/// Fails before touching any sample if the framed payload does not fit.
pub fn embed(grid: &PixelGrid, payload: &[u8], framing: Framing) -> Result<PixelGrid, StegoError> {
    let framed = framing.frame(payload)?;
    if framed.len() > grid.raw_capacity() {
        return Err(StegoError::CapacityExceeded {
            needed: payload.len(),
            capacity: capacity(grid, framing),
        });
    }

    let mut samples = grid.samples.clone();
    let bits = framed
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1));
    for (sample, bit) in samples.iter_mut().zip(bits) {
        *sample = (*sample & 0xFE) | bit;
    }

    Ok(PixelGrid {
        width: grid.width,
        height: grid.height,
        channels: grid.channels,
        samples,
    })
}

/// Extracts a payload previously written by [`embed`] with the same framing.
pub fn extract(grid: &PixelGrid, framing: Framing) -> Result<Vec<u8>, StegoError> {
    let mut bytes = read_lsb_bytes(grid);

    match framing {
        Framing::Delimiter => {
            let end = find(&bytes, DELIMITER).ok_or(StegoError::NoHiddenData)?;
            bytes.truncate(end);
            Ok(bytes)
        }
        Framing::LengthPrefix => {
            if bytes.len() < LENGTH_PREFIX_SIZE {
                return Err(StegoError::NoHiddenData);
            }
            let mut len_bytes = [0u8; LENGTH_PREFIX_SIZE];
            len_bytes.copy_from_slice(&bytes[..LENGTH_PREFIX_SIZE]);
            let len = u32::from_be_bytes(len_bytes) as usize;

            if len > bytes.len() - LENGTH_PREFIX_SIZE {
                return Err(StegoError::NoHiddenData);
            }
            Ok(bytes[LENGTH_PREFIX_SIZE..LENGTH_PREFIX_SIZE + len].to_vec())
        }
    }
}

/// Reassembles every complete byte from the sample LSBs.
fn read_lsb_bytes(grid: &PixelGrid) -> Vec<u8> {
    grid.samples
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, sample| (acc << 1) | (sample & 1)))
        .collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
