//! Steganography: hiding byte blobs in image pixel samples.
//!
//! - [`codec`]: LSB embedding over an in-memory [`PixelGrid`]
//! - [`image`]: loading and saving carrier files (PNG, BMP, ...)

pub mod codec;
pub mod image;

pub use codec::{capacity, embed, extract, Framing, PixelGrid, StegoError, DELIMITER};
pub use image::{default_output_path, load_grid, save_grid, ImageIoError};
