//! Image file <-> [`PixelGrid`] conversion.
//!
//! 8-bit grayscale, grayscale+alpha, RGB and RGBA images keep their channel
//! count; every other pixel format is converted to RGBA8 on load. Only
//! lossless formats (PNG, BMP, TIFF, ...) preserve hidden data.

use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::codec::{PixelGrid, StegoError};

/// Suffix appended to the carrier stem for the default output file.
const OUTPUT_SUFFIX: &str = "_stego";

/// Extension used when the carrier's own format would lose the payload.
const FALLBACK_EXTENSION: &str = "png";

/// Errors that can occur while reading or writing carrier images.
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("Image load error: {0}")]
    ImageLoadError(String),

    #[error("Image save error: {0}")]
    ImageSaveError(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid pixel data: {0}")]
    InvalidGrid(#[from] StegoError),
}

/// Decodes an image file into a pixel grid.
pub fn load_grid<P: AsRef<Path>>(path: P) -> Result<PixelGrid, ImageIoError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|e| ImageIoError::ImageLoadError(e.to_string()))?;
    let grid = image_to_grid(image)?;

    debug!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        channels = grid.channels(),
        "loaded carrier"
    );
    Ok(grid)
}

/// Encodes a pixel grid to `path`, choosing the format from the extension.
pub fn save_grid<P: AsRef<Path>>(grid: &PixelGrid, path: P) -> Result<(), ImageIoError> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)
        .map_err(|_| ImageIoError::UnsupportedFormat(path.display().to_string()))?;
    if is_lossy(format) {
        warn!(
            path = %path.display(),
            "saving to a lossy format destroys hidden data, use PNG or BMP"
        );
    }

    grid_to_image(grid)?
        .save_with_format(path, format)
        .map_err(|e| ImageIoError::ImageSaveError(e.to_string()))?;

    debug!(path = %path.display(), ?format, "saved stego image");
    Ok(())
}

/// Default output path for a carrier: `<stem>_stego.<ext>` next to it.
///
/// Lossy or unknown extensions are replaced by `.png`.
pub fn default_output_path<P: AsRef<Path>>(carrier: P) -> PathBuf {
    let carrier = carrier.as_ref();
    let stem = carrier
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let extension = carrier
        .extension()
        .and_then(|ext| {
            ImageFormat::from_extension(ext)
                .filter(|format| !is_lossy(*format))
                .map(|_| ext.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

    carrier.with_file_name(format!("{}{}.{}", stem, OUTPUT_SUFFIX, extension))
}

fn is_lossy(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Jpeg)
}

fn image_to_grid(image: DynamicImage) -> Result<PixelGrid, ImageIoError> {
    let (width, height, channels, samples) = match image {
        DynamicImage::ImageLuma8(buf) => (buf.width(), buf.height(), 1, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (buf.width(), buf.height(), 2, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (buf.width(), buf.height(), 3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (buf.width(), buf.height(), 4, buf.into_raw()),
        other => {
            let buf = other.to_rgba8();
            (buf.width(), buf.height(), 4, buf.into_raw())
        }
    };
    Ok(PixelGrid::new(width, height, channels, samples)?)
}

fn grid_to_image(grid: &PixelGrid) -> Result<DynamicImage, ImageIoError> {
    let (width, height) = (grid.width(), grid.height());
    let samples = grid.samples().to_vec();
    let mismatch = || ImageIoError::ImageSaveError("sample count does not match dimensions".into());

    let image = match grid.channels() {
        1 => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples).ok_or_else(mismatch)?),
        2 => DynamicImage::ImageLumaA8(
            GrayAlphaImage::from_raw(width, height, samples).ok_or_else(mismatch)?,
        ),
        3 => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, samples).ok_or_else(mismatch)?),
        4 => DynamicImage::ImageRgba8(RgbaImage::from_raw(width, height, samples).ok_or_else(mismatch)?),
        n => {
            return Err(ImageIoError::InvalidGrid(StegoError::InvalidGrid(format!(
                "unsupported channel count {}",
                n
            ))))
        }
    };
    Ok(image)
}
