//! Thumbnail requests.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, info};

use crate::error::ThumbnailError;
use crate::pyramid::{choose_level, PyramidLevel};

/// Default thumbnail width in pixels.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 512;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Prefix of default thumbnail file names.
pub const THUMBNAIL_PREFIX: &str = "th_";

// =============================================================================
// ThumbnailRequest
// =============================================================================

/// Parameters of one thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailRequest {
    target_width: u32,
    quality: Option<u8>,
    verbose: bool,
}

impl ThumbnailRequest {
    /// Validate and create a request.
    ///
    /// # Errors
    ///
    /// - [`ThumbnailError::InvalidWidth`] if `target_width` is 0
    /// - [`ThumbnailError::InvalidQuality`] if `quality` is outside 1-100
    pub fn new(
        target_width: u32,
        quality: Option<u8>,
        verbose: bool,
    ) -> Result<Self, ThumbnailError> {
        if target_width == 0 {
            return Err(ThumbnailError::InvalidWidth);
        }

        if let Some(q) = quality {
            if !(MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&q) {
                return Err(ThumbnailError::InvalidQuality(q));
            }
        }

        Ok(Self {
            target_width,
            quality,
            verbose,
        })
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    pub fn quality(&self) -> Option<u8> {
        self.quality
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Requested quality, or [`DEFAULT_JPEG_QUALITY`].
    pub fn jpeg_quality(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_JPEG_QUALITY)
    }

    /// Pick the pyramid level to decode for this thumbnail.
    pub fn select_level(&self, levels: &[PyramidLevel]) -> Result<usize, ThumbnailError> {
        Ok(choose_level(levels, self.target_width)?)
    }

    /// Downsample a decoded level to the target width.
    ///
    /// The aspect ratio is kept. A source narrower than the target is rejected
    /// with [`crate::error::PyramidError::NoSuitableLevel`].
    pub fn render(&self, source: &DynamicImage) -> Result<DynamicImage, ThumbnailError> {
        // A decoded level is a one-level pyramid
        self.select_level(&[PyramidLevel::new(0, source.width())])?;

        if source.width() == self.target_width {
            debug!("Source already {}px wide, skipping resize", self.target_width);
            return Ok(source.clone());
        }

        let height = thumbnail_height(source.width(), source.height(), self.target_width);
        if self.verbose {
            info!(
                "Resizing {}x{} to {}x{}",
                source.width(),
                source.height(),
                self.target_width,
                height
            );
        }

        Ok(source.resize_exact(self.target_width, height, FilterType::Triangle))
    }
}

/// Height of a thumbnail keeping the source aspect ratio, at least 1 pixel.
pub fn thumbnail_height(source_width: u32, source_height: u32, target_width: u32) -> u32 {
    if source_width == 0 {
        return 1;
    }
    let scale = target_width as f64 / source_width as f64;
    ((source_height as f64 * scale).round() as u32).max(1)
}

/// Default thumbnail path: the source file name prefixed with `th_`, next to the source.
pub fn default_output_path(original: &Path) -> PathBuf {
    let name = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    original.with_file_name(format!("{THUMBNAIL_PREFIX}{name}"))
}
