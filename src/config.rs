//! Command-line configuration for slide-ome.
//!
//! This module provides the CLI surface of the `slide-ome` binary:
//! - Subcommands via clap derive
//! - Environment variables with `SLIDE_OME_` prefix for the tunable defaults
//! - A `validate()` step per subcommand, run before any file is touched
//!
//! # Environment Variables
//!
//! - `SLIDE_OME_TILE_SIZE` - Pyramid tile size (default: 512)
//! - `SLIDE_OME_THUMBNAIL_WIDTH` - Thumbnail / target width (default: 512)
//! - `SLIDE_OME_JPEG_QUALITY` - Thumbnail JPEG quality (default: 80)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::ThumbnailError;
use crate::ome::{PyramidOutputSpec, DEFAULT_TILE_SIZE};
use crate::thumbnail::{
    default_output_path, ThumbnailRequest, DEFAULT_THUMBNAIL_WIDTH, MAX_JPEG_QUALITY,
    MIN_JPEG_QUALITY,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// slide-ome - OME-XML metadata and thumbnails for Whole Slide Image conversion.
#[derive(Parser, Debug, Clone)]
#[command(name = "slide-ome")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the OME-XML description of a slide from its decoder properties.
    OmeXml(OmeXmlConfig),

    /// Print the pyramid level to decode for a target width.
    Level(LevelConfig),

    /// Downsample a decoded slide level into a thumbnail.
    Thumbnail(ThumbnailConfig),

    /// Show geometry and annotations of an OME-XML document.
    Inspect(InspectConfig),
}

// =============================================================================
// ome-xml
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct OmeXmlConfig {
    /// Slide properties: a JSON object or `openslide-show-properties` output.
    #[arg(value_name = "PROPERTIES")]
    pub properties: PathBuf,

    /// Output file. Writes to stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Describe a pyramidal output (adds the resolution map annotation).
    #[arg(short, long, default_value_t = false)]
    pub pyramid: bool,

    /// Tile size of the pyramidal output.
    #[arg(short, long, default_value_t = DEFAULT_TILE_SIZE, env = "SLIDE_OME_TILE_SIZE")]
    pub tile_size: u32,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl OmeXmlConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Pyramid parameters, if a pyramid was requested.
    pub fn pyramid_spec(&self) -> Option<PyramidOutputSpec> {
        self.pyramid.then(|| PyramidOutputSpec::new(self.tile_size))
    }
}

// =============================================================================
// level
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct LevelConfig {
    /// Slide properties: a JSON object or `openslide-show-properties` output.
    #[arg(value_name = "PROPERTIES")]
    pub properties: PathBuf,

    /// Target width in pixels.
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_THUMBNAIL_WIDTH,
        env = "SLIDE_OME_THUMBNAIL_WIDTH"
    )]
    pub size: u32,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl LevelConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.size == 0 {
            return Err("size must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// thumbnail
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ThumbnailConfig {
    /// Converted OME-TIFF, or a decoded slide level in any other image format.
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Horizontal size of the resulting image.
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_THUMBNAIL_WIDTH,
        env = "SLIDE_OME_THUMBNAIL_WIDTH"
    )]
    pub size: u32,

    /// JPEG quality (1-100).
    #[arg(short, long, env = "SLIDE_OME_JPEG_QUALITY")]
    pub quality: Option<u8>,

    /// Output file. Defaults to the image name prefixed with `th_`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ThumbnailConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.size == 0 {
            return Err("size must be greater than 0".to_string());
        }
        if let Some(q) = self.quality {
            if !(MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&q) {
                return Err("quality must be between 1 and 100".to_string());
            }
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.image))
    }

    pub fn request(&self) -> Result<ThumbnailRequest, ThumbnailError> {
        ThumbnailRequest::new(self.size, self.quality, self.verbose)
    }
}

// =============================================================================
// inspect
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    /// OME-XML document.
    #[arg(value_name = "OME_XML")]
    pub document: PathBuf,

    /// Print a JSON report instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
