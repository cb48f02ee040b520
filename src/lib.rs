//! # slide-ome
//!
//! Decision logic for converting Whole Slide Images (MIRAX, Aperio,
//! Hamamatsu) into pyramidal OME-TIFF files.
//!
//! Pixel decoding, pyramidal tiling and TIFF writing are left to dedicated
//! tools. This library covers the parts of a conversion that need actual
//! decisions:
//!
//! - **Level selection**: pick the cheapest pyramid level that can be
//!   downsampled to a target width without upsampling
//! - **OME-XML synthesis**: describe the output image, its calibration, the
//!   vendor's original metadata and the pyramid resolutions in a document
//!   conforming to the OME 2016-06 schema
//! - **Thumbnails**: downsample a decoded level to a preview image
//!
//! ## Architecture
//!
//! - [`pyramid`] - Pyramid levels and level selection
//! - [`ome`] - OME-XML builder, element tree and document inspection
//! - [`slide`] - Adapter for the property maps reported by slide decoders
//! - [`thumbnail`] - Thumbnail requests, resizing and encoding
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust
//! use slide_ome::{OmeMetadataBuilder, PyramidOutputSpec, SlideProperties};
//!
//! let properties = SlideProperties::parse(r#"{
//!     "openslide.vendor": "mirax",
//!     "openslide.level-count": "2",
//!     "openslide.level[0].width": "2048",
//!     "openslide.level[0].height": "2048",
//!     "openslide.level[1].width": "1024",
//!     "mirax.GENERAL.SlideId": "abc"
//! }"#).unwrap();
//!
//! // Decode level 1 for a 512px thumbnail
//! assert_eq!(properties.levels().unwrap().choose(512).unwrap(), 1);
//!
//! let image = properties.image_metadata().unwrap();
//! let document = OmeMetadataBuilder::new()
//!     .build(&image, Some(PyramidOutputSpec::new(512)))
//!     .unwrap();
//! assert!(document.as_str().contains("<Key>SlideId</Key>"));
//! ```

pub mod config;
pub mod error;
pub mod ome;
pub mod pyramid;
pub mod slide;
pub mod thumbnail;

// Re-export commonly used types
pub use config::{Cli, Command, InspectConfig, LevelConfig, OmeXmlConfig, ThumbnailConfig};
pub use error::{OmeError, PyramidError, SlideError, ThumbnailError};
pub use ome::{
    extract_vendor_fields, resolution_levels, Element, ImageMetadata, OmeMetadataBuilder,
    OmeXmlDocument, PixelsGeometry, PyramidOutputSpec, RawFields, ResolutionLevel, Vendor,
    DEFAULT_TILE_SIZE,
};
pub use pyramid::{choose_level, LevelSelector, PyramidLevel};
pub use slide::SlideProperties;
pub use thumbnail::{encode_jpeg, save_thumbnail, ThumbnailRequest, DEFAULT_JPEG_QUALITY};
