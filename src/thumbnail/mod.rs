//! Slide thumbnails.
//!
//! A thumbnail is produced by decoding the cheapest sufficient pyramid level
//! (see [`crate::pyramid::choose_level`]) and downsampling it to the target
//! width with a linear filter. Thumbnails are never upsampled.
//!
//! # Components
//!
//! - [`ThumbnailRequest`]: validated target width, quality and verbosity
//! - [`open_image`]: decodes a source; converted OME-TIFFs have their RGB
//!   planes joined by [`open_planar_ome_tiff`]
//! - [`encode_jpeg`]: JPEG encoding at a given quality
//! - [`save_thumbnail`]: writes a thumbnail, picking the format from the extension

mod render;
mod request;

pub use render::{encode_jpeg, open_image, open_planar_ome_tiff, save_thumbnail, OME_TIFF_PAGES};
pub use request::{
    default_output_path, thumbnail_height, ThumbnailRequest, DEFAULT_JPEG_QUALITY,
    DEFAULT_THUMBNAIL_WIDTH, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY, THUMBNAIL_PREFIX,
};
