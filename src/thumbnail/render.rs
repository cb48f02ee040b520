//! Thumbnail decoding and encoding.
//!
//! # Sources
//!
//! TIFF sources are converted slides: planar OME-TIFFs with one 8-bit page
//! per plane, where the first three pages are the red, green and blue planes.
//! Any other source is decoded with the `image` crate's format detection.
//!
//! # Output
//!
//! JPEG output is always encoded as 3-channel RGB; any alpha channel reported
//! by the decoder is dropped. Other output formats are written by the `image`
//! crate's format detection on the file extension.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use tracing::debug;

use crate::error::ThumbnailError;

use super::request::{MAX_JPEG_QUALITY, MIN_JPEG_QUALITY};

/// Number of top-level pages in a converted slide.
pub const OME_TIFF_PAGES: usize = 6;

/// Leading pages holding the red, green and blue planes.
const RGB_PAGES: usize = 3;

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn is_tiff_path(path: &Path) -> bool {
    has_extension(path, &["tif", "tiff"])
}

/// Decode a thumbnail source.
///
/// TIFF files go through [`open_planar_ome_tiff`]; anything else is decoded
/// as a single image.
pub fn open_image(path: &Path) -> Result<DynamicImage, ThumbnailError> {
    if is_tiff_path(path) {
        return open_planar_ome_tiff(path);
    }

    image::open(path).map_err(|e| ThumbnailError::DecodeError {
        message: format!("{}: {}", path.display(), e),
    })
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    Decoder::new(BufReader::new(file)).map_err(|e| e.to_string())
}

/// Count the pages of the main IFD chain without decoding pixel data.
fn count_pages<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<usize, String> {
    let mut pages = 1;
    while decoder.more_images() {
        decoder.next_image().map_err(|e| e.to_string())?;
        pages += 1;
    }
    Ok(pages)
}

fn read_gray_plane<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Vec<u8>, String> {
    match decoder.colortype().map_err(|e| e.to_string())? {
        ColorType::Gray(8) => {}
        other => return Err(format!("expected 8-bit grayscale pages, found {other:?}")),
    }

    match decoder.read_image().map_err(|e| e.to_string())? {
        DecodingResult::U8(data) => Ok(data),
        _ => Err("expected 8-bit samples".to_string()),
    }
}

/// Decode a converted slide into RGB by joining its first three pages.
///
/// # Errors
///
/// - [`ThumbnailError::InvalidPageCount`] unless the file has exactly
///   [`OME_TIFF_PAGES`] pages
/// - [`ThumbnailError::DecodeError`] if the planes are not 8-bit grayscale
///   pages of equal size
pub fn open_planar_ome_tiff(path: &Path) -> Result<DynamicImage, ThumbnailError> {
    let decode_error = |message: String| ThumbnailError::DecodeError {
        message: format!("{}: {}", path.display(), message),
    };

    let pages = open_decoder(path)
        .and_then(|mut decoder| count_pages(&mut decoder))
        .map_err(decode_error)?;
    if pages != OME_TIFF_PAGES {
        return Err(ThumbnailError::InvalidPageCount {
            expected: OME_TIFF_PAGES,
            found: pages,
        });
    }

    let mut decoder = open_decoder(path).map_err(decode_error)?;
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| decode_error(e.to_string()))?;

    let mut planes = Vec::with_capacity(RGB_PAGES);
    for page in 0..RGB_PAGES {
        if page > 0 {
            decoder
                .next_image()
                .map_err(|e| decode_error(e.to_string()))?;
        }

        let dimensions = decoder
            .dimensions()
            .map_err(|e| decode_error(e.to_string()))?;
        if dimensions != (width, height) {
            return Err(decode_error(format!(
                "page {} is {}x{}, expected {}x{}",
                page, dimensions.0, dimensions.1, width, height
            )));
        }

        planes.push(read_gray_plane(&mut decoder).map_err(decode_error)?);
    }

    let mut rgb = Vec::with_capacity(planes[0].len() * RGB_PAGES);
    for ((r, g), b) in planes[0].iter().zip(&planes[1]).zip(&planes[2]) {
        rgb.extend_from_slice(&[*r, *g, *b]);
    }

    let image = RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| decode_error("plane size does not match page dimensions".to_string()))?;

    debug!(
        "Joined {} planes of {}x{} from {}",
        RGB_PAGES,
        width,
        height,
        path.display()
    );
    Ok(DynamicImage::ImageRgb8(image))
}

/// Encode an image as RGB JPEG at the given quality (clamped to 1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Bytes, ThumbnailError> {
    let quality = quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY);
    let rgb = image.to_rgb8();

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| ThumbnailError::EncodeError {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}

fn is_jpeg_path(path: &Path) -> bool {
    has_extension(path, &["jpg", "jpeg"])
}

/// Write a thumbnail, choosing the format from the file extension.
///
/// `quality` only applies to JPEG output.
pub fn save_thumbnail(
    image: &DynamicImage,
    path: &Path,
    quality: u8,
) -> Result<(), ThumbnailError> {
    let to_error = |message: String| ThumbnailError::EncodeError {
        message: format!("{}: {}", path.display(), message),
    };

    if is_jpeg_path(path) {
        let data = encode_jpeg(image, quality)?;
        std::fs::write(path, &data).map_err(|e| to_error(e.to_string()))?;
    } else {
        image.save(path).map_err(|e| to_error(e.to_string()))?;
    }

    debug!(
        "Wrote {}x{} thumbnail to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}
