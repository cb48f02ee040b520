//! Test utilities for integration tests.
//!
//! Fixtures mimic the property maps OpenSlide reports for real scanners, plus
//! synthetic decoded levels for thumbnail tests.

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use tiff::encoder::{colortype, TiffEncoder};

use slide_ome::SlideProperties;

// =============================================================================
// Property Fixtures
// =============================================================================

/// Properties of a MIRAX slide in `openslide-show-properties` format.
pub const MIRAX_SHOW_PROPERTIES: &str = "\
mirax.GENERAL.CURRENT_SLIDE_VERSION: '1.9'
mirax.GENERAL.SLIDE_ID: '8E0D2E7A-F3C3-4B31-A3B1-5F0A2C7D1E42'
mirax.GENERAL.SLIDE_NAME: 'CRC-017'
mirax.GENERAL.OBJECTIVE_MAGNIFICATION: '20'
mirax.NONHIERLAYER_0_SECTION.SCANNER_HARDWARE_VERSION: '2.0'
openslide.level-count: '4'
openslide.level[0].height: '187392'
openslide.level[0].width: '86272'
openslide.level[1].height: '93696'
openslide.level[1].width: '43136'
openslide.level[2].height: '46848'
openslide.level[2].width: '21568'
openslide.level[3].height: '23424'
openslide.level[3].width: '10784'
openslide.mpp-x: '0.24309399999999999'
openslide.mpp-y: '0.24309399999999999'
openslide.vendor: 'mirax'
";

/// Properties of an Aperio slide as a JSON object.
pub const APERIO_JSON: &str = r#"{
    "aperio.AppMag": "20",
    "aperio.Filename": "CMU-1",
    "aperio.MPP": "0.4990",
    "aperio.ScanScope ID": "CPAPERIOCS",
    "openslide.level-count": "3",
    "openslide.level[0].width": "46000",
    "openslide.level[0].height": "32914",
    "openslide.level[1].width": "11500",
    "openslide.level[1].height": "8228",
    "openslide.level[2].width": "2875",
    "openslide.level[2].height": "2057",
    "openslide.mpp-x": "0.499",
    "openslide.mpp-y": "0.499",
    "openslide.vendor": "aperio",
    "tiff.ImageDescription": "Aperio Image Library v10.0.51\r\n46920x33014 [0,100 46000x32914] (256x256) JPEG/RGB Q=30|AppMag = 20|MPP = 0.4990"
}"#;

/// Properties of a Hamamatsu slide without calibration.
pub const HAMAMATSU_JSON: &str = r#"{
    "openslide.vendor": "hamamatsu",
    "openslide.level-count": "2",
    "openslide.level[0].width": "2048",
    "openslide.level[0].height": "2048",
    "openslide.level[1].width": "512",
    "openslide.level[1].height": "512",
    "hamamatsu.SourceLens": "40",
    "hamamatsu.Reference": "slide <7> & co"
}"#;

pub fn properties(text: &str) -> SlideProperties {
    SlideProperties::parse(text).expect("fixture properties should parse")
}

// =============================================================================
// Image Fixtures
// =============================================================================

/// A gradient RGB image standing in for a decoded slide level.
pub fn decoded_level(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

/// A decoded level with an alpha channel, as OpenSlide reports it.
pub fn decoded_level_with_alpha(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 200, 255])
    }))
}

/// A planar OME-TIFF as written by the converter: `pages` 8-bit pages where
/// page 0, 1 and 2 hold constant red, green and blue planes.
pub fn planar_ome_tiff(width: u32, height: u32, pages: usize, rgb: [u8; 3]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    let mut encoder = TiffEncoder::new(&mut buf).expect("TIFF encoder should start");
    for page in 0..pages {
        let value = rgb.get(page).copied().unwrap_or(0);
        let data = vec![value; (width * height) as usize];
        encoder
            .write_image::<colortype::Gray8>(width, height, &data)
            .expect("TIFF page encoding should succeed");
    }
    drop(encoder);
    buf.into_inner()
}

/// Encode an image as PNG bytes.
pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("PNG encoding should succeed");
    buf.into_inner()
}

/// Check JPEG magic bytes.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 4
        && data[0] == 0xFF
        && data[1] == 0xD8
        && data[data.len() - 2] == 0xFF
        && data[data.len() - 1] == 0xD9
}
