//! OME-XML document builder.
//!
//! All inputs are validated before any element is created, so a failed build
//! never yields a partial document.

use serde::Serialize;
use tracing::debug;

use crate::error::OmeError;

use super::document::{Element, OmeXmlDocument};
use super::metadata::{ImageMetadata, RGB_SAMPLES_PER_PIXEL};
use super::vendor::extract_vendor_fields;

// =============================================================================
// Constants
// =============================================================================

/// OME schema namespace.
pub const OME_NAMESPACE: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// `xsi:schemaLocation` of the OME 2016-06 schema.
pub const OME_SCHEMA_LOCATION: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06 \
     http://www.openmicroscopy.org/Schemas/OME/2016-06/ome.xsd";

/// Comment placed ahead of the root element.
pub const OME_XML_COMMENT: &str = "Warning: this comment is an OME-XML metadata block, which \
     contains crucial dimensional parameters and other important metadata. Please edit \
     cautiously (if at all), and back up the original data before doing so. For more \
     information, see the OME-TIFF documentation: \
     https://docs.openmicroscopy.org/latest/ome-model/ome-tiff/";

/// Unit symbol of physical pixel sizes.
pub const MICROMETER: &str = "µm";

/// Default pyramid tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Namespace of original-metadata entries, as written by Bio-Formats.
pub const ORIGINAL_METADATA_NAMESPACE: &str = "openmicroscopy.org/OriginalMetadata";

/// ID of the pyramid resolution map annotation.
const RESOLUTION_ANNOTATION_ID: &str = "Annotation:Resolution:0";

// =============================================================================
// Pyramid Resolutions
// =============================================================================

/// Parameters of the pyramidal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidOutputSpec {
    /// Tile edge in pixels; halving stops once both dimensions fit
    pub tile_size: u32,
}

impl PyramidOutputSpec {
    pub const fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }
}

impl Default for PyramidOutputSpec {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

/// One sub-resolution of the output pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolutionLevel {
    /// 1-based layer index (layer 0 is the full-resolution image)
    pub layer: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the sub-resolutions of a pyramid.
///
/// Both dimensions are halved (floor division) while either exceeds
/// `tile_size`. Odd dimensions therefore drift slightly from what a tiler
/// rounding up would produce.
///
/// # Example
///
/// ```
/// use slide_ome::ome::resolution_levels;
///
/// let levels = resolution_levels(2048, 2048, 512).unwrap();
/// assert_eq!(levels.len(), 2);
/// assert_eq!((levels[1].width, levels[1].height), (512, 512));
/// ```
pub fn resolution_levels(
    width: u32,
    height: u32,
    tile_size: u32,
) -> Result<Vec<ResolutionLevel>, OmeError> {
    if tile_size == 0 {
        return Err(OmeError::InvalidTileSize(tile_size));
    }

    let mut levels = Vec::new();
    let (mut width, mut height) = (width, height);
    let mut layer = 0;

    // max(width, height) > tile_size >= 1 halves to a strictly smaller value
    while width > tile_size || height > tile_size {
        width /= 2;
        height /= 2;
        layer += 1;
        levels.push(ResolutionLevel {
            layer,
            width,
            height,
        });
    }

    Ok(levels)
}

// =============================================================================
// OmeMetadataBuilder
// =============================================================================

/// Builds the OME-XML description of a converted slide.
///
/// # Example
///
/// ```
/// use slide_ome::ome::{ImageMetadata, OmeMetadataBuilder, PyramidOutputSpec, RawFields, Vendor};
///
/// let mut fields = RawFields::new();
/// fields.insert("mirax.GENERAL.SlideId", "abc");
///
/// let image = ImageMetadata::new(2048, 2048, Vendor::Mirax).with_raw_fields(fields);
/// let doc = OmeMetadataBuilder::new()
///     .build(&image, Some(PyramidOutputSpec::new(512)))
///     .unwrap();
///
/// assert_eq!(doc.original_metadata(), vec![("SlideId".to_string(), "abc".to_string())]);
/// assert_eq!(doc.resolutions().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OmeMetadataBuilder {}

impl OmeMetadataBuilder {
    pub fn new() -> Self {
        Self {}
    }

    /// Build and serialize the document.
    ///
    /// # Errors
    ///
    /// - [`OmeError::UnsupportedChannelCount`] unless the image is 3-sample RGB
    /// - [`OmeError::InvalidDimensions`] if width or height is 0
    /// - [`OmeError::InvalidPhysicalSize`] for a non-positive or non-finite pixel size
    /// - [`OmeError::InvalidTileSize`] if the pyramid tile size is 0
    /// - [`OmeError::UnsupportedVendor`] for unrecognized vendors
    /// - [`OmeError::InvalidMetadataValue`] for non-string raw fields
    pub fn build(
        &self,
        image: &ImageMetadata,
        pyramid: Option<PyramidOutputSpec>,
    ) -> Result<OmeXmlDocument, OmeError> {
        if image.samples_per_pixel != RGB_SAMPLES_PER_PIXEL {
            return Err(OmeError::UnsupportedChannelCount(image.samples_per_pixel));
        }

        if image.width == 0 || image.height == 0 {
            return Err(OmeError::InvalidDimensions {
                width: image.width,
                height: image.height,
            });
        }

        let physical_size = image.physical_size();
        if let Some((x, y)) = physical_size {
            if !(x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0) {
                return Err(OmeError::InvalidPhysicalSize { x, y });
            }
        }

        let resolutions = match pyramid {
            Some(spec) => Some(resolution_levels(image.width, image.height, spec.tile_size)?),
            None => None,
        };

        let fields = extract_vendor_fields(&image.vendor, &image.raw_fields)?;

        let mut pixels = Element::new("Pixels")
            .with_attribute("ID", "Pixels:0")
            .with_attribute("DimensionOrder", "XYZCT")
            .with_attribute("Interleaved", "false")
            .with_attribute("SizeX", image.width.to_string())
            .with_attribute("SizeY", image.height.to_string())
            .with_attribute("SizeZ", "1")
            .with_attribute("SizeC", "1")
            .with_attribute("SizeT", "1")
            .with_attribute("SignificantBits", "8")
            .with_attribute("Type", "uint8");

        if let Some((x, y)) = physical_size {
            pixels.set_attribute("PhysicalSizeX", x.to_string());
            pixels.set_attribute("PhysicalSizeXUnit", MICROMETER);
            pixels.set_attribute("PhysicalSizeY", y.to_string());
            pixels.set_attribute("PhysicalSizeYUnit", MICROMETER);
        }

        pixels.push_child(
            Element::new("Channel")
                .with_attribute("ID", "Channel:0:0")
                .with_attribute("SamplesPerPixel", RGB_SAMPLES_PER_PIXEL.to_string())
                .with_child(Element::new("LightPath")),
        );
        pixels.push_child(Element::new("TiffData"));

        let mut annotations = Element::new("StructuredAnnotations");
        for (id, (key, value)) in fields.iter().enumerate() {
            annotations.push_child(original_metadata_annotation(id, key, value));
        }

        if let Some(resolutions) = &resolutions {
            annotations.push_child(resolution_annotation(resolutions));
        }

        let root = Element::new("OME")
            .with_attribute("xmlns", OME_NAMESPACE)
            .with_attribute("xmlns:xsi", XSI_NAMESPACE)
            .with_attribute("xsi:schemaLocation", OME_SCHEMA_LOCATION)
            .with_child(
                Element::new("Image")
                    .with_attribute("ID", "Image:0")
                    .with_child(pixels),
            )
            .with_child(annotations);

        debug!(
            "Built OME-XML for {}x{} {} image: {} annotations, {} resolutions",
            image.width,
            image.height,
            image.vendor,
            fields.len(),
            resolutions.as_ref().map_or(0, Vec::len)
        );

        OmeXmlDocument::from_tree(Some(OME_XML_COMMENT.to_string()), root)
    }
}

fn original_metadata_annotation(id: usize, key: &str, value: &str) -> Element {
    Element::new("XMLAnnotation")
        .with_attribute("ID", format!("Annotation:{}", id))
        .with_child(
            Element::new("Value").with_child(
                Element::new("OriginalMetadata")
                    .with_attribute("xmlns", ORIGINAL_METADATA_NAMESPACE)
                    .with_child(Element::new("Key").with_text(key))
                    .with_child(Element::new("Value").with_text(value)),
            ),
        )
}

fn resolution_annotation(resolutions: &[ResolutionLevel]) -> Element {
    let mut value = Element::new("Value");
    for level in resolutions {
        value.push_child(
            Element::new("M")
                .with_attribute("K", level.layer.to_string())
                .with_text(format!("{} {}", level.width, level.height)),
        );
    }

    Element::new("MapAnnotation")
        .with_attribute("ID", RESOLUTION_ANNOTATION_ID)
        .with_child(value)
}

// =============================================================================
// Tests
// =============================================================================
