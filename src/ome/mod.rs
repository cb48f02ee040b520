//! OME-XML metadata synthesis.
//!
//! OME-TIFF files carry their structural metadata as an OME-XML document in
//! the ImageDescription tag of the first IFD. This module builds that document
//! from the geometry and vendor properties a slide decoder reports, and reads
//! it back for inspection.
//!
//! # Document Layout
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!-- warning comment -->
//! <OME>
//!   <Image ID="Image:0">
//!     <Pixels ID="Pixels:0" SizeX=.. SizeY=.. [PhysicalSizeX=.. ..]>
//!       <Channel ID="Channel:0:0" SamplesPerPixel="3"><LightPath/></Channel>
//!       <TiffData/>
//!     </Pixels>
//!   </Image>
//!   <StructuredAnnotations>
//!     <XMLAnnotation ID="Annotation:N"> .. OriginalMetadata Key/Value .. </XMLAnnotation>
//!     <MapAnnotation ID="Annotation:Resolution:0"> .. M K="layer" .. </MapAnnotation>
//!   </StructuredAnnotations>
//! </OME>
//! ```
//!
//! # Components
//!
//! - [`ImageMetadata`]: decoder-reported geometry, calibration and raw properties
//! - [`Vendor`]: scanner vendor tag, dispatching to a metadata extraction strategy
//! - [`OmeMetadataBuilder`]: assembles and serializes the document
//! - [`OmeXmlDocument`]: serialized bytes plus the parsed element tree

mod builder;
mod document;
mod metadata;
mod vendor;

pub use builder::{
    resolution_levels, OmeMetadataBuilder, PyramidOutputSpec, ResolutionLevel, DEFAULT_TILE_SIZE,
    MICROMETER, OME_NAMESPACE, OME_SCHEMA_LOCATION, OME_XML_COMMENT, ORIGINAL_METADATA_NAMESPACE,
};
pub use document::{Element, Node, OmeXmlDocument, PixelsGeometry};
pub use metadata::{ImageMetadata, RawFields, Vendor, RGB_SAMPLES_PER_PIXEL};
pub use vendor::extract_vendor_fields;
