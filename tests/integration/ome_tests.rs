//! OME-XML integration tests.
//!
//! Tests verify:
//! - Documents built from decoder properties for each supported vendor
//! - Serialized documents parse back to the same geometry and annotations
//! - Pyramid resolution maps
//! - Build failures leave no output

use slide_ome::ome::{OME_NAMESPACE, OME_XML_COMMENT};
use slide_ome::{
    ImageMetadata, OmeError, OmeMetadataBuilder, OmeXmlDocument, PyramidOutputSpec, RawFields,
    ResolutionLevel, Vendor,
};

use super::test_utils::{properties, APERIO_JSON, HAMAMATSU_JSON, MIRAX_SHOW_PROPERTIES};

fn build(image: &ImageMetadata, pyramid: Option<PyramidOutputSpec>) -> OmeXmlDocument {
    OmeMetadataBuilder::new()
        .build(image, pyramid)
        .expect("build should succeed")
}

// =============================================================================
// Vendor Documents
// =============================================================================

#[test]
fn test_mirax_document() {
    let image = properties(MIRAX_SHOW_PROPERTIES).image_metadata().unwrap();
    let doc = build(&image, None);

    let pixels = doc.pixels().unwrap();
    assert_eq!((pixels.size_x, pixels.size_y), (86272, 187392));
    let mpp = pixels.physical_size_x.unwrap();
    assert!((mpp - 0.243094).abs() < 1e-9);

    // Only the GENERAL section is exported
    let metadata = doc.original_metadata();
    let keys: Vec<&str> = metadata.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "CURRENT_SLIDE_VERSION",
            "SLIDE_ID",
            "SLIDE_NAME",
            "OBJECTIVE_MAGNIFICATION"
        ]
    );
    assert_eq!(metadata[2].1, "CRC-017");
}

#[test]
fn test_mirax_slide_id_annotation() {
    let mut fields = RawFields::new();
    fields.insert("mirax.GENERAL.SlideId", "abc");
    let image = ImageMetadata::new(1000, 800, Vendor::Mirax).with_raw_fields(fields);

    let doc = build(&image, None);
    assert_eq!(
        doc.original_metadata(),
        vec![("SlideId".to_string(), "abc".to_string())]
    );

    let xml = doc.as_str();
    assert!(xml.contains("<XMLAnnotation ID=\"Annotation:0\">"));
    assert!(xml.contains("<Key>SlideId</Key>"));
    assert!(xml.contains("<Value>abc</Value>"));
}

#[test]
fn test_aperio_document() {
    let image = properties(APERIO_JSON).image_metadata().unwrap();
    let doc = build(&image, None);

    let metadata = doc.original_metadata();
    assert_eq!(metadata.len(), 4);
    assert_eq!(metadata[0], ("AppMag".to_string(), "20".to_string()));
    assert_eq!(metadata[3].0, "ScanScope ID");

    let pixels = doc.pixels().unwrap();
    assert_eq!(pixels.physical_size_x, Some(0.499));
    assert_eq!(pixels.physical_size_y, Some(0.499));
    assert_eq!(pixels.physical_size_unit.as_deref(), Some("µm"));
}

#[test]
fn test_hamamatsu_document_escapes_values() {
    let image = properties(HAMAMATSU_JSON).image_metadata().unwrap();
    let doc = build(&image, None);

    assert!(doc.as_str().contains("slide &lt;7&gt; &amp; co"));

    let pixels = doc.pixels().unwrap();
    assert_eq!(pixels.physical_size_x, None);
    assert!(!doc.as_str().contains("PhysicalSizeX"));

    let parsed = OmeXmlDocument::parse(doc.as_bytes().to_vec()).unwrap();
    assert_eq!(
        parsed.original_metadata()[1],
        ("Reference".to_string(), "slide <7> & co".to_string())
    );
}

#[test]
fn test_unknown_vendor_fails() {
    let image = properties(
        r#"{"openslide.vendor": "unknown", "openslide.level[0].width": "10", "openslide.level[0].height": "10"}"#,
    )
    .image_metadata()
    .unwrap();

    let err = OmeMetadataBuilder::new().build(&image, None).unwrap_err();
    assert_eq!(err, OmeError::UnsupportedVendor("unknown".to_string()));
}

#[test]
fn test_numeric_property_fails() {
    // JSON numbers are fine for geometry but not as annotation values
    let image = properties(
        r#"{"openslide.vendor": "aperio", "openslide.level[0].width": 10, "openslide.level[0].height": "10"}"#,
    )
    .image_metadata()
    .unwrap();

    let err = OmeMetadataBuilder::new().build(&image, None).unwrap_err();
    assert_eq!(
        err,
        OmeError::InvalidMetadataValue {
            key: "openslide.level[0].width".to_string(),
            found: "number".to_string(),
        }
    );
}

// =============================================================================
// Pyramid Resolutions
// =============================================================================

#[test]
fn test_resolution_map_for_2048_square() {
    let image = properties(HAMAMATSU_JSON).image_metadata().unwrap();
    let doc = build(&image, Some(PyramidOutputSpec::new(512)));

    assert_eq!(
        doc.resolutions().unwrap(),
        vec![
            ResolutionLevel {
                layer: 1,
                width: 1024,
                height: 1024,
            },
            ResolutionLevel {
                layer: 2,
                width: 512,
                height: 512,
            },
        ]
    );

    let xml = doc.as_str();
    assert!(xml.contains("<MapAnnotation ID=\"Annotation:Resolution:0\">"));
    assert!(xml.contains("<M K=\"1\">1024 1024</M>"));
    assert!(xml.contains("<M K=\"2\">512 512</M>"));
}

#[test]
fn test_resolution_map_follows_annotations() {
    let image = properties(MIRAX_SHOW_PROPERTIES).image_metadata().unwrap();
    let doc = build(&image, Some(PyramidOutputSpec::default()));

    let annotations = doc.root().child("StructuredAnnotations").unwrap();
    let names: Vec<&str> = annotations.elements().map(|e| e.local_name()).collect();
    assert_eq!(names.last(), Some(&"MapAnnotation"));
    assert_eq!(names.iter().filter(|n| **n == "XMLAnnotation").count(), 4);

    // 187392 halves 9 times to reach 366
    let resolutions = doc.resolutions().unwrap();
    assert_eq!(resolutions.len(), 9);
    let last = resolutions.last().unwrap();
    assert_eq!((last.width, last.height), (168, 366));
}

#[test]
fn test_zero_tile_size_fails() {
    let image = properties(HAMAMATSU_JSON).image_metadata().unwrap();
    let err = OmeMetadataBuilder::new()
        .build(&image, Some(PyramidOutputSpec::new(0)))
        .unwrap_err();
    assert_eq!(err, OmeError::InvalidTileSize(0));
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn test_round_trip_preserves_document() {
    let image = properties(APERIO_JSON).image_metadata().unwrap();
    let doc = build(&image, Some(PyramidOutputSpec::new(256)));

    let parsed = OmeXmlDocument::parse(doc.clone().into_bytes()).unwrap();
    assert_eq!(parsed.root(), doc.root());
    assert_eq!(parsed.comment(), Some(OME_XML_COMMENT));
    assert_eq!(parsed.pixels().unwrap(), doc.pixels().unwrap());
    assert_eq!(parsed.pixels().unwrap().size_x, image.width);
    assert_eq!(parsed.pixels().unwrap().size_y, image.height);
}

#[test]
fn test_document_header() {
    let image = properties(HAMAMATSU_JSON).image_metadata().unwrap();
    let doc = build(&image, None);
    let xml = doc.as_str();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains(&format!("xmlns=\"{}\"", OME_NAMESPACE)));
    assert!(xml.find("<!--").unwrap() < xml.find("<OME").unwrap());
}

#[test]
fn test_reads_prefixed_documents() {
    // Layout written by ElementTree with a registered OME prefix
    let xml = r#"<OME:OME xmlns:OME="http://www.openmicroscopy.org/Schemas/OME/2016-06">
  <OME:Image ID="Image:0">
    <OME:Pixels ID="Pixels:0" DimensionOrder="XYCZT" SizeX="46000" SizeY="32914" SizeC="3" SizeZ="1" SizeT="1" Type="uint8"/>
  </OME:Image>
  <OME:StructuredAnnotations>
    <OME:XMLAnnotation ID="Annotation:0">
      <OME:Value><OriginalMetadata><Key>AppMag</Key><Value>20</Value></OriginalMetadata></OME:Value>
    </OME:XMLAnnotation>
  </OME:StructuredAnnotations>
</OME:OME>"#;

    let doc = OmeXmlDocument::parse(xml.as_bytes().to_vec()).unwrap();
    assert_eq!(doc.pixels().unwrap().size_x, 46000);
    assert_eq!(
        doc.original_metadata(),
        vec![("AppMag".to_string(), "20".to_string())]
    );
    assert!(doc.resolutions().unwrap().is_empty());
}
