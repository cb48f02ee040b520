//! Conversion pipeline integration tests.
//!
//! Tests verify the flow a conversion driver goes through for one slide:
//! decoder properties, level selection for the thumbnail, then the OME-XML
//! description of the converted image.

use slide_ome::{
    choose_level, LevelSelector, OmeMetadataBuilder, PyramidError, PyramidLevel,
    PyramidOutputSpec, SlideError, SlideProperties, Vendor,
};

use super::test_utils::{properties, APERIO_JSON, HAMAMATSU_JSON, MIRAX_SHOW_PROPERTIES};

// =============================================================================
// Level Selection
// =============================================================================

#[test]
fn test_reference_pyramid() {
    let levels = [
        PyramidLevel::new(0, 10000),
        PyramidLevel::new(1, 2000),
        PyramidLevel::new(2, 500),
    ];
    assert_eq!(choose_level(&levels, 1024).unwrap(), 1);
}

#[test]
fn test_single_level_too_small() {
    let err = choose_level(&[PyramidLevel::new(0, 500)], 1024).unwrap_err();
    assert!(matches!(err, PyramidError::NoSuitableLevel { .. }));
}

#[test]
fn test_mirax_thumbnail_level() {
    let levels = properties(MIRAX_SHOW_PROPERTIES).levels().unwrap();

    // 10784 is the narrowest level that still covers 512px
    assert_eq!(levels.choose(512).unwrap(), 3);
    assert_eq!(levels.choose(10785).unwrap(), 2);
    assert_eq!(levels.choose(86272).unwrap(), 0);
    assert!(levels.choose(86273).is_err());
}

#[test]
fn test_aperio_thumbnail_level() {
    let levels = properties(APERIO_JSON).levels().unwrap();
    assert_eq!(levels.choose(2875).unwrap(), 2);
    assert_eq!(levels.choose(2876).unwrap(), 1);
}

#[test]
fn test_selection_is_deterministic() {
    let a = LevelSelector::from_widths([(0, 4096), (1, 1024), (2, 1024)]).unwrap();
    let b = LevelSelector::from_widths([(2, 1024), (1, 1024), (0, 4096)]).unwrap();
    for target in [1, 512, 1024, 1025, 4096] {
        assert_eq!(a.choose(target).unwrap(), b.choose(target).unwrap());
    }
    assert_eq!(a.choose(1000).unwrap(), 1);
}

#[test]
fn test_broken_level_property() {
    let props = SlideProperties::parse(
        r#"{"openslide.level-count": "2", "openslide.level[0].width": "100", "openslide.level[1].width": "-5"}"#,
    )
    .unwrap();

    assert!(matches!(
        props.levels().unwrap_err(),
        SlideError::InvalidProperty { .. }
    ));
}

// =============================================================================
// Full Pipeline
// =============================================================================

#[test]
fn test_slides_are_independent() {
    let builder = OmeMetadataBuilder::new();
    let mut outputs = Vec::new();

    for text in [MIRAX_SHOW_PROPERTIES, "{\"openslide.vendor\": \"leica\"}", HAMAMATSU_JSON] {
        let result = SlideProperties::parse(text)
            .map_err(|e| e.to_string())
            .and_then(|p| p.image_metadata().map_err(|e| e.to_string()))
            .and_then(|image| {
                builder
                    .build(&image, Some(PyramidOutputSpec::default()))
                    .map_err(|e| e.to_string())
            });
        outputs.push(result);
    }

    assert!(outputs[0].is_ok());
    assert!(outputs[1].is_err());
    assert!(outputs[2].is_ok());
}

#[test]
fn test_show_properties_and_json_agree() {
    let from_text = properties(
        "openslide.vendor: 'hamamatsu'\n\
         openslide.level[0].width: '2048'\n\
         openslide.level[0].height: '2048'\n\
         hamamatsu.SourceLens: '40'\n",
    );
    let from_json = properties(
        r#"{
            "openslide.vendor": "hamamatsu",
            "openslide.level[0].width": "2048",
            "openslide.level[0].height": "2048",
            "hamamatsu.SourceLens": "40"
        }"#,
    );

    assert_eq!(from_text, from_json);
    assert_eq!(from_text.vendor(), Vendor::Hamamatsu);

    let builder = OmeMetadataBuilder::new();
    let a = builder
        .build(&from_text.image_metadata().unwrap(), None)
        .unwrap();
    let b = builder
        .build(&from_json.image_metadata().unwrap(), None)
        .unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn test_load_from_file() {
    let dir = std::env::temp_dir().join(format!("slide-ome-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("aperio.json");
    std::fs::write(&path, APERIO_JSON).unwrap();

    let props = SlideProperties::load(&path).unwrap();
    assert_eq!(props.vendor(), Vendor::Aperio);

    let missing = SlideProperties::load(dir.join("missing.json")).unwrap_err();
    assert!(matches!(missing, SlideError::Io(_)));

    std::fs::remove_dir_all(&dir).unwrap();
}
