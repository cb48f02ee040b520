//! Slide property adapter.
//!
//! The slide decoder (OpenSlide, reached through libvips in a typical
//! conversion pipeline) reports everything it knows about a slide as a flat,
//! ordered property map: `openslide.*` properties describing the pyramid and
//! calibration, plus vendor-namespaced properties such as `aperio.AppMag`.
//!
//! [`SlideProperties`] reads such a map and derives the inputs of the level
//! selector and the OME-XML builder from it:
//!
//! ```text
//! properties ──┬── levels() ─────────► LevelSelector ──► decode level
//!              └── image_metadata() ─► OmeMetadataBuilder ──► OME-XML
//! ```

mod aperio;
mod properties;

pub use aperio::{is_aperio_description, parse_description, APERIO_MARKER};
pub use properties::{
    SlideProperties, IMAGE_DESCRIPTION_PROPERTY, LEVEL_COUNT_PROPERTY, MPP_X_PROPERTY,
    MPP_Y_PROPERTY, VENDOR_PROPERTY,
};
