//! Decoder property maps.
//!
//! # Accepted Formats
//!
//! - A JSON object mapping property names to values. Key order is preserved.
//! - The `name: 'value'` lines printed by `openslide-show-properties`.
//!
//! Numeric properties (`openslide.level[N].width`, `openslide.mpp-x`, ...) may
//! be given as JSON numbers or as strings, since decoders report every
//! property as a string.

use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::SlideError;
use crate::ome::{ImageMetadata, RawFields, Vendor};
use crate::pyramid::LevelSelector;

use super::aperio::{is_aperio_description, parse_description};

// =============================================================================
// Property Names
// =============================================================================

/// Vendor tag.
pub const VENDOR_PROPERTY: &str = "openslide.vendor";

/// Number of pyramid levels.
pub const LEVEL_COUNT_PROPERTY: &str = "openslide.level-count";

/// Pixel width in micrometers.
pub const MPP_X_PROPERTY: &str = "openslide.mpp-x";

/// Pixel height in micrometers.
pub const MPP_Y_PROPERTY: &str = "openslide.mpp-y";

/// Raw ImageDescription of the first TIFF directory.
pub const IMAGE_DESCRIPTION_PROPERTY: &str = "tiff.ImageDescription";

const APERIO_PREFIX: &str = "aperio.";
const APERIO_MPP_PROPERTY: &str = "aperio.MPP";
const LEVEL_PREFIX: &str = "openslide.level[";

fn level_property(index: usize, field: &str) -> String {
    format!("{LEVEL_PREFIX}{index}].{field}")
}

/// Parse the index out of `openslide.level[N].width`.
fn level_width_index(key: &str) -> Option<usize> {
    key.strip_prefix(LEVEL_PREFIX)?
        .strip_suffix("].width")?
        .parse()
        .ok()
}

// =============================================================================
// SlideProperties
// =============================================================================

/// Ordered property map of one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideProperties {
    fields: RawFields,
}

impl SlideProperties {
    /// Wrap a property map.
    ///
    /// For Aperio slides that carry no `aperio.*` properties, an
    /// ImageDescription written by Aperio software is expanded into
    /// `aperio.<Key>` properties.
    pub fn new(mut fields: RawFields) -> Self {
        let vendor = fields
            .get_str(VENDOR_PROPERTY)
            .map(Vendor::from_tag)
            .unwrap_or_else(|| Vendor::Other(String::new()));

        let has_aperio_fields = fields.keys().any(|key| key.starts_with(APERIO_PREFIX));

        if vendor == Vendor::Aperio && !has_aperio_fields {
            let description = fields
                .get_str(IMAGE_DESCRIPTION_PROPERTY)
                .filter(|d| is_aperio_description(d));
            if let Some(description) = description {
                let pairs = parse_description(description);
                debug!(
                    "Expanded {} properties from Aperio ImageDescription",
                    pairs.len()
                );
                for (key, value) in pairs {
                    fields.insert(format!("{APERIO_PREFIX}{key}"), value);
                }
            }
        }

        Self { fields }
    }

    /// Parse a property document, detecting its format.
    pub fn parse(text: &str) -> Result<Self, SlideError> {
        if text.trim_start().starts_with('{') {
            Self::from_json(text)
        } else {
            Self::from_show_properties(text)
        }
    }

    /// Parse a JSON object of properties.
    pub fn from_json(text: &str) -> Result<Self, SlideError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self::new(RawFields::from(map))),
            _ => Err(SlideError::Malformed {
                line: 1,
                message: "expected a JSON object".to_string(),
            }),
        }
    }

    /// Parse `name: 'value'` lines. Blank lines are ignored.
    pub fn from_show_properties(text: &str) -> Result<Self, SlideError> {
        let mut fields = RawFields::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = line.split_once(": ").ok_or_else(|| SlideError::Malformed {
                line: number + 1,
                message: "expected `name: 'value'`".to_string(),
            })?;

            let value = value.trim();
            let value = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .unwrap_or(value);

            fields.insert(key.trim(), value);
        }

        Ok(Self::new(fields))
    }

    /// Read and parse a property file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SlideError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let properties = Self::parse(&text)?;
        debug!(
            "Loaded {} properties from {}",
            properties.fields.len(),
            path.display()
        );
        Ok(properties)
    }

    pub fn fields(&self) -> &RawFields {
        &self.fields
    }

    pub fn into_fields(self) -> RawFields {
        self.fields
    }

    /// Vendor tag; an absent tag maps to an empty [`Vendor::Other`].
    pub fn vendor(&self) -> Vendor {
        self.fields
            .get_str(VENDOR_PROPERTY)
            .map(Vendor::from_tag)
            .unwrap_or_else(|| Vendor::Other(String::new()))
    }

    /// Read a numeric property given as a JSON number or a string.
    fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>, SlideError> {
        let text = match self.fields.get(key) {
            None => return Ok(None),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(SlideError::InvalidProperty {
                    key: key.to_string(),
                    message: format!("expected a number, got {other}"),
                })
            }
        };

        text.parse()
            .map(Some)
            .map_err(|_| SlideError::InvalidProperty {
                key: key.to_string(),
                message: format!("'{text}' is not a valid number"),
            })
    }

    fn required_number<T: FromStr>(&self, key: &str) -> Result<T, SlideError> {
        self.number(key)?
            .ok_or_else(|| SlideError::MissingProperty(key.to_string()))
    }

    /// Pyramid levels from `openslide.level-count` and the per-level widths.
    ///
    /// Without a level count, every `openslide.level[N].width` property is used.
    pub fn levels(&self) -> Result<LevelSelector, SlideError> {
        let widths: Vec<(usize, u32)> = match self.number::<usize>(LEVEL_COUNT_PROPERTY)? {
            Some(count) => (0..count)
                .map(|index| {
                    self.required_number(&level_property(index, "width"))
                        .map(|width| (index, width))
                })
                .collect::<Result<_, _>>()?,
            None => {
                let mut widths = Vec::new();
                for key in self.fields.keys() {
                    if let Some(index) = level_width_index(key) {
                        widths.push((index, self.required_number(key)?));
                    }
                }
                if widths.is_empty() {
                    return Err(SlideError::MissingProperty(LEVEL_COUNT_PROPERTY.to_string()));
                }
                widths
            }
        };

        Ok(LevelSelector::from_widths(widths)?)
    }

    /// Full-resolution `(width, height)`.
    pub fn dimensions(&self) -> Result<(u32, u32), SlideError> {
        Ok((
            self.required_number(&level_property(0, "width"))?,
            self.required_number(&level_property(0, "height"))?,
        ))
    }

    /// Physical pixel size in micrometers.
    ///
    /// Uses `openslide.mpp-x`/`openslide.mpp-y` when both are present, falling
    /// back to the square `aperio.MPP`.
    pub fn physical_size(&self) -> Result<Option<(f64, f64)>, SlideError> {
        let x = self.number::<f64>(MPP_X_PROPERTY)?;
        let y = self.number::<f64>(MPP_Y_PROPERTY)?;

        match (x, y) {
            (Some(x), Some(y)) => return Ok(Some((x, y))),
            (None, None) => {}
            _ => debug!("Ignoring physical size reported for one axis only"),
        }

        Ok(self.number::<f64>(APERIO_MPP_PROPERTY)?.map(|mpp| (mpp, mpp)))
    }

    /// Image metadata for the OME-XML builder. Raw fields hold every property.
    pub fn image_metadata(&self) -> Result<ImageMetadata, SlideError> {
        let (width, height) = self.dimensions()?;
        let mut metadata =
            ImageMetadata::new(width, height, self.vendor()).with_raw_fields(self.fields.clone());

        if let Some((x, y)) = self.physical_size()? {
            metadata = metadata.with_physical_size(x, y);
        }

        Ok(metadata)
    }
}

// =============================================================================
// Tests
// =============================================================================
