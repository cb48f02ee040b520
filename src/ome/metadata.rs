//! Image metadata as reported by a slide decoder.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// Samples per pixel of an RGB image. The only channel layout described.
pub const RGB_SAMPLES_PER_PIXEL: u32 = 3;

// =============================================================================
// Vendor
// =============================================================================

/// Scanner vendor, as tagged by the slide decoder (`openslide.vendor`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// 3DHistech MIRAX (`.mrxs`)
    Mirax,

    /// Aperio (`.svs`)
    Aperio,

    /// Hamamatsu (`.ndpi`, `.vms`)
    Hamamatsu,

    /// Any other tag, kept verbatim for error reporting
    Other(String),
}

impl Vendor {
    /// Map a decoder vendor tag to a vendor. Matching ignores ASCII case.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("mirax") {
            Vendor::Mirax
        } else if tag.eq_ignore_ascii_case("aperio") {
            Vendor::Aperio
        } else if tag.eq_ignore_ascii_case("hamamatsu") {
            Vendor::Hamamatsu
        } else {
            Vendor::Other(tag.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Vendor::Mirax => "mirax",
            Vendor::Aperio => "aperio",
            Vendor::Hamamatsu => "hamamatsu",
            Vendor::Other(tag) => tag,
        }
    }
}

impl FromStr for Vendor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Vendor::from_tag(s))
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RawFields
// =============================================================================

/// Vendor-reported properties in the order the decoder listed them.
///
/// Values are JSON values so that property dumps can be carried as-is; only
/// string values are valid input to the OME-XML builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields(Map<String, Value>);

impl RawFields {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Insert a property. Re-inserting a key replaces its value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a property if it holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for RawFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K, V> FromIterator<(K, V)> for RawFields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = RawFields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

// =============================================================================
// ImageMetadata
// =============================================================================

/// Geometry, calibration and vendor properties of a decoded slide.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    /// Full-resolution width in pixels
    pub width: u32,

    /// Full-resolution height in pixels
    pub height: u32,

    /// Pixel width in micrometers
    pub physical_size_x: Option<f64>,

    /// Pixel height in micrometers
    pub physical_size_y: Option<f64>,

    pub vendor: Vendor,

    /// Every property the decoder reported
    pub raw_fields: RawFields,

    /// Samples per pixel after dropping any alpha channel
    pub samples_per_pixel: u32,
}

impl ImageMetadata {
    /// Create metadata for an RGB image without calibration or properties.
    pub fn new(width: u32, height: u32, vendor: Vendor) -> Self {
        Self {
            width,
            height,
            physical_size_x: None,
            physical_size_y: None,
            vendor,
            raw_fields: RawFields::new(),
            samples_per_pixel: RGB_SAMPLES_PER_PIXEL,
        }
    }

    /// Set the physical pixel size. Sizes are only ever recorded as a pair.
    pub fn with_physical_size(mut self, x: f64, y: f64) -> Self {
        self.physical_size_x = Some(x);
        self.physical_size_y = Some(y);
        self
    }

    pub fn with_raw_fields(mut self, raw_fields: RawFields) -> Self {
        self.raw_fields = raw_fields;
        self
    }

    pub fn with_samples_per_pixel(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    /// Physical pixel size, only when both axes are known.
    pub fn physical_size(&self) -> Option<(f64, f64)> {
        self.physical_size_x.zip(self.physical_size_y)
    }
}
