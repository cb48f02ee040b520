use thiserror::Error;

/// Errors raised while selecting a pyramid level
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PyramidError {
    /// Level set is empty or malformed
    #[error("Invalid pyramid: {reason}")]
    InvalidPyramid { reason: String },

    /// Target width must be positive
    #[error("Invalid target width: must be greater than 0")]
    InvalidTargetWidth,

    /// Every level is narrower than the target (would require upsampling)
    #[error("No suitable level: target width {target_width} exceeds the widest level ({max_width})")]
    NoSuitableLevel { target_width: u32, max_width: u32 },
}

/// Errors raised while building or reading OME-XML metadata
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OmeError {
    /// Vendor tag has no metadata extraction strategy
    #[error("Unsupported vendor: '{0}' (expected mirax, aperio or hamamatsu)")]
    UnsupportedVendor(String),

    /// Pyramid tile size must be positive
    #[error("Invalid tile size: {0} (must be greater than 0)")]
    InvalidTileSize(u32),

    /// A raw metadata field holds something other than a string
    #[error("Invalid metadata value for '{key}': expected a string, got {found}")]
    InvalidMetadataValue { key: String, found: String },

    /// Image dimensions must be positive
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Physical pixel size must be finite and positive
    #[error("Invalid physical pixel size: {x} x {y}")]
    InvalidPhysicalSize { x: f64, y: f64 },

    /// Only 3-sample RGB images are described
    #[error("Unsupported channel layout: {0} samples per pixel (only RGB is supported)")]
    UnsupportedChannelCount(u32),

    /// XML could not be written or parsed
    #[error("XML error: {0}")]
    Xml(String),

    /// Required element missing from a parsed document
    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    /// Attribute present but unparsable
    #[error("Invalid attribute {name}: '{value}'")]
    InvalidAttribute { name: &'static str, value: String },
}

impl From<quick_xml::Error> for OmeError {
    fn from(e: quick_xml::Error) -> Self {
        OmeError::Xml(e.to_string())
    }
}

/// Errors raised while reading slide properties reported by the decoder
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlideError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// Property document is not valid JSON
    #[error("JSON error: {0}")]
    Json(String),

    /// Property document is neither a JSON object nor `name: 'value'` lines
    #[error("Malformed properties at line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// Required property is absent
    #[error("Missing property: {0}")]
    MissingProperty(String),

    /// Property present but unusable
    #[error("Invalid property {key}: {message}")]
    InvalidProperty { key: String, message: String },

    /// Level set derived from the properties was rejected
    #[error("Pyramid error: {0}")]
    Pyramid(#[from] PyramidError),
}

impl From<std::io::Error> for SlideError {
    fn from(e: std::io::Error) -> Self {
        SlideError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for SlideError {
    fn from(e: serde_json::Error) -> Self {
        SlideError::Json(e.to_string())
    }
}

/// Errors raised while producing a thumbnail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThumbnailError {
    /// Target width must be positive
    #[error("Invalid thumbnail width: must be greater than 0")]
    InvalidWidth,

    /// JPEG quality outside 1-100
    #[error("Invalid quality: {0} (must be between 1 and 100)")]
    InvalidQuality(u8),

    /// Source cannot be reduced to the target without upsampling
    #[error("Pyramid error: {0}")]
    Pyramid(#[from] PyramidError),

    /// OME-TIFF does not have the planar page layout of a converted slide
    #[error("Unexpected image format: expected {expected} pages, found {found}")]
    InvalidPageCount { expected: usize, found: usize },

    /// Source image could not be decoded
    #[error("Failed to decode image: {message}")]
    DecodeError { message: String },

    /// Thumbnail could not be encoded or written
    #[error("Failed to encode thumbnail: {message}")]
    EncodeError { message: String },
}
