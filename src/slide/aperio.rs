//! Aperio ImageDescription parsing.
//!
//! Aperio SVS files store their scanner metadata in the ImageDescription tag
//! of the first IFD:
//!
//! ```text
//! Aperio Image Library v12.0.15
//! 46920x33600 (256x256) JPEG/RGB Q=70|AppMag = 20|MPP = 0.499|...
//! ```
//!
//! The first pipe-separated segment is a free-form header (it may itself
//! contain `=`), every following segment is a `key = value` pair.

/// Marker identifying an Aperio ImageDescription.
pub const APERIO_MARKER: &str = "Aperio";

/// Check whether an ImageDescription was written by Aperio software.
pub fn is_aperio_description(description: &str) -> bool {
    description.starts_with(APERIO_MARKER)
}

/// Parse the key/value pairs of an Aperio ImageDescription, in order.
///
/// Segments without `=` and segments with an empty key are skipped.
pub fn parse_description(description: &str) -> Vec<(String, String)> {
    description
        .split('|')
        .skip(1)
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}
