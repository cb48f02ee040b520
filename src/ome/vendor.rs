//! Vendor-specific metadata extraction.
//!
//! Each supported vendor namespaces its properties with a fixed prefix. The
//! extraction strategy keeps the properties under that prefix and strips it,
//! leaving the key to use in the OME-XML original-metadata annotation.

use serde_json::Value;
use tracing::debug;

use crate::error::OmeError;

use super::metadata::{RawFields, Vendor};

/// Strips a vendor prefix from a property key, or rejects the key.
type Strategy = fn(&str) -> Option<&str>;

fn mirax_key(key: &str) -> Option<&str> {
    key.strip_prefix("mirax.GENERAL.")
}

fn aperio_key(key: &str) -> Option<&str> {
    key.strip_prefix("aperio.")
}

fn hamamatsu_key(key: &str) -> Option<&str> {
    key.strip_prefix("hamamatsu.")
}

impl Vendor {
    fn strategy(&self) -> Result<Strategy, OmeError> {
        match self {
            Vendor::Mirax => Ok(mirax_key),
            Vendor::Aperio => Ok(aperio_key),
            Vendor::Hamamatsu => Ok(hamamatsu_key),
            Vendor::Other(tag) => Err(OmeError::UnsupportedVendor(tag.clone())),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Characters allowed in an XML 1.0 document. Control characters other than
/// tab, newline and carriage return cannot even be written as references.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn is_xml_text(text: &str) -> bool {
    text.chars().all(is_xml_char)
}

/// Select the vendor's properties, with the vendor prefix stripped.
///
/// Output follows the insertion order of `fields`. Every value in `fields`
/// must be a string of XML characters, including properties the vendor does
/// not select.
///
/// # Errors
///
/// - [`OmeError::UnsupportedVendor`] for [`Vendor::Other`]
/// - [`OmeError::InvalidMetadataValue`] for the first non-string value, or
///   the first value or selected key that cannot be written as XML
pub fn extract_vendor_fields<'a>(
    vendor: &Vendor,
    fields: &'a RawFields,
) -> Result<Vec<(&'a str, &'a str)>, OmeError> {
    let strategy = vendor.strategy()?;

    let mut selected = Vec::new();
    for (key, value) in fields.iter() {
        let value = value
            .as_str()
            .ok_or_else(|| OmeError::InvalidMetadataValue {
                key: key.to_string(),
                found: value_kind(value).to_string(),
            })?;

        if !is_xml_text(value) {
            return Err(OmeError::InvalidMetadataValue {
                key: key.to_string(),
                found: "string with non-XML characters".to_string(),
            });
        }

        if let Some(stripped) = strategy(key) {
            if !is_xml_text(stripped) {
                return Err(OmeError::InvalidMetadataValue {
                    key: key.to_string(),
                    found: "key with non-XML characters".to_string(),
                });
            }
            selected.push((stripped, value));
        }
    }

    debug!(
        "Selected {} of {} {} properties",
        selected.len(),
        fields.len(),
        vendor
    );

    Ok(selected)
}
