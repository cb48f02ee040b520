//! In-memory XML tree and OME-XML document serialization.
//!
//! The builder assembles an [`Element`] tree and serializes it once; parsing
//! rebuilds the same tree from bytes, so a document can be inspected after it
//! has been written (or when it was produced by another tool).
//!
//! Element lookups compare local names, so documents written with an `OME:`
//! prefix are read the same way as documents using a default namespace.

use bytes::Bytes;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;

use crate::error::OmeError;

use super::builder::ResolutionLevel;

/// Indentation of serialized documents.
const INDENT_SIZE: usize = 2;

// =============================================================================
// Element Tree
// =============================================================================

/// A node in an XML element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Qualified name as written
    pub name: String,

    /// Attributes in document order
    pub attributes: Vec<(String, String)>,

    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Concatenated text content of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First direct child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.elements().find(|e| e.local_name() == local_name)
    }

    /// First element with the given local name, depth-first, including `self`.
    pub fn find(&self, local_name: &str) -> Option<&Element> {
        if self.local_name() == local_name {
            return Some(self);
        }
        self.elements().find_map(|e| e.find(local_name))
    }

    /// All elements with the given local name, depth-first, including `self`.
    pub fn find_all<'a>(&'a self, local_name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect(local_name, &mut found);
        found
    }

    fn collect<'a>(&'a self, local_name: &str, found: &mut Vec<&'a Element>) {
        if self.local_name() == local_name {
            found.push(self);
        }
        for child in self.elements() {
            child.collect(local_name, found);
        }
    }
}

// =============================================================================
// Serialization
// =============================================================================

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
) -> Result<(), OmeError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(element) => write_element(writer, element)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;

    Ok(())
}

fn write_document(comment: Option<&str>, root: &Element) -> Result<Vec<u8>, OmeError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    if let Some(comment) = comment {
        if comment.contains("--") {
            return Err(OmeError::Xml("comment must not contain '--'".to_string()));
        }
        writer.write_event(Event::Comment(BytesText::from_escaped(format!(
            " {} ",
            comment
        ))))?;
    }
    write_element(&mut writer, root)?;

    Ok(writer.into_inner())
}

fn element_from_start(start: &BytesStart) -> Result<Element, OmeError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| OmeError::Xml(e.to_string()))?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((name, value));
    }
    Ok(element)
}

/// Attach a completed element to its parent, or make it the root.
fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), OmeError> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(OmeError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

fn read_document(xml: &str) -> Result<(Option<String>, Element), OmeError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut comment: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| OmeError::Xml("unbalanced end tag".to_string()))?;

                // Indentation between child elements is not content
                if element.elements().next().is_some() {
                    element.children.retain(|node| match node {
                        Node::Text(text) => !text.trim().is_empty(),
                        Node::Element(_) => true,
                    });
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Node::Text(text.unescape()?.into_owned()));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Comment(text) => {
                if stack.is_empty() && root.is_none() && comment.is_none() {
                    comment = Some(String::from_utf8_lossy(&text).trim().to_string());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(OmeError::Xml("unclosed element".to_string()));
    }

    let root = root.ok_or(OmeError::MissingElement("OME"))?;
    Ok((comment, root))
}

// =============================================================================
// OmeXmlDocument
// =============================================================================

/// Pixel geometry read back from a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelsGeometry {
    pub size_x: u32,
    pub size_y: u32,
    pub physical_size_x: Option<f64>,
    pub physical_size_y: Option<f64>,
    pub physical_size_unit: Option<String>,
}

/// A serialized OME-XML document together with its element tree.
///
/// The bytes are what gets embedded in the image description of the output
/// TIFF; the tree is kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct OmeXmlDocument {
    bytes: Bytes,
    comment: Option<String>,
    root: Element,
}

impl OmeXmlDocument {
    /// Serialize a tree into a document.
    pub fn from_tree(comment: Option<String>, root: Element) -> Result<Self, OmeError> {
        let bytes = write_document(comment.as_deref(), &root)?;
        Ok(Self {
            bytes: Bytes::from(bytes),
            comment,
            root,
        })
    }

    /// Parse a serialized document.
    pub fn parse(bytes: impl Into<Bytes>) -> Result<Self, OmeError> {
        let bytes = bytes.into();
        let xml = std::str::from_utf8(&bytes).map_err(|e| OmeError::Xml(e.to_string()))?;
        let (comment, root) = read_document(xml)?;
        Ok(Self {
            bytes,
            comment,
            root,
        })
    }

    /// UTF-8 bytes, starting with the XML declaration.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn as_str(&self) -> &str {
        // Serialized from UTF-8 strings or validated in parse()
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Read the `Pixels` geometry and calibration.
    pub fn pixels(&self) -> Result<PixelsGeometry, OmeError> {
        let pixels = self
            .root
            .find("Pixels")
            .ok_or(OmeError::MissingElement("Pixels"))?;

        Ok(PixelsGeometry {
            size_x: required_attribute(pixels, "SizeX")?,
            size_y: required_attribute(pixels, "SizeY")?,
            physical_size_x: optional_attribute(pixels, "PhysicalSizeX")?,
            physical_size_y: optional_attribute(pixels, "PhysicalSizeY")?,
            physical_size_unit: pixels.attribute("PhysicalSizeXUnit").map(str::to_string),
        })
    }

    /// Key/value pairs of every original-metadata annotation, in document order.
    pub fn original_metadata(&self) -> Vec<(String, String)> {
        self.root
            .find_all("OriginalMetadata")
            .into_iter()
            .map(|entry| {
                let key = entry.child("Key").map(Element::text).unwrap_or_default();
                let value = entry.child("Value").map(Element::text).unwrap_or_default();
                (key, value)
            })
            .collect()
    }

    /// Entries of the pyramid resolution map, if present.
    pub fn resolutions(&self) -> Result<Vec<ResolutionLevel>, OmeError> {
        let Some(map) = self
            .root
            .find_all("MapAnnotation")
            .into_iter()
            .find(|m| m.attribute("ID").is_some_and(|id| id.starts_with("Annotation:Resolution:")))
        else {
            return Ok(Vec::new());
        };

        let mut levels = Vec::new();
        for entry in map.find_all("M") {
            let layer = required_attribute(entry, "K")?;
            let text = entry.text();
            let mut parts = text.split_whitespace().map(str::parse::<u32>);
            let (Some(Ok(width)), Some(Ok(height)), None) =
                (parts.next(), parts.next(), parts.next())
            else {
                return Err(OmeError::InvalidAttribute {
                    name: "M",
                    value: text,
                });
            };
            levels.push(ResolutionLevel {
                layer,
                width,
                height,
            });
        }

        Ok(levels)
    }
}

fn required_attribute<T: std::str::FromStr>(
    element: &Element,
    name: &'static str,
) -> Result<T, OmeError> {
    optional_attribute(element, name)?.ok_or(OmeError::MissingElement(name))
}

fn optional_attribute<T: std::str::FromStr>(
    element: &Element,
    name: &'static str,
) -> Result<Option<T>, OmeError> {
    element
        .attribute(name)
        .map(|value| {
            value.parse().map_err(|_| OmeError::InvalidAttribute {
                name,
                value: value.to_string(),
            })
        })
        .transpose()
}

// =============================================================================
// Tests
// =============================================================================
