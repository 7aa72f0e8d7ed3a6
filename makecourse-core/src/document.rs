//! Owned XML document model.
//!
//! roxmltree borrows the input buffer, so the parsed document is converted
//! into an owned [`Element`] tree right away. Import resolution then splices
//! additional parsed documents into that tree before the content tree is
//! built. XML comments are dropped at parse time.

use std::fs;
use std::path::Path;

use crate::error::BuildError;

/// One XML element with its attributes and mixed content.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Mixed content of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(pair) => pair.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute, returning its value if it was present.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(idx).1)
    }

    /// Direct child elements, in order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenation of the element's direct text content.
    ///
    /// Comments never appear here (dropped at parse time); whitespace-only
    /// runs between child elements are skipped.
    pub fn direct_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) if !t.trim().is_empty() => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A pure leaf-text carrier: no attributes, no element children, some
    /// text. These are absorbed into the parent's attribute mapping during
    /// tree construction unless their tag names a registered unit type.
    pub fn is_leaf_text(&self) -> bool {
        self.attrs.is_empty()
            && self.child_elements().next().is_none()
            && !self.direct_text().is_empty()
    }
}

/// Parse an XML string into an owned root element.
pub fn parse_str(input: &str, origin: &Path) -> Result<Element, BuildError> {
    let doc = roxmltree::Document::parse(input).map_err(|source| BuildError::Xml {
        path: origin.to_path_buf(),
        source,
    })?;
    Ok(convert(doc.root_element()))
}

/// Read and parse an XML file.
pub fn parse_file(path: &Path) -> Result<Element, BuildError> {
    let input = fs::read_to_string(path)?;
    parse_str(&input, path)
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let mut element = Element::new(node.tag_name().name());
    for attr in node.attributes() {
        element
            .attrs
            .push((attr.name().to_string(), attr.value().to_string()));
    }
    for child in node.children() {
        if child.is_element() {
            element.children.push(XmlNode::Element(convert(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(XmlNode::Text(text.to_string()));
            }
        }
        // comments and processing instructions are dropped
    }
    element
}
