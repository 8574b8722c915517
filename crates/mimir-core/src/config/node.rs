//! Generic attribute/child-node tree consumed by the loader.
//!
//! The loader never sees XML directly. [`ConfigNode::parse_xml`] is the
//! bundled front-end; any other format can build the same tree by hand.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One element of a configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigNode {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Creates an element without attributes, text or children
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Adds an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Appends character data
    pub fn with_text(mut self, text: impl AsRef<str>) -> Self {
        self.text.push_str(text.as_ref());
        self
    }

    /// Appends a child element
    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    /// Element name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Value of the first attribute called `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated character data directly inside this element
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order
    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }

    /// Parses an XML document into its root element.
    ///
    /// Returns `Ok(None)` for a document without any element.
    pub fn parse_xml(source: &str) -> Result<Option<ConfigNode>> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<ConfigNode> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(Self::from_start(&e)?),
                Event::Empty(e) => {
                    let node = Self::from_start(&e)?;
                    attach(&mut stack, &mut root, node);
                }
                Event::End(_) => {
                    if let Some(node) = stack.pop() {
                        attach(&mut stack, &mut root, node);
                    }
                }
                Event::Text(t) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(c) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(Error::unclosed(open.tag));
        }
        Ok(root)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut node = Self::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            node.attributes.push((key, value));
        }
        Ok(node)
    }
}

/// Hands a finished element to its parent, or makes it the root
fn attach(stack: &mut [ConfigNode], root: &mut Option<ConfigNode>, node: ConfigNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}
