//! Typed view of the children of a `<mime-type>` element.

use super::node::ConfigNode;
use crate::error::ConfigError;
use crate::magic::{build_clause, ByteTest, Clause, Endianness, Magic, MatchDecl, DEFAULT_PRIORITY};
use crate::registry::{Glob, RootXml};

pub(crate) const MIME_INFO_TAG: &str = "mime-info";
pub(crate) const MIME_TYPE_TAG: &str = "mime-type";
const COMMENT_TAG: &str = "comment";
const ACRONYM_TAG: &str = "acronym";
const EXPANDED_ACRONYM_TAG: &str = "expanded-acronym";
const GLOB_TAG: &str = "glob";
const MAGIC_TAG: &str = "magic";
const MATCH_TAG: &str = "match";
const ALIAS_TAG: &str = "alias";
const ROOT_XML_TAG: &str = "root-XML";
const SUB_CLASS_OF_TAG: &str = "sub-class-of";

pub(crate) const TYPE_ATTR: &str = "type";
const LANG_ATTR: &str = "xml:lang";
const PATTERN_ATTR: &str = "pattern";
const ISREGEX_ATTR: &str = "isregex";
const PRIORITY_ATTR: &str = "priority";
const OFFSET_ATTR: &str = "offset";
const VALUE_ATTR: &str = "value";
const MASK_ATTR: &str = "mask";
const NS_URI_ATTR: &str = "namespaceURI";
const LOCAL_NAME_ATTR: &str = "localName";

/// One declaration inside a `<mime-type>` element
#[derive(Debug)]
pub(crate) enum TypeDecl {
    Comment {
        text: String,
        lang: Option<String>,
    },
    Acronym(String),
    ExpandedAcronym(String),
    Glob(Glob),
    Magic(Magic),
    Alias(String),
    RootXml(RootXml),
    SubClassOf(String),
}

impl TypeDecl {
    /// Classifies and decodes a child node.
    ///
    /// Returns `Ok(None)` for tags that carry nothing the registry stores.
    pub(crate) fn from_node(node: &ConfigNode, host: Endianness) -> Result<Option<Self>, ConfigError> {
        let decl = match node.tag() {
            COMMENT_TAG => TypeDecl::Comment {
                text: node.text().to_string(),
                lang: node.attribute(LANG_ATTR).map(str::to_string),
            },
            ACRONYM_TAG => TypeDecl::Acronym(node.text().to_string()),
            EXPANDED_ACRONYM_TAG => TypeDecl::ExpandedAcronym(node.text().to_string()),
            GLOB_TAG => {
                let pattern = required(node, PATTERN_ATTR)?;
                let is_regex = node
                    .attribute(ISREGEX_ATTR)
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
                TypeDecl::Glob(Glob::new(pattern, is_regex)?)
            }
            MAGIC_TAG => TypeDecl::Magic(read_magic(node, host)?),
            ALIAS_TAG => TypeDecl::Alias(required(node, TYPE_ATTR)?.to_string()),
            ROOT_XML_TAG => TypeDecl::RootXml(RootXml::new(
                node.attribute(NS_URI_ATTR).unwrap_or_default(),
                node.attribute(LOCAL_NAME_ATTR).unwrap_or_default(),
            )),
            SUB_CLASS_OF_TAG => TypeDecl::SubClassOf(required(node, TYPE_ATTR)?.to_string()),
            _ => return Ok(None),
        };
        Ok(Some(decl))
    }
}

/// Reads an attribute that must be present
pub(crate) fn required<'a>(node: &'a ConfigNode, attribute: &str) -> Result<&'a str, ConfigError> {
    node.attribute(attribute)
        .ok_or_else(|| ConfigError::missing(node.tag(), attribute))
}

fn read_magic(node: &ConfigNode, host: Endianness) -> Result<Magic, ConfigError> {
    let priority = match node.attribute(PRIORITY_ATTR).map(str::trim) {
        None | Some("") => DEFAULT_PRIORITY,
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::malformed(MAGIC_TAG, PRIORITY_ATTR, raw))?,
    };

    let matches = read_matches(node, host)?;
    let clause = build_clause(&matches).unwrap_or(Clause::AlwaysFalse);
    Ok(Magic::new(priority, clause))
}

fn read_matches(node: &ConfigNode, host: Endianness) -> Result<Vec<MatchDecl>, ConfigError> {
    node.children()
        .iter()
        .filter(|child| child.tag() == MATCH_TAG)
        .map(|child| {
            let test = ByteTest::parse(
                required(child, OFFSET_ATTR)?,
                required(child, TYPE_ATTR)?,
                required(child, VALUE_ATTR)?,
                child.attribute(MASK_ATTR),
                host,
            )?;
            Ok::<_, ConfigError>(MatchDecl {
                test,
                children: read_matches(child, host)?,
            })
        })
        .collect()
}
