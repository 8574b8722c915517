//! Loading type databases into a [`Registry`].
//!
//! A type database is a `mime-info` document in the freedesktop shared MIME
//! info shape:
//!
//! ```xml
//! <mime-info>
//!   <mime-type type="image/gif">
//!     <comment>GIF image</comment>
//!     <glob pattern="*.gif"/>
//!     <magic priority="50">
//!       <match type="string" offset="0" value="GIF87a"/>
//!       <match type="string" offset="0" value="GIF89a"/>
//!     </magic>
//!   </mime-type>
//! </mime-info>
//! ```
//!
//! Loading is all-or-nothing. The [`Loader`] works on a staged copy of the
//! registry and only commits it once the whole document has been read, so a
//! failed load leaves the registry exactly as it was.

mod decl;
mod node;

use crate::error::{ConfigError, Error, Result};
use crate::magic::Endianness;
use crate::registry::{Registry, TypeRef};
use decl::{required, TypeDecl, MIME_INFO_TAG, MIME_TYPE_TAG, TYPE_ATTR};
use std::path::Path;
use tracing::{debug, trace};

pub use node::ConfigNode;

/// Type database compiled into the library
pub const BUILTIN_TYPES: &str = include_str!("../../data/mime-types.xml");

/// Configuration for the loader
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Byte order used for `host16` and `host32` values (default: native)
    pub host_endianness: Endianness,
}

impl LoaderConfig {
    /// Creates a new loader config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the byte order used for host-order integer values
    pub fn host_endianness(mut self, endianness: Endianness) -> Self {
        self.host_endianness = endianness;
        self
    }
}

/// Populates a [`Registry`] from configuration documents
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    /// Creates a loader with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader with custom configuration
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Loads an XML type database from a string
    pub fn load_str(&self, registry: &mut Registry, source: &str) -> Result<()> {
        let root = ConfigNode::parse_xml(source)?;
        self.load_document(registry, root.as_ref())
    }

    /// Loads an XML type database from a file
    pub fn load_file(&self, registry: &mut Registry, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        debug!("Loading type database {}", path.display());
        self.load_str(registry, &source)
    }

    /// Loads a parsed document.
    ///
    /// On error the registry is left untouched.
    pub fn load_document(&self, registry: &mut Registry, root: Option<&ConfigNode>) -> Result<()> {
        let root = match root {
            Some(root) if root.tag() == MIME_INFO_TAG => root,
            other => return Err(ConfigError::wrong_root(other.map(ConfigNode::tag)).into()),
        };

        let mut staged = registry.clone();
        let mut loaded = 0;
        for child in root.children() {
            if child.tag() == MIME_TYPE_TAG {
                self.read_type(&mut staged, child)?;
                loaded += 1;
            } else {
                trace!("Ignoring <{}> in <{}>", child.tag(), MIME_INFO_TAG);
            }
        }

        debug!(
            "Loaded {} type declarations ({} types registered)",
            loaded,
            staged.len()
        );
        *registry = staged;
        Ok(())
    }

    fn read_type(&self, registry: &mut Registry, node: &ConfigNode) -> Result<TypeRef> {
        let name = required(node, TYPE_ATTR)?;
        // Resolve before the children so self-references land on this type
        let mut r = registry.resolve(name);

        for child in node.children() {
            let Some(decl) = TypeDecl::from_node(child, self.config.host_endianness)? else {
                trace!("Ignoring <{}> in type {}", child.tag(), name);
                continue;
            };

            match decl {
                TypeDecl::Comment { text, lang } => {
                    trace!("Description for {} (lang {:?})", name, lang);
                    registry.set_description(r, text);
                }
                TypeDecl::Acronym(text) => registry.set_acronym(r, text),
                TypeDecl::ExpandedAcronym(text) => registry.set_expanded_acronym(r, text),
                TypeDecl::Glob(glob) => registry.add_glob(r, glob),
                TypeDecl::Magic(magic) => registry.add_magic(r, magic),
                TypeDecl::Alias(alias) => r = registry.add_alias(r, &alias)?,
                TypeDecl::RootXml(root) => {
                    registry.add_root_xml(r, root.namespace_uri, root.local_name)
                }
                TypeDecl::SubClassOf(parent) => {
                    registry.set_super_type(r, &parent)?;
                }
            }
        }

        registry.register(r);
        Ok(r)
    }
}

impl Registry {
    /// Creates a registry populated with the bundled type database
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Registry::new();
        Loader::new().load_str(&mut registry, BUILTIN_TYPES)?;
        Ok(registry)
    }
}
