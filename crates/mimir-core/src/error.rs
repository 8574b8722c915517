//! Error types for the mimir-core library.
//!
//! Configuration problems are reported through [`ConfigError`], which names the
//! offending element and attribute so a broken type database can be fixed by
//! hand. [`Error`] wraps it together with the I/O and XML failures that can
//! happen before the loader ever sees a document.
//!
//! Detection has no error channel: any buffer yields a result.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mimir operations
pub type Result<T> = std::result::Result<T, Error>;

/// A type configuration that cannot be loaded.
///
/// Every variant is fatal to the whole load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The document's top-level element is not `<mime-info>`
    #[error("not a <mime-info/> configuration document: {}", .found.as_deref().unwrap_or("<no root element>"))]
    WrongRootElement {
        /// Tag of the root element, or `None` for an empty document
        found: Option<String>,
    },

    /// A numeric or enumerated attribute failed to parse
    #[error("malformed attribute '{attribute}' on <{element}>: '{value}'")]
    MalformedAttribute {
        /// Element carrying the attribute
        element: String,
        /// Attribute name
        attribute: String,
        /// Raw attribute value
        value: String,
    },

    /// A required attribute is absent
    #[error("missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// Element missing the attribute
        element: String,
        /// Attribute name
        attribute: String,
    },

    /// Setting the supertype would make a type its own ancestor
    #[error("'{parent}' cannot be the supertype of '{child}': the hierarchy would contain a cycle")]
    SupertypeCycle {
        /// Type receiving the supertype edge
        child: String,
        /// Proposed parent
        parent: String,
    },

    /// An alias already names a different type
    #[error("alias '{alias}' for '{target}' already refers to '{existing}'")]
    AliasConflict {
        /// The alias being registered
        alias: String,
        /// Type the alias was declared on
        target: String,
        /// Type the alias currently resolves to
        existing: String,
    },

    /// A glob pattern could not be compiled
    #[error("invalid glob pattern '{pattern}': {details}")]
    InvalidPattern {
        /// The pattern as written
        pattern: String,
        /// Compiler diagnostic
        details: String,
    },
}

impl ConfigError {
    /// Creates a malformed attribute error
    pub fn malformed(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::MalformedAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates a missing attribute error
    pub fn missing(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates a wrong root element error
    pub fn wrong_root(found: Option<&str>) -> Self {
        Self::WrongRootElement {
            found: found.map(str::to_string),
        }
    }
}

/// Comprehensive error type for all mimir operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read a configuration file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not well-formed XML
    #[error("invalid XML in type configuration: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The configuration ended inside an open element
    #[error("unexpected end of type configuration: <{tag}> is never closed")]
    UnclosedElement {
        /// Innermost unclosed tag
        tag: String,
    },

    /// The document is well-formed but describes an invalid type database
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new unclosed element error
    pub fn unclosed(tag: impl Into<String>) -> Self {
        Self::UnclosedElement { tag: tag.into() }
    }

    /// Returns the configuration error, if that is what this is
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}
