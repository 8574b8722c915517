//! # mimir-core
//!
//! A content-type detection engine driven by a declarative type database.
//!
//! This crate provides the core functionality for:
//! - Loading `mime-info` type databases (names, descriptions, globs, magic
//!   signatures, XML root qualifiers, aliases and supertypes)
//! - Evaluating prioritized byte signatures against the leading bytes of a document
//! - Falling back to XML root elements and file names when bytes are not enough
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`registry`]: Canonical store of content types and their hierarchy
//! - [`magic`]: Byte tests, clause trees and the clause builder
//! - [`config`]: Configuration loading and the XML front-end
//! - [`detect`]: Priority-ordered detection over a loaded registry
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use mimir_core::{Detector, Loader, Registry};
//!
//! let mut registry = Registry::with_defaults()?;
//! Loader::new().load_file(&mut registry, "custom-types.xml")?;
//!
//! let detector = Detector::new(&registry);
//! let data = std::fs::read("report.bin")?;
//! match detector.detect(&data).content_type() {
//!     Some(ty) => println!("{}", registry.name(ty)),
//!     None => println!("unknown"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Concurrency
//!
//! Loading takes `&mut Registry`. Once loaded, the registry and any number of
//! [`Detector`]s borrowing it are immutable and can be shared across threads.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod config;
pub mod detect;
pub mod error;
pub mod magic;
pub mod registry;

// Re-export primary types for convenience
pub use config::{ConfigNode, Loader, LoaderConfig, BUILTIN_TYPES};
pub use detect::{Detection, Detector, DetectorConfig};
pub use error::{ConfigError, Error, Result};
pub use magic::{ByteTest, Clause, Endianness, Magic, ValueKind, DEFAULT_PRIORITY};
pub use registry::{ContentType, Glob, Registry, RootXml, TypeRef};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
