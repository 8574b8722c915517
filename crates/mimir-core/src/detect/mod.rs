//! Content-type detection.
//!
//! ## Algorithm Overview
//!
//! 1. Evaluate every magic rule in the registry, highest priority first; the
//!    owner of the first matching rule wins
//! 2. If the data looks like XML, sniff its root element and look up root-XML
//!    qualifiers
//! 3. If a file name is known, match it against the glob patterns
//!
//! A later signal only replaces an earlier one when it names a subtype of it
//! (an SVG root refines a generic XML magic hit), or when nothing was found
//! yet. When every signal is silent the result is [`Detection::Unknown`].
//!
//! Rules with equal priority are ordered by the owning type's canonical name,
//! then by declaration order, so identical configurations always detect
//! identically.

mod xml;

use crate::registry::{Registry, RootXml, TypeRef};
use std::cmp::Reverse;
use tracing::{debug, trace};

pub use xml::{sniff_root, RootElement};

/// Outcome of a detection, tagged with the signal that decided it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// A magic rule matched
    Magic(TypeRef),
    /// The XML root element matched a qualifier
    RootXml(TypeRef),
    /// The file name matched a glob pattern
    Glob(TypeRef),
    /// No signal matched
    Unknown,
}

impl Detection {
    /// The detected type, if any
    pub fn content_type(&self) -> Option<TypeRef> {
        match *self {
            Detection::Magic(r) | Detection::RootXml(r) | Detection::Glob(r) => Some(r),
            Detection::Unknown => None,
        }
    }

    /// Returns true if nothing matched
    pub fn is_unknown(&self) -> bool {
        matches!(self, Detection::Unknown)
    }

    /// Short name of the deciding signal
    pub fn signal(&self) -> &'static str {
        match self {
            Detection::Magic(_) => "magic",
            Detection::RootXml(_) => "root-xml",
            Detection::Glob(_) => "glob",
            Detection::Unknown => "none",
        }
    }
}

/// Configuration for the detector
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Sniff the root element of XML-looking data
    pub sniff_root_xml: bool,
    /// Consult glob patterns when a file name is given
    pub match_names: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sniff_root_xml: true,
            match_names: true,
        }
    }
}

impl DetectorConfig {
    /// Creates a new detector config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether XML root elements are sniffed
    pub fn sniff_root_xml(mut self, enabled: bool) -> Self {
        self.sniff_root_xml = enabled;
        self
    }

    /// Sets whether file names are matched against globs
    pub fn match_names(mut self, enabled: bool) -> Self {
        self.match_names = enabled;
        self
    }
}

/// Position of one magic rule inside the registry
#[derive(Debug, Clone, Copy)]
struct RuleRef {
    owner: TypeRef,
    index: usize,
    priority: i32,
}

/// Detects content types against a loaded [`Registry`].
///
/// The detector borrows the registry immutably and holds no mutable state,
/// so one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct Detector<'r> {
    registry: &'r Registry,
    rules: Vec<RuleRef>,
    min_length: usize,
    config: DetectorConfig,
}

impl<'r> Detector<'r> {
    /// Creates a detector with default configuration
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_config(registry, DetectorConfig::default())
    }

    /// Creates a detector with custom configuration
    pub fn with_config(registry: &'r Registry, config: DetectorConfig) -> Self {
        let mut rules: Vec<RuleRef> = registry
            .types()
            .flat_map(|(owner, ty)| {
                ty.magics()
                    .iter()
                    .enumerate()
                    .map(move |(index, magic)| RuleRef {
                        owner,
                        index,
                        priority: magic.priority(),
                    })
            })
            .collect();

        rules.sort_by(|a, b| {
            (Reverse(a.priority), registry.name(a.owner), a.index).cmp(&(
                Reverse(b.priority),
                registry.name(b.owner),
                b.index,
            ))
        });

        let min_length = registry
            .types()
            .flat_map(|(_, ty)| ty.magics())
            .map(|magic| magic.clause().extent())
            .max()
            .unwrap_or(0);

        debug!(
            "Detector ready: {} magic rules, {} bytes needed",
            rules.len(),
            min_length
        );

        Self {
            registry,
            rules,
            min_length,
            config,
        }
    }

    /// The registry this detector reads from
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Number of leading bytes needed to evaluate every magic rule fully
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Magic rule owners in evaluation order (one entry per rule)
    pub fn rule_order(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.rules.iter().map(|rule| rule.owner)
    }

    /// Detects the type of `data` from its bytes alone
    pub fn detect(&self, data: &[u8]) -> Detection {
        self.detect_with_name(data, None)
    }

    /// Detects the type of `data`, using `file_name` as a weaker hint
    pub fn detect_with_name(&self, data: &[u8], file_name: Option<&str>) -> Detection {
        let mut detection = self
            .detect_magic(data)
            .map_or(Detection::Unknown, Detection::Magic);

        if self.config.sniff_root_xml {
            if let Some(r) = self.detect_root_xml(data) {
                detection = self.refine(detection, Detection::RootXml(r));
            }
        }

        if self.config.match_names {
            if let Some(r) = file_name.and_then(|name| self.detect_name(name)) {
                detection = self.refine(detection, Detection::Glob(r));
            }
        }

        trace!("Detected {:?} from {} bytes", detection, data.len());
        detection
    }

    /// Owner of the first magic rule matching `data`
    pub fn detect_magic(&self, data: &[u8]) -> Option<TypeRef> {
        self.rules
            .iter()
            .find(|rule| self.registry.get(rule.owner).magics()[rule.index].matches(data))
            .map(|rule| rule.owner)
    }

    /// Type whose root-XML qualifier matches the root element of `data`
    pub fn detect_root_xml(&self, data: &[u8]) -> Option<TypeRef> {
        let root = sniff_root(data)?;
        trace!(
            "Sniffed XML root {{{}}}{}",
            root.namespace_uri,
            root.local_name
        );

        let lookups = [
            RootXml::new(root.namespace_uri.as_str(), root.local_name.as_str()),
            RootXml::new(root.namespace_uri.as_str(), ""),
            RootXml::new("", root.local_name.as_str()),
        ];
        lookups
            .iter()
            .filter(|key| key.matches(&root.namespace_uri, &root.local_name))
            .find_map(|key| self.first_by_name(self.registry.types_for_root_xml(key)))
    }

    /// Type whose glob pattern best matches `file_name`.
    ///
    /// Directory components are stripped before matching.
    pub fn detect_name(&self, file_name: &str) -> Option<TypeRef> {
        let base = file_name
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(file_name);

        self.registry
            .glob_patterns()
            .filter(|(glob, _)| glob.matches(base))
            .flat_map(|(glob, refs)| refs.iter().map(move |&r| (r, glob)))
            .max_by(|(ra, a), (rb, b)| {
                a.rank()
                    .cmp(&b.rank())
                    .then_with(|| self.registry.name(*rb).cmp(self.registry.name(*ra)))
            })
            .map(|(r, _)| r)
    }

    /// Replaces `current` with `candidate` when it adds information
    fn refine(&self, current: Detection, candidate: Detection) -> Detection {
        match (current.content_type(), candidate.content_type()) {
            (None, _) => candidate,
            (Some(cur), Some(new)) if new != cur && self.registry.is_a(new, cur) => candidate,
            _ => current,
        }
    }

    fn first_by_name(&self, candidates: &[TypeRef]) -> Option<TypeRef> {
        candidates
            .iter()
            .copied()
            .min_by(|a, b| self.registry.name(*a).cmp(self.registry.name(*b)))
    }
}
