//! Filename patterns and XML root qualifiers.

use crate::error::ConfigError;
use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Wildcard(GlobMatcher),
    Regex(Regex),
}

/// A compiled filename pattern
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    is_regex: bool,
    matcher: Matcher,
}

impl Glob {
    /// Compiles a pattern.
    ///
    /// Plain patterns are shell wildcards matched case-insensitively against
    /// the whole file name; regex patterns are anchored at both ends.
    pub fn new(pattern: &str, is_regex: bool) -> Result<Self, ConfigError> {
        let invalid = |details: String| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            details,
        };

        let matcher = if is_regex {
            Regex::new(&format!("^(?:{pattern})$"))
                .map(Matcher::Regex)
                .map_err(|e| invalid(e.to_string()))?
        } else if !pattern.contains(['*', '?', '[', '{']) {
            Matcher::Literal(pattern.to_lowercase())
        } else {
            GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(false)
                .build()
                .map(|g| Matcher::Wildcard(g.compile_matcher()))
                .map_err(|e| invalid(e.to_string()))?
        };

        Ok(Self {
            pattern: pattern.to_string(),
            is_regex,
            matcher,
        })
    }

    /// The pattern as declared
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern is a regular expression
    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    /// Returns true if `file_name` (a bare name, not a path) matches
    pub fn matches(&self, file_name: &str) -> bool {
        match &self.matcher {
            Matcher::Literal(name) => file_name.to_lowercase() == *name,
            Matcher::Wildcard(glob) => glob.is_match(file_name),
            Matcher::Regex(re) => re.is_match(file_name),
        }
    }

    /// Ordering key among competing matches; larger wins.
    ///
    /// Exact names beat wildcards, wildcards beat regexes, and within a class
    /// the longer pattern is the more specific one.
    pub fn rank(&self) -> (u8, usize) {
        let class = match self.matcher {
            Matcher::Literal(_) => 2,
            Matcher::Wildcard(_) => 1,
            Matcher::Regex(_) => 0,
        };
        (class, self.pattern.len())
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.is_regex == other.is_regex
    }
}

impl Eq for Glob {}

impl Hash for Glob {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
        self.is_regex.hash(state);
    }
}

/// Identifies a type by the root element of an XML document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootXml {
    /// Namespace URI, empty for "any namespace"
    pub namespace_uri: String,
    /// Local element name, empty for "any element in the namespace"
    pub local_name: String,
}

impl RootXml {
    /// Creates a qualifier
    pub fn new(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
        }
    }

    /// Returns true if a root element with this namespace and name satisfies the qualifier
    pub fn matches(&self, namespace_uri: &str, local_name: &str) -> bool {
        if self.namespace_uri.is_empty() && self.local_name.is_empty() {
            return false;
        }
        (self.namespace_uri.is_empty() || self.namespace_uri == namespace_uri)
            && (self.local_name.is_empty() || self.local_name == local_name)
    }
}
