//! The canonical store of content types.
//!
//! Types live in an arena owned by the [`Registry`] and are addressed by
//! [`TypeRef`] handles. Every lookup path (canonical name, alias, glob,
//! root-XML qualifier) leads to the same handle for one logical type, so
//! comparing handles is comparing types.
//!
//! The registry is only mutated while configuration is loaded. Afterwards it
//! is plain data and can be shared between threads without locking.

mod glob;

use crate::error::ConfigError;
use crate::magic::Magic;
use std::collections::{HashMap, HashSet};
use tracing::trace;

pub use glob::{Glob, RootXml};

/// Handle to a content type stored in a [`Registry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(usize);

impl TypeRef {
    /// Position of the type in creation order
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named content type and everything known about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    name: String,
    description: Option<String>,
    acronym: Option<String>,
    expanded_acronym: Option<String>,
    aliases: Vec<String>,
    supertype: Option<TypeRef>,
    globs: Vec<Glob>,
    root_xml: Vec<RootXml>,
    magics: Vec<Magic>,
    declared: bool,
}

impl ContentType {
    fn new(name: String) -> Self {
        Self {
            name,
            description: None,
            acronym: None,
            expanded_acronym: None,
            aliases: Vec::new(),
            supertype: None,
            globs: Vec::new(),
            root_xml: Vec::new(),
            magics: Vec::new(),
            declared: false,
        }
    }

    /// True for a type that so far exists only because something referenced it
    fn is_placeholder(&self) -> bool {
        !self.declared
            && self.description.is_none()
            && self.acronym.is_none()
            && self.expanded_acronym.is_none()
            && self.aliases.is_empty()
            && self.supertype.is_none()
            && self.globs.is_empty()
            && self.root_xml.is_empty()
            && self.magics.is_empty()
    }

    /// Canonical, lower-cased name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Short acronym, e.g. `PDF`
    pub fn acronym(&self) -> Option<&str> {
        self.acronym.as_deref()
    }

    /// Expanded acronym, e.g. `Portable Document Format`
    pub fn expanded_acronym(&self) -> Option<&str> {
        self.expanded_acronym.as_deref()
    }

    /// Alternate names, in declaration order
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Direct parent in the type hierarchy
    pub fn supertype(&self) -> Option<TypeRef> {
        self.supertype
    }

    /// Filename patterns
    pub fn globs(&self) -> &[Glob] {
        &self.globs
    }

    /// XML root element qualifiers
    pub fn root_xml(&self) -> &[RootXml] {
        &self.root_xml
    }

    /// Byte signatures
    pub fn magics(&self) -> &[Magic] {
        &self.magics
    }
}

/// Normalizes a type name for use as a map key
fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Content types indexed by name, alias, glob pattern and XML root
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: Vec<ContentType>,
    by_name: HashMap<String, TypeRef>,
    aliases: HashMap<String, TypeRef>,
    globs: HashMap<Glob, Vec<TypeRef>>,
    root_xml: HashMap<RootXml, Vec<TypeRef>>,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the type named `name`, creating an empty one if needed.
    ///
    /// Names are case-insensitive and aliases resolve to their canonical type.
    pub fn resolve(&mut self, name: &str) -> TypeRef {
        let key = normalize(name);
        if let Some(&found) = self.aliases.get(&key).or_else(|| self.by_name.get(&key)) {
            return found;
        }

        let r = TypeRef(self.types.len());
        trace!("Creating content type {}", key);
        self.types.push(ContentType::new(key.clone()));
        self.by_name.insert(key, r);
        r
    }

    /// Looks up a type by name or alias without creating it
    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        let key = normalize(name);
        self.aliases
            .get(&key)
            .or_else(|| self.by_name.get(&key))
            .copied()
    }

    /// Makes `r` addressable by its canonical name again and marks it as
    /// declared.
    ///
    /// A declared type is never absorbed by [`Registry::add_alias`].
    pub fn register(&mut self, r: TypeRef) {
        let ty = &mut self.types[r.0];
        ty.declared = true;
        let name = ty.name.clone();
        self.by_name.insert(name, r);
    }

    /// Returns the type behind a handle
    ///
    /// # Panics
    ///
    /// Panics if `r` was issued by a different registry with more types.
    pub fn get(&self, r: TypeRef) -> &ContentType {
        &self.types[r.0]
    }

    /// Canonical name of a type
    pub fn name(&self, r: TypeRef) -> &str {
        &self.types[r.0].name
    }

    /// Iterates over all types in creation order
    pub fn types(&self) -> impl Iterator<Item = (TypeRef, &ContentType)> {
        self.types.iter().enumerate().map(|(i, t)| (TypeRef(i), t))
    }

    /// Number of types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no type has been created
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Sets the description, replacing any previous one
    pub fn set_description(&mut self, r: TypeRef, description: impl Into<String>) {
        self.types[r.0].description = Some(description.into());
    }

    /// Sets the acronym, replacing any previous one
    pub fn set_acronym(&mut self, r: TypeRef, acronym: impl Into<String>) {
        self.types[r.0].acronym = Some(acronym.into());
    }

    /// Sets the expanded acronym, replacing any previous one
    pub fn set_expanded_acronym(&mut self, r: TypeRef, expanded: impl Into<String>) {
        self.types[r.0].expanded_acronym = Some(expanded.into());
    }

    /// Points `r` at the type named `parent`, replacing any previous parent.
    ///
    /// Fails if `r` would become its own ancestor.
    pub fn set_super_type(&mut self, r: TypeRef, parent: &str) -> Result<TypeRef, ConfigError> {
        let parent_ref = self.resolve(parent);
        if self.is_a(parent_ref, r) {
            return Err(ConfigError::SupertypeCycle {
                child: self.name(r).to_string(),
                parent: self.name(parent_ref).to_string(),
            });
        }

        self.types[r.0].supertype = Some(parent_ref);
        Ok(parent_ref)
    }

    /// Adds an alternate name for `r` and returns the handle of `r`.
    ///
    /// Repeating an alias of the same type is allowed. If the alias names a
    /// type that was only ever referenced (say, as somebody's supertype) and
    /// never declared, that placeholder is absorbed into `r`: its subtypes are
    /// re-pointed at `r` and its slot is removed, which moves every later
    /// handle down by one. An alias naming a different declared type is
    /// rejected.
    pub fn add_alias(&mut self, mut r: TypeRef, alias: &str) -> Result<TypeRef, ConfigError> {
        let key = normalize(alias);
        if let Some(existing) = self.lookup(&key).filter(|&e| e != r) {
            if !self.types[existing.0].is_placeholder() {
                return Err(ConfigError::AliasConflict {
                    alias: key,
                    target: self.name(r).to_string(),
                    existing: self.name(existing).to_string(),
                });
            }
            r = self.absorb(existing, r)?;
        }

        self.aliases.insert(key.clone(), r);
        self.types[r.0].aliases.push(key);
        Ok(r)
    }

    /// Merges the placeholder type into `into` and drops its slot
    fn absorb(&mut self, placeholder: TypeRef, into: TypeRef) -> Result<TypeRef, ConfigError> {
        if self.is_a(into, placeholder) {
            return Err(ConfigError::SupertypeCycle {
                child: self.name(into).to_string(),
                parent: self.name(placeholder).to_string(),
            });
        }

        trace!(
            "Merging referenced type {} into {}",
            self.name(placeholder),
            self.name(into)
        );
        let removed = self.types.remove(placeholder.0);
        self.by_name.remove(&removed.name);

        let shift = |t: TypeRef| {
            let t = if t == placeholder { into } else { t };
            if t.0 > placeholder.0 {
                TypeRef(t.0 - 1)
            } else {
                t
            }
        };

        for ty in &mut self.types {
            ty.supertype = ty.supertype.map(shift);
        }
        for r in self.by_name.values_mut().chain(self.aliases.values_mut()) {
            *r = shift(*r);
        }
        for refs in self.globs.values_mut().chain(self.root_xml.values_mut()) {
            for r in refs.iter_mut() {
                *r = shift(*r);
            }
        }
        Ok(shift(into))
    }

    /// Adds a filename pattern for `r`
    pub fn add_glob(&mut self, r: TypeRef, glob: Glob) {
        self.globs.entry(glob.clone()).or_default().push(r);
        self.types[r.0].globs.push(glob);
    }

    /// Adds an XML root qualifier for `r`
    pub fn add_root_xml(
        &mut self,
        r: TypeRef,
        namespace_uri: impl Into<String>,
        local_name: impl Into<String>,
    ) {
        let root = RootXml::new(namespace_uri, local_name);
        self.root_xml.entry(root.clone()).or_default().push(r);
        self.types[r.0].root_xml.push(root);
    }

    /// Attaches a byte signature to `r`
    pub fn add_magic(&mut self, r: TypeRef, magic: Magic) {
        self.types[r.0].magics.push(magic);
    }

    /// Every distinct glob pattern with the types declaring it
    pub fn glob_patterns(&self) -> impl Iterator<Item = (&Glob, &[TypeRef])> {
        self.globs.iter().map(|(glob, refs)| (glob, refs.as_slice()))
    }

    /// Types declaring exactly this root qualifier
    pub fn types_for_root_xml(&self, root: &RootXml) -> &[TypeRef] {
        self.root_xml.get(root).map(Vec::as_slice).unwrap_or_default()
    }

    /// Walks the supertype chain of `r`, nearest parent first
    pub fn ancestors(&self, r: TypeRef) -> Vec<TypeRef> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([r]);
        let mut current = self.types[r.0].supertype;

        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            out.push(parent);
            current = self.types[parent.0].supertype;
        }
        out
    }

    /// Returns true if `r` is `ancestor` or descends from it
    pub fn is_a(&self, r: TypeRef, ancestor: TypeRef) -> bool {
        r == ancestor || self.ancestors(r).contains(&ancestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_is_idempotent() {
        let mut registry = Registry::new();
        let a = registry.resolve("text/plain");
        let b = registry.resolve("  TEXT/Plain ");
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.name(a), "text/plain");
    }

    #[test]
    fn test_alias_resolves_to_canonical() {
        let mut registry = Registry::new();
        let xml = registry.resolve("application/xml");
        registry.add_alias(xml, "text/xml").unwrap();

        assert_eq!(registry.resolve("text/xml"), xml);
        assert_eq!(registry.lookup("TEXT/XML"), Some(xml));
        assert_eq!(registry.get(xml).aliases(), &["text/xml".to_string()]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_repeated_alias_accumulates() {
        let mut registry = Registry::new();
        let xml = registry.resolve("application/xml");
        registry.add_alias(xml, "text/xml").unwrap();
        registry.add_alias(xml, "text/xml").unwrap();
        assert_eq!(registry.get(xml).aliases().len(), 2);
    }

    #[test]
    fn test_conflicting_alias() {
        let mut registry = Registry::new();
        let xml = registry.resolve("application/xml");
        let text = registry.resolve("text/xml");
        registry.register(text);

        let err = registry.add_alias(xml, "text/xml").unwrap_err();
        assert_eq!(
            err,
            ConfigError::AliasConflict {
                alias: "text/xml".into(),
                target: "application/xml".into(),
                existing: "text/xml".into(),
            }
        );
    }

    #[test]
    fn test_alias_absorbs_referenced_type() {
        let mut registry = Registry::new();
        let svg = registry.resolve("image/svg+xml");
        registry.set_super_type(svg, "text/xml").unwrap();
        let xml = registry.resolve("application/xml");
        registry.add_glob(xml, Glob::new("*.xml", false).unwrap());
        assert_eq!(registry.len(), 3);

        let xml = registry.add_alias(xml, "text/xml").unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name(xml), "application/xml");
        assert_eq!(registry.lookup("text/xml"), Some(xml));
        assert_eq!(registry.lookup("application/xml"), Some(xml));
        assert_eq!(registry.get(svg).supertype(), Some(xml));
        let patterns: Vec<_> = registry.glob_patterns().collect();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].1, &[xml]);
        assert!(registry.is_a(svg, xml));
    }

    #[test]
    fn test_absorbing_own_ancestor_is_a_cycle() {
        let mut registry = Registry::new();
        let xml = registry.resolve("application/xml");
        registry.set_super_type(xml, "text/xml").unwrap();

        assert!(matches!(
            registry.add_alias(xml, "text/xml"),
            Err(ConfigError::SupertypeCycle { .. })
        ));
    }

    #[test]
    fn test_supertype_last_write_wins() {
        let mut registry = Registry::new();
        let svg = registry.resolve("image/svg+xml");
        let text = registry.set_super_type(svg, "text/plain").unwrap();
        let xml = registry.set_super_type(svg, "application/xml").unwrap();

        assert_ne!(text, xml);
        assert_eq!(registry.get(svg).supertype(), Some(xml));
        assert!(registry.is_a(svg, xml));
        assert!(!registry.is_a(svg, text));
    }

    #[test]
    fn test_supertype_cycles_rejected() {
        let mut registry = Registry::new();
        let a = registry.resolve("a/a");
        assert!(matches!(
            registry.set_super_type(a, "a/a"),
            Err(ConfigError::SupertypeCycle { .. })
        ));

        let b = registry.set_super_type(a, "b/b").unwrap();
        registry.set_super_type(b, "c/c").unwrap();
        let c = registry.resolve("c/c");
        let err = registry.set_super_type(c, "a/a").unwrap_err();
        assert_eq!(
            err,
            ConfigError::SupertypeCycle {
                child: "c/c".into(),
                parent: "a/a".into(),
            }
        );
        assert_eq!(registry.get(c).supertype(), None);
    }

    #[test]
    fn test_ancestors() {
        let mut registry = Registry::new();
        let odt = registry.resolve("application/vnd.oasis.opendocument.text");
        let zip = registry.set_super_type(odt, "application/zip").unwrap();
        let bin = registry.set_super_type(zip, "application/octet-stream").unwrap();
        assert_eq!(registry.ancestors(odt), vec![zip, bin]);
        assert!(registry.is_a(odt, odt));
        assert!(registry.ancestors(bin).is_empty());
    }

    #[test]
    fn test_indexes_share_instances() {
        let mut registry = Registry::new();
        let pdf = registry.resolve("application/pdf");
        registry.add_glob(pdf, Glob::new("*.pdf", false).unwrap());
        registry.add_root_xml(pdf, "urn:example", "pdf");
        registry.register(pdf);

        registry.add_glob(pdf, Glob::new("*.pdf", false).unwrap());
        let patterns: Vec<_> = registry.glob_patterns().collect();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].0.pattern(), "*.pdf");
        assert_eq!(patterns[0].1, &[pdf, pdf]);
        assert_eq!(registry.get(pdf).globs().len(), 2);
        assert_eq!(
            registry.types_for_root_xml(&RootXml::new("urn:example", "pdf")),
            &[pdf]
        );
        assert_eq!(registry.lookup("application/pdf"), Some(pdf));
    }

    #[test]
    fn test_descriptions_overwrite() {
        let mut registry = Registry::new();
        let pdf = registry.resolve("application/pdf");
        registry.set_description(pdf, "PDF document");
        registry.set_description(pdf, "document PDF");
        registry.set_acronym(pdf, "PDF");
        assert_eq!(registry.get(pdf).description(), Some("document PDF"));
        assert_eq!(registry.get(pdf).acronym(), Some("PDF"));
        assert_eq!(registry.get(pdf).expanded_acronym(), None);
    }
}
