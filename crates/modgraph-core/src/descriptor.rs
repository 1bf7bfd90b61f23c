//! Module descriptors: the declared name, requires, exports, uses and
//! provides of one module.
//!
//! Descriptors are parsed from the `classes/module-info.toml` entry of a
//! packaged archive (see [`crate::archive`]) or assembled in memory with
//! [`ModuleDescriptor::builder`]. Both paths go through the same validation:
//!
//! - the name is non-empty,
//! - a module never requires itself,
//! - each requires target appears at most once.
//!
//! Edges refer to other modules by name only; resolving a name to its
//! descriptor always goes through the [`crate::ModuleCatalog`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::{ModgraphError, Result};

/// One `requires` edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requires {
    /// Name of the required module.
    pub name: String,
    /// Dependents of the requiring module also read the target.
    pub transitive: bool,
    /// The edge is the implicit dependency on the base module.
    pub mandated: bool,
}

/// One exported package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Export {
    pub package: String,
    /// Friend modules for a qualified export; empty when unqualified.
    pub targets: BTreeSet<String>,
}

impl Export {
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        !self.targets.is_empty()
    }
}

/// The declared shape of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: String,
    requires: BTreeMap<String, Requires>,
    exports: Vec<Export>,
    uses: BTreeSet<String>,
    provides: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// TOML form
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    name: String,
    #[serde(default)]
    requires: Vec<RawRequires>,
    #[serde(default)]
    exports: Vec<RawExport>,
    #[serde(default)]
    uses: Vec<String>,
    #[serde(default)]
    provides: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRequires {
    name: String,
    #[serde(default)]
    transitive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExport {
    package: String,
    #[serde(default)]
    to: Vec<String>,
}

impl ModuleDescriptor {
    /// Start building a descriptor for `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ModuleDescriptorBuilder {
        ModuleDescriptorBuilder {
            name: name.into(),
            requires: Vec::new(),
            exports: Vec::new(),
            uses: Vec::new(),
            provides: BTreeMap::new(),
        }
    }

    /// Parse a descriptor from its TOML text.
    ///
    /// `origin` names the source (usually the archive path) in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ModgraphError::InvalidDescriptor`] if the text is not a
    /// valid descriptor or violates a descriptor invariant.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self> {
        let raw: RawDescriptor = toml::from_str(text)
            .map_err(|err| ModgraphError::invalid_descriptor(origin, err.message()))?;

        let mut builder = Self::builder(raw.name);
        for req in raw.requires {
            builder.requires.push((req.name, req.transitive));
        }
        for export in raw.exports {
            builder.exports.push((export.package, export.to));
        }
        builder.uses = raw.uses;
        builder.provides = raw.provides;
        builder.build_from(origin)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All requires edges, ordered by target name.
    pub fn requires(&self) -> impl Iterator<Item = &Requires> {
        self.requires.values()
    }

    /// The requires edge to `target`, if declared.
    #[must_use]
    pub fn requires_edge(&self, target: &str) -> Option<&Requires> {
        self.requires.get(target)
    }

    /// Exported packages, ordered by package name.
    #[must_use]
    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    #[must_use]
    pub fn uses(&self) -> &BTreeSet<String> {
        &self.uses
    }

    /// Service type → provider classes, in declaration order.
    #[must_use]
    pub fn provides(&self) -> &BTreeMap<String, Vec<String>> {
        &self.provides
    }

    /// Returns `true` when the module is part of the public surface: it
    /// exports an unqualified package, or it exports nothing and re-exports
    /// via `requires transitive` (an aggregator).
    #[must_use]
    pub fn is_spec_shaped(&self) -> bool {
        self.exports.iter().any(|e| !e.is_qualified())
            || (self.exports.is_empty() && self.requires.values().any(|r| r.transitive))
    }

    /// Add or mark the mandated requires edge on the base module.
    pub(crate) fn mandate(&mut self, base: &str) {
        self.requires
            .entry(base.to_string())
            .and_modify(|r| r.mandated = true)
            .or_insert_with(|| Requires {
                name: base.to_string(),
                transitive: false,
                mandated: true,
            });
    }

    pub(crate) fn has_requires(&self) -> bool {
        !self.requires.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// In-memory construction of a [`ModuleDescriptor`].
#[derive(Debug, Clone)]
pub struct ModuleDescriptorBuilder {
    name: String,
    requires: Vec<(String, bool)>,
    exports: Vec<(String, Vec<String>)>,
    uses: Vec<String>,
    provides: BTreeMap<String, Vec<String>>,
}

impl ModuleDescriptorBuilder {
    #[must_use]
    pub fn requires(mut self, target: impl Into<String>) -> Self {
        self.requires.push((target.into(), false));
        self
    }

    #[must_use]
    pub fn requires_transitive(mut self, target: impl Into<String>) -> Self {
        self.requires.push((target.into(), true));
        self
    }

    #[must_use]
    pub fn exports(mut self, package: impl Into<String>) -> Self {
        self.exports.push((package.into(), Vec::new()));
        self
    }

    #[must_use]
    pub fn exports_to(mut self, package: impl Into<String>, targets: &[&str]) -> Self {
        let targets = targets.iter().map(|t| (*t).to_string()).collect();
        self.exports.push((package.into(), targets));
        self
    }

    #[must_use]
    pub fn uses(mut self, service: impl Into<String>) -> Self {
        self.uses.push(service.into());
        self
    }

    #[must_use]
    pub fn provides(mut self, service: impl Into<String>, providers: &[&str]) -> Self {
        self.provides.insert(
            service.into(),
            providers.iter().map(|p| (*p).to_string()).collect(),
        );
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`ModgraphError::InvalidDescriptor`] on an empty name, a
    /// self-requires, or a duplicate requires target.
    pub fn build(self) -> Result<ModuleDescriptor> {
        let origin = format!("module `{}`", self.name);
        self.build_from(&origin)
    }

    fn build_from(self, origin: &str) -> Result<ModuleDescriptor> {
        if self.name.trim().is_empty() {
            return Err(ModgraphError::invalid_descriptor(origin, "empty module name"));
        }

        let mut requires = BTreeMap::new();
        for (target, transitive) in self.requires {
            if target == self.name {
                return Err(ModgraphError::invalid_descriptor(
                    origin,
                    format!("module `{target}` requires itself"),
                ));
            }
            let edge = Requires {
                name: target.clone(),
                transitive,
                mandated: false,
            };
            if requires.insert(target.clone(), edge).is_some() {
                return Err(ModgraphError::invalid_descriptor(
                    origin,
                    format!("duplicate requires on `{target}`"),
                ));
            }
        }

        let mut exports: Vec<Export> = self
            .exports
            .into_iter()
            .map(|(package, targets)| Export {
                package,
                targets: targets.into_iter().collect(),
            })
            .collect();
        exports.sort();

        Ok(ModuleDescriptor {
            name: self.name,
            requires,
            exports,
            uses: self.uses.into_iter().collect(),
            provides: self.provides,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "m.a"
uses = ["m.a.spi.Codec"]

[[requires]]
name = "m.b"
transitive = true

[[requires]]
name = "m.c"

[[exports]]
package = "m.a.api"

[[exports]]
package = "m.a.internal"
to = ["m.c"]

[provides]
"m.a.spi.Codec" = ["m.a.impl.Zstd", "m.a.impl.Gzip"]
"#;

    #[test]
    fn parses_full_descriptor() {
        let d = ModuleDescriptor::from_toml_str(FULL, "test").unwrap();
        assert_eq!(d.name(), "m.a");

        let reqs: Vec<_> = d.requires().map(|r| (r.name.as_str(), r.transitive)).collect();
        assert_eq!(reqs, vec![("m.b", true), ("m.c", false)]);

        assert_eq!(d.exports().len(), 2);
        assert!(!d.exports()[0].is_qualified());
        assert!(d.exports()[1].is_qualified());

        assert!(d.uses().contains("m.a.spi.Codec"));
        // provider order is preserved
        assert_eq!(
            d.provides()["m.a.spi.Codec"],
            vec!["m.a.impl.Zstd".to_string(), "m.a.impl.Gzip".to_string()]
        );
        assert!(d.is_spec_shaped());
    }

    #[test]
    fn rejects_self_requires() {
        let err = ModuleDescriptor::builder("a").requires("a").build().unwrap_err();
        assert!(err.to_string().contains("requires itself"));
    }

    #[test]
    fn rejects_duplicate_requires() {
        let err = ModuleDescriptor::builder("a")
            .requires("b")
            .requires_transitive("b")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate requires"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ModuleDescriptor::from_toml_str("name = \"a\"\nopens = []\n", "x.jmod")
            .unwrap_err();
        assert!(matches!(err, ModgraphError::InvalidDescriptor { .. }));
    }

    #[test]
    fn internal_module_is_not_spec_shaped() {
        let d = ModuleDescriptor::builder("jdk.internal.x")
            .requires("m.b")
            .exports_to("jdk.internal.x.impl", &["m.b"])
            .build()
            .unwrap();
        assert!(!d.is_spec_shaped());
    }

    #[test]
    fn qualified_exports_with_transitive_requires_is_not_spec_shaped() {
        let d = ModuleDescriptor::builder("jdk.internal.x")
            .requires_transitive("java.xml")
            .exports_to("jdk.internal.x.impl", &["jdk.tool"])
            .build()
            .unwrap();
        assert!(!d.is_spec_shaped());
    }

    #[test]
    fn aggregator_with_transitive_requires_is_spec_shaped() {
        let d = ModuleDescriptor::builder("m.se")
            .requires_transitive("m.a")
            .build()
            .unwrap();
        assert!(d.is_spec_shaped());
    }

    #[test]
    fn mandate_marks_existing_edge() {
        let mut d = ModuleDescriptor::builder("a").requires("base").build().unwrap();
        d.mandate("base");
        let edge = d.requires_edge("base").unwrap();
        assert!(edge.mandated);
        assert_eq!(d.requires().count(), 1);
    }
}
