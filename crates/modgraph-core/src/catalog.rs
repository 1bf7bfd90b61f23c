//! The module catalog: every known descriptor plus its archive metadata.
//!
//! Descriptors are stored once, keyed by module name, behind an [`Arc`] so
//! resolved configurations can share them without cloning. Edges between
//! modules stay name references and are looked up here at traversal time.
//!
//! # Base module
//!
//! The catalog is built with the name of the base module (default
//! [`DEFAULT_BASE_MODULE`]). When that module is present, every other module
//! gets a *mandated* requires edge on it, and the base module itself must not
//! require anything.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument};

use crate::archive::{ArchiveMetadata, scan_archive};
use crate::descriptor::ModuleDescriptor;
use crate::error::{ModgraphError, Result};

/// Name of the implicit universal base module.
pub const DEFAULT_BASE_MODULE: &str = "java.base";

/// File extension of packaged module archives.
pub const ARCHIVE_EXTENSION: &str = "jmod";

#[derive(Debug, Clone)]
struct CatalogEntry {
    descriptor: Arc<ModuleDescriptor>,
    archive: Option<ArchiveMetadata>,
}

/// Read-only index of known modules, built once per run.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, CatalogEntry>,
    base_module: String,
}

impl ModuleCatalog {
    /// Scan `dir` for `*.jmod` archives and index them.
    ///
    /// Archives are read in file-name order; other files are ignored.
    ///
    /// # Errors
    ///
    /// - [`ModgraphError::ModulePathNotFound`] if `dir` cannot be listed.
    /// - Any error from [`scan_archive`] for the first bad archive.
    /// - [`ModgraphError::InvalidDescriptor`] if a module name repeats or the
    ///   base module declares requires.
    #[instrument(skip(dir), fields(dir = %dir.display()))]
    pub fn scan(dir: &Path, base_module: &str) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| ModgraphError::ModulePathNotFound {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut archives: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ModgraphError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_archive = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
            if is_archive && path.is_file() {
                archives.push(path);
            }
        }
        archives.sort();

        let mut modules = Vec::with_capacity(archives.len());
        for path in &archives {
            let (descriptor, metadata) = scan_archive(path)?;
            modules.push((descriptor, Some(metadata)));
        }

        let catalog = Self::from_modules(modules, base_module)?;
        info!(
            modules = catalog.len(),
            base_present = catalog.base_present(),
            "module catalog built"
        );
        Ok(catalog)
    }

    /// Build a catalog from in-memory descriptors.
    ///
    /// Modules paired with `None` have no archive; asking for their
    /// metadata fails with [`ModgraphError::ArchiveNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`ModgraphError::InvalidDescriptor`] if a module name repeats
    /// or the base module declares requires.
    pub fn from_modules<I>(modules: I, base_module: &str) -> Result<Self>
    where
        I: IntoIterator<Item = (ModuleDescriptor, Option<ArchiveMetadata>)>,
    {
        let mut staged: BTreeMap<String, (ModuleDescriptor, Option<ArchiveMetadata>)> =
            BTreeMap::new();
        for (descriptor, archive) in modules {
            let name = descriptor.name().to_string();
            if staged.insert(name.clone(), (descriptor, archive)).is_some() {
                return Err(ModgraphError::InvalidDescriptor {
                    origin: format!("module `{name}`"),
                    reason: "module is defined more than once".to_string(),
                });
            }
        }

        if let Some((base, _)) = staged.get(base_module) {
            if base.has_requires() {
                return Err(ModgraphError::InvalidDescriptor {
                    origin: format!("module `{base_module}`"),
                    reason: "the base module must not require other modules".to_string(),
                });
            }
            for (name, (descriptor, _)) in &mut staged {
                if name != base_module {
                    descriptor.mandate(base_module);
                }
            }
        }

        let modules = staged
            .into_iter()
            .map(|(name, (descriptor, archive))| {
                let entry = CatalogEntry {
                    descriptor: Arc::new(descriptor),
                    archive,
                };
                (name, entry)
            })
            .collect();

        Ok(Self {
            modules,
            base_module: base_module.to_string(),
        })
    }

    /// Look up a module's descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ModgraphError::ModuleNotFound`] if no module has that name.
    pub fn lookup(&self, name: &str) -> Result<&Arc<ModuleDescriptor>> {
        self.get(name).ok_or_else(|| ModgraphError::ModuleNotFound {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ModuleDescriptor>> {
        self.modules.get(name).map(|e| &e.descriptor)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Every module known to the catalog.
    #[must_use]
    pub fn all_module_names(&self) -> BTreeSet<String> {
        self.modules.keys().cloned().collect()
    }

    /// Module names in sorted order, without allocating.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Size and content inventory of a module's archive.
    ///
    /// # Errors
    ///
    /// - [`ModgraphError::ModuleNotFound`] if the module is unknown.
    /// - [`ModgraphError::ArchiveNotFound`] if it was catalogued without one.
    pub fn archive_metadata(&self, name: &str) -> Result<&ArchiveMetadata> {
        let entry = self
            .modules
            .get(name)
            .ok_or_else(|| ModgraphError::ModuleNotFound {
                name: name.to_string(),
            })?;
        entry
            .archive
            .as_ref()
            .ok_or_else(|| ModgraphError::ArchiveNotFound {
                module: name.to_string(),
            })
    }

    /// Returns `true` if the module belongs to the public surface.
    ///
    /// The base module always does; otherwise see
    /// [`ModuleDescriptor::is_spec_shaped`].
    #[must_use]
    pub fn is_spec_module(&self, name: &str) -> bool {
        if name == self.base_module {
            return self.contains(name);
        }
        self.get(name).is_some_and(|d| d.is_spec_shaped())
    }

    /// Name of the base module, whether or not it is present.
    #[must_use]
    pub fn base_module(&self) -> &str {
        &self.base_module
    }

    #[must_use]
    pub fn base_present(&self) -> bool {
        self.contains(&self.base_module)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn module(name: &str, requires: &[&str]) -> (ModuleDescriptor, Option<ArchiveMetadata>) {
        let mut builder = ModuleDescriptor::builder(name);
        for r in requires {
            builder = builder.requires(*r);
        }
        (builder.build().unwrap(), None)
    }

    #[test]
    fn lookup_unknown_module_is_not_found() {
        let catalog = ModuleCatalog::from_modules([module("a", &[])], "base").unwrap();
        let err = catalog.lookup("zzz").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ModuleNotFound);
    }

    #[test]
    fn archive_metadata_missing_is_not_found() {
        let catalog = ModuleCatalog::from_modules([module("a", &[])], "base").unwrap();
        let err = catalog.archive_metadata("a").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ArchiveNotFound);
    }

    #[test]
    fn base_module_is_mandated_everywhere() {
        let catalog = ModuleCatalog::from_modules(
            [module("base", &[]), module("a", &["b"]), module("b", &["base"])],
            "base",
        )
        .unwrap();

        for name in ["a", "b"] {
            let edge = catalog.lookup(name).unwrap().requires_edge("base").unwrap();
            assert!(edge.mandated, "{name} -> base should be mandated");
        }
        assert_eq!(catalog.lookup("base").unwrap().requires().count(), 0);
    }

    #[test]
    fn no_mandated_edges_without_base() {
        let catalog = ModuleCatalog::from_modules([module("a", &["b"]), module("b", &[])], "base")
            .unwrap();
        assert!(!catalog.base_present());
        assert!(catalog.lookup("b").unwrap().requires_edge("base").is_none());
    }

    #[test]
    fn base_with_requires_is_invalid() {
        let err = ModuleCatalog::from_modules([module("base", &["a"]), module("a", &[])], "base")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDescriptor);
    }

    #[test]
    fn duplicate_module_is_invalid() {
        let err = ModuleCatalog::from_modules([module("a", &[]), module("a", &[])], "base")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDescriptor);
    }

    #[test]
    fn all_module_names_sorted() {
        let catalog = ModuleCatalog::from_modules(
            [module("c", &[]), module("a", &[]), module("b", &[])],
            "base",
        )
        .unwrap();
        let names: Vec<_> = catalog.all_module_names().into_iter().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn spec_module_classification() {
        let api = ModuleDescriptor::builder("api").exports("p").build().unwrap();
        let internal = ModuleDescriptor::builder("internal")
            .exports_to("q", &["api"])
            .build()
            .unwrap();
        let reexporting_internal = ModuleDescriptor::builder("internal.reexport")
            .requires_transitive("api")
            .exports_to("r", &["api"])
            .build()
            .unwrap();
        let aggregator = ModuleDescriptor::builder("agg")
            .requires_transitive("api")
            .build()
            .unwrap();
        let catalog = ModuleCatalog::from_modules(
            [
                (api, None),
                (internal, None),
                (reexporting_internal, None),
                (aggregator, None),
                module("base", &[]),
            ],
            "base",
        )
        .unwrap();

        assert!(catalog.is_spec_module("api"));
        assert!(!catalog.is_spec_module("internal"));
        assert!(!catalog.is_spec_module("internal.reexport"));
        assert!(catalog.is_spec_module("agg"));
        assert!(catalog.is_spec_module("base"));
        assert!(!catalog.is_spec_module("missing"));
    }
}
