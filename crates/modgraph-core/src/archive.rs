//! Packaged module archives (`<name>.jmod`).
//!
//! An archive is a zip container whose first path component names a
//! section:
//!
//! ```text
//! classes/   *.class → classes, everything else → resources,
//!            classes/module-info.toml → the module descriptor,
//!            classes/module-info.class → counted with the descriptor
//! conf/      config files
//! lib/       native libraries (debug-info variants by suffix)
//! bin/       native commands  (debug-info variants by suffix)
//! include/, legal/, man/   recognized, counted in module size only
//! ```
//!
//! Any other top-level entry makes the scan fail with
//! [`ModgraphError::ArchiveFormat`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, instrument};
use zip::ZipArchive;

use crate::descriptor::ModuleDescriptor;
use crate::error::{ModgraphError, Result};

/// Archive entry holding the module descriptor.
pub const DESCRIPTOR_ENTRY: &str = "classes/module-info.toml";

/// Compiled form of the descriptor, accounted with the descriptor rather
/// than as a class.
pub const COMPILED_DESCRIPTOR_ENTRY: &str = "classes/module-info.class";

/// File-name suffixes that mark a native file as debug information.
pub const DEBUG_INFO_SUFFIXES: [&str; 5] = [".debuginfo", ".diz", ".dSYM", ".pdb", ".map"];

// ---------------------------------------------------------------------------
// Content statistics
// ---------------------------------------------------------------------------

/// The kinds of packaged content reported per module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentKind {
    Classes,
    Resources,
    Configs,
    NativeLibs,
    NativeLibsDebug,
    Commands,
    CommandsDebug,
}

impl ContentKind {
    /// Every kind, in report column order.
    pub const ALL: [Self; 7] = [
        Self::Classes,
        Self::Resources,
        Self::Configs,
        Self::NativeLibs,
        Self::NativeLibsDebug,
        Self::Commands,
        Self::CommandsDebug,
    ];

    /// Column heading used by reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Classes => "Classes",
            Self::Resources => "Resources",
            Self::Configs => "Configs",
            Self::NativeLibs => "Native libs",
            Self::NativeLibsDebug => "Native libs (debug)",
            Self::Commands => "Commands",
            Self::CommandsDebug => "Commands (debug)",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Item count and uncompressed byte size for one content kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub count: u64,
    pub bytes: u64,
}

impl ContentStats {
    fn add(&mut self, bytes: u64) {
        self.count += 1;
        self.bytes += bytes;
    }
}

/// Size and content inventory of one packaged module.
///
/// Immutable once the archive is scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveMetadata {
    stats: [ContentStats; 7],
    descriptor_bytes: u64,
    other_bytes: u64,
    archive_bytes: u64,
}

impl ArchiveMetadata {
    /// Statistics for one content kind.
    #[must_use]
    pub const fn stats(&self, kind: ContentKind) -> ContentStats {
        self.stats[kind.index()]
    }

    /// Uncompressed size of the descriptor entry.
    #[must_use]
    pub const fn descriptor_bytes(&self) -> u64 {
        self.descriptor_bytes
    }

    /// Uncompressed size of header files, legal notices and man pages.
    #[must_use]
    pub const fn other_bytes(&self) -> u64 {
        self.other_bytes
    }

    /// Size of the archive file on disk.
    #[must_use]
    pub const fn archive_bytes(&self) -> u64 {
        self.archive_bytes
    }

    /// Total uncompressed size of everything the module packages.
    #[must_use]
    pub fn module_bytes(&self) -> u64 {
        self.stats.iter().map(|s| s.bytes).sum::<u64>() + self.descriptor_bytes + self.other_bytes
    }

    /// Returns `true` when the module packages nothing but its descriptor.
    #[must_use]
    pub fn is_aggregator(&self) -> bool {
        self.stats.iter().all(|s| s.count == 0)
    }

    /// Record `count` items of `bytes` total for `kind`.
    #[must_use]
    pub fn with_stats(mut self, kind: ContentKind, count: u64, bytes: u64) -> Self {
        self.stats[kind.index()] = ContentStats { count, bytes };
        self
    }

    #[must_use]
    pub fn with_descriptor_bytes(mut self, bytes: u64) -> Self {
        self.descriptor_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_archive_bytes(mut self, bytes: u64) -> Self {
        self.archive_bytes = bytes;
        self
    }

    fn record(&mut self, kind: ContentKind, bytes: u64) {
        self.stats[kind.index()].add(bytes);
    }
}

// ---------------------------------------------------------------------------
// Entry classification
// ---------------------------------------------------------------------------

/// Where an archive entry is accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryClass {
    Descriptor,
    CompiledDescriptor,
    Content(ContentKind),
    Other,
}

/// Classify a file entry by its path inside the archive.
///
/// Returns an error message for entries outside the recognized sections.
fn classify(entry: &str) -> std::result::Result<EntryClass, String> {
    let Some((section, rest)) = entry.split_once('/') else {
        return Err(format!("entry `{entry}` is outside any section"));
    };

    let class = match section {
        "classes" if entry == DESCRIPTOR_ENTRY => EntryClass::Descriptor,
        "classes" if entry == COMPILED_DESCRIPTOR_ENTRY => EntryClass::CompiledDescriptor,
        "classes" if rest.ends_with(".class") => EntryClass::Content(ContentKind::Classes),
        "classes" => EntryClass::Content(ContentKind::Resources),
        "conf" => EntryClass::Content(ContentKind::Configs),
        "lib" if is_debug_info(rest) => EntryClass::Content(ContentKind::NativeLibsDebug),
        "lib" => EntryClass::Content(ContentKind::NativeLibs),
        "bin" if is_debug_info(rest) => EntryClass::Content(ContentKind::CommandsDebug),
        "bin" => EntryClass::Content(ContentKind::Commands),
        "include" | "legal" | "man" => EntryClass::Other,
        other => return Err(format!("unexpected section `{other}/`")),
    };
    Ok(class)
}

/// Debug info is either a file with a debug suffix or anything inside a
/// `.dSYM` bundle directory.
fn is_debug_info(path: &str) -> bool {
    let mut components = path.split('/').peekable();
    while let Some(component) = components.next() {
        let is_last = components.peek().is_none();
        if component.ends_with(".dSYM") {
            return true;
        }
        if is_last && DEBUG_INFO_SUFFIXES.iter().any(|s| component.ends_with(s)) {
            return true;
        }
    }
    false
}

fn validate_section(entry: &str) -> std::result::Result<(), String> {
    let section = entry.split('/').next().unwrap_or_default();
    match section {
        "classes" | "conf" | "lib" | "bin" | "include" | "legal" | "man" => Ok(()),
        other => Err(format!("unexpected section `{other}/`")),
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Read one archive: parse its descriptor and index its contents.
///
/// The descriptor's module name must equal the archive's file stem.
///
/// # Errors
///
/// - [`ModgraphError::ArchiveUnreadable`] if the file cannot be opened.
/// - [`ModgraphError::ArchiveFormat`] if it is not a zip archive, contains
///   an unrecognized section, or lacks `classes/module-info.toml`.
/// - [`ModgraphError::InvalidDescriptor`] if the descriptor is invalid or
///   names a different module.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn scan_archive(path: &Path) -> Result<(ModuleDescriptor, ArchiveMetadata)> {
    let file = File::open(path).map_err(|source| ModgraphError::ArchiveUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let archive_bytes = file
        .metadata()
        .map_err(|source| ModgraphError::ArchiveUnreadable {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    let mut zip = ZipArchive::new(BufReader::new(file))
        .map_err(|err| ModgraphError::archive_format(path, format!("not a zip archive: {err}")))?;

    let mut metadata = ArchiveMetadata::default().with_archive_bytes(archive_bytes);
    let mut descriptor_text: Option<String> = None;

    for idx in 0..zip.len() {
        let mut entry = zip
            .by_index(idx)
            .map_err(|err| ModgraphError::archive_format(path, format!("entry {idx}: {err}")))?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            validate_section(&name).map_err(|reason| ModgraphError::archive_format(path, reason))?;
            continue;
        }

        let class = classify(&name).map_err(|reason| ModgraphError::archive_format(path, reason))?;
        let size = entry.size();
        match class {
            EntryClass::Descriptor => {
                let mut text = String::new();
                entry.read_to_string(&mut text).map_err(|err| {
                    ModgraphError::archive_format(path, format!("unreadable descriptor: {err}"))
                })?;
                metadata.descriptor_bytes += size;
                descriptor_text = Some(text);
            }
            EntryClass::CompiledDescriptor => metadata.descriptor_bytes += size,
            EntryClass::Content(kind) => metadata.record(kind, size),
            EntryClass::Other => metadata.other_bytes += size,
        }
    }

    let Some(text) = descriptor_text else {
        return Err(ModgraphError::archive_format(
            path,
            format!("missing {DESCRIPTOR_ENTRY}"),
        ));
    };

    let origin = path.display().to_string();
    let descriptor = ModuleDescriptor::from_toml_str(&text, &origin)?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if descriptor.name() != stem {
        return Err(ModgraphError::InvalidDescriptor {
            origin,
            reason: format!(
                "descriptor names `{}` but the archive is named `{stem}`",
                descriptor.name()
            ),
        });
    }

    debug!(
        module = descriptor.name(),
        classes = metadata.stats(ContentKind::Classes).count,
        module_bytes = metadata.module_bytes(),
        "archive indexed"
    );

    Ok((descriptor, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_sections() {
        assert_eq!(classify("classes/module-info.toml"), Ok(EntryClass::Descriptor));
        assert_eq!(
            classify("classes/module-info.class"),
            Ok(EntryClass::CompiledDescriptor)
        );
        assert_eq!(
            classify("classes/a/module-info.class"),
            Ok(EntryClass::Content(ContentKind::Classes))
        );
        assert_eq!(
            classify("classes/a/b/C.class"),
            Ok(EntryClass::Content(ContentKind::Classes))
        );
        assert_eq!(
            classify("classes/a/b/messages.properties"),
            Ok(EntryClass::Content(ContentKind::Resources))
        );
        assert_eq!(
            classify("conf/security/policy"),
            Ok(EntryClass::Content(ContentKind::Configs))
        );
        assert_eq!(classify("legal/LICENSE"), Ok(EntryClass::Other));
    }

    #[test]
    fn classify_debug_variants() {
        assert_eq!(
            classify("lib/libzip.so"),
            Ok(EntryClass::Content(ContentKind::NativeLibs))
        );
        assert_eq!(
            classify("lib/libzip.debuginfo"),
            Ok(EntryClass::Content(ContentKind::NativeLibsDebug))
        );
        assert_eq!(
            classify("lib/libzip.dylib.dSYM/Contents/Info.plist"),
            Ok(EntryClass::Content(ContentKind::NativeLibsDebug))
        );
        assert_eq!(
            classify("bin/java.pdb"),
            Ok(EntryClass::Content(ContentKind::CommandsDebug))
        );
        assert_eq!(classify("bin/java"), Ok(EntryClass::Content(ContentKind::Commands)));
    }

    #[test]
    fn classify_rejects_unknown_layout() {
        assert!(classify("README").is_err());
        assert!(classify("resources/x.txt").is_err());
        assert!(validate_section("sources/").is_err());
        assert!(validate_section("classes/").is_ok());
    }

    #[test]
    fn aggregator_means_no_content() {
        let meta = ArchiveMetadata::default().with_descriptor_bytes(40);
        assert!(meta.is_aggregator());
        assert_eq!(meta.module_bytes(), 40);

        let meta = meta.with_stats(ContentKind::Resources, 1, 10);
        assert!(!meta.is_aggregator());
        assert_eq!(meta.module_bytes(), 50);
    }
}
