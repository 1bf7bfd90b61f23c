use std::fmt;
use std::io;
use std::path::PathBuf;

/// Convenience alias used across the modgraph crates.
pub type Result<T> = std::result::Result<T, ModgraphError>;

/// Machine-readable error codes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ModulePathNotFound,
    ModuleNotFound,
    ArchiveNotFound,
    ArchiveFormat,
    InvalidDescriptor,
    CycleDetected,
    IoFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ModulePathNotFound => "E2001",
            Self::ModuleNotFound => "E2002",
            Self::ArchiveNotFound => "E2003",
            Self::ArchiveFormat => "E3001",
            Self::InvalidDescriptor => "E3002",
            Self::CycleDetected => "E3003",
            Self::IoFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Rendering attribute file parse error",
            Self::ModulePathNotFound => "Module path not found",
            Self::ModuleNotFound => "Module not found",
            Self::ArchiveNotFound => "Module archive not found",
            Self::ArchiveFormat => "Unrecognized module archive layout",
            Self::InvalidDescriptor => "Invalid module descriptor",
            Self::CycleDetected => "Requires cycle detected",
            Self::IoFailed => "I/O failure",
        }
    }

    /// Optional remediation hint surfaced next to the message.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Check the option names and value types in the --dot-attributes file.")
            }
            Self::ModulePathNotFound => Some("Pass an existing directory to --module-path."),
            Self::ModuleNotFound => {
                Some("Check the module name, or add its archive to the module path.")
            }
            Self::ArchiveNotFound => Some("Make sure every module has a readable .jmod archive."),
            Self::ArchiveFormat => Some(
                "Archives may only contain classes/, conf/, lib/, bin/, include/, legal/ and man/.",
            ),
            Self::InvalidDescriptor => Some("Fix classes/module-info.toml in the named archive."),
            Self::CycleDetected => Some("Remove one of the listed requires edges."),
            Self::IoFailed => Some("Check that the path exists and is writable."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors produced while cataloguing, resolving, and rendering modules.
#[derive(Debug, thiserror::Error)]
pub enum ModgraphError {
    /// The module path directory does not exist or cannot be listed.
    #[error("module path {} cannot be read: {source}", path.display())]
    ModulePathNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A requested module has no descriptor in the catalog.
    #[error("module `{name}` not found")]
    ModuleNotFound { name: String },

    /// A module requires a module that has no descriptor in the catalog.
    #[error("module `{target}` required by `{module}` not found")]
    RequiredModuleNotFound { module: String, target: String },

    /// No archive metadata is known for the module.
    #[error("no packaged archive for module `{module}`")]
    ArchiveNotFound { module: String },

    /// The archive file exists but cannot be opened.
    #[error("archive {} cannot be opened: {source}", path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The archive's internal layout is not recognized.
    #[error("archive {} has an unrecognized layout: {reason}", path.display())]
    ArchiveFormat { path: PathBuf, reason: String },

    /// A descriptor violates one of the descriptor invariants.
    #[error("invalid module descriptor in {origin}: {reason}")]
    InvalidDescriptor { origin: String, reason: String },

    /// The requires graph contains a cycle.
    #[error("requires cycle detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// The rendering attribute overlay cannot be parsed.
    #[error("failed to parse {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Any other file-system failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ModgraphError {
    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ModulePathNotFound { .. } => ErrorCode::ModulePathNotFound,
            Self::ModuleNotFound { .. } | Self::RequiredModuleNotFound { .. } => {
                ErrorCode::ModuleNotFound
            }
            Self::ArchiveNotFound { .. } | Self::ArchiveUnreadable { .. } => {
                ErrorCode::ArchiveNotFound
            }
            Self::ArchiveFormat { .. } => ErrorCode::ArchiveFormat,
            Self::InvalidDescriptor { .. } => ErrorCode::InvalidDescriptor,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Self::Io { .. } => ErrorCode::IoFailed,
        }
    }

    /// Returns `true` for the "something referenced does not exist" family.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::ModulePathNotFound | ErrorCode::ModuleNotFound | ErrorCode::ArchiveNotFound
        )
    }

    pub(crate) fn archive_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ArchiveFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_descriptor(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}
