#![forbid(unsafe_code)]
//! modgraph-core library.
//!
//! # Conventions
//!
//! - **Errors**: Use [`error::Result`] for return types; every failure maps to
//!   a stable [`error::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod archive;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;

pub use archive::{ArchiveMetadata, ContentKind, ContentStats};
pub use catalog::{DEFAULT_BASE_MODULE, ModuleCatalog};
pub use config::{DotAttributes, WeightRule, load_dot_attributes};
pub use descriptor::{Export, ModuleDescriptor, Requires};
pub use error::{ErrorCode, ModgraphError, Result};
