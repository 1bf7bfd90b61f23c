pub mod graphs;
pub mod resolve;
pub mod summary;

use std::path::PathBuf;

use clap::Args;
use modgraph_core::{DEFAULT_BASE_MODULE, ModuleCatalog};

use crate::timing::Timings;

/// Where to find module archives, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Directory containing the module archives (`*.jmod`).
    #[arg(long = "module-path", value_name = "DIR")]
    pub module_path: PathBuf,

    /// Module every other module implicitly requires.
    #[arg(long = "base-module", value_name = "NAME", default_value = DEFAULT_BASE_MODULE)]
    pub base_module: String,
}

impl CatalogArgs {
    /// Scan the module path into a catalog.
    pub fn load(&self, timings: &mut Timings) -> anyhow::Result<ModuleCatalog> {
        let catalog =
            timings.time("scan", || ModuleCatalog::scan(&self.module_path, &self.base_module))?;
        Ok(catalog)
    }
}
