use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use modgraph_graph::resolve;
use modgraph_report::render_summary;
use tracing::info;

use super::CatalogArgs;
use crate::timing::Timings;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// HTML file to write.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Root module of the summarized configuration (repeatable). Defaults
    /// to every module in the catalog.
    #[arg(long = "root", value_name = "NAME")]
    pub roots: Vec<String>,
}

pub fn run_summary(args: &SummaryArgs, timings: &mut Timings) -> anyhow::Result<()> {
    let catalog = args.catalog.load(timings)?;

    let roots = if args.roots.is_empty() {
        catalog.module_names().map(String::from).collect()
    } else {
        args.roots.clone()
    };

    let config = timings.time("resolve", || resolve(roots, &catalog))?;
    let html = timings.time("render", || render_summary(&catalog, &config))?;

    timings.time("write", || {
        fs::write(&args.output, &html)
            .with_context(|| format!("failed to write {}", args.output.display()))
    })?;
    info!(
        modules = config.len(),
        output = %args.output.display(),
        "module summary written"
    );
    Ok(())
}
