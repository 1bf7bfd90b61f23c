
use clap::Args;
use modgraph_graph::resolve;
use serde::Serialize;

use super::CatalogArgs;
use crate::output::{OutputMode, render};
use crate::timing::Timings;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Root module to resolve from (repeatable).
    #[arg(long = "root", value_name = "NAME", required = true)]
    pub roots: Vec<String>,

    /// Emit JSON instead of one module per line.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Resolved<'a> {
    roots: Vec<&'a str>,
    modules: Vec<&'a str>,
}

pub fn run_resolve(args: &ResolveArgs, timings: &mut Timings) -> anyhow::Result<()> {
    let catalog = args.catalog.load(timings)?;
    let config = timings.time("resolve", || resolve(args.roots.iter().cloned(), &catalog))?;

    let resolved = Resolved {
        roots: config.roots().iter().map(String::as_str).collect(),
        modules: config.modules().collect(),
    };
    render(OutputMode::from_json_flag(args.json), &resolved, |r, w| {
        for module in &r.modules {
            writeln!(w, "{module}")?;
        }
        Ok(())
    })
}
