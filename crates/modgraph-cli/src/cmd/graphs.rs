use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use modgraph_core::{ModuleCatalog, load_dot_attributes};
use modgraph_graph::{reduce, reduce_projected, resolve, style};
use modgraph_report::render_styled;
use tracing::{debug, info};

use super::CatalogArgs;
use crate::timing::Timings;

#[derive(Args, Debug)]
pub struct GraphsArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Directory the `<module>.dot` files are written to.
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,

    /// Only draw modules that export an unqualified package, and aggregators
    /// that re-export through `requires transitive`.
    #[arg(long)]
    pub spec: bool,

    /// TOML file overriding the rendering attributes.
    #[arg(long = "dot-attributes", value_name = "FILE")]
    pub dot_attributes: Option<PathBuf>,

    /// Modules to draw. Defaults to every module in the catalog.
    #[arg(value_name = "MODULE")]
    pub modules: Vec<String>,
}

pub fn run_graphs(args: &GraphsArgs, timings: &mut Timings) -> anyhow::Result<()> {
    let attrs = load_dot_attributes(args.dot_attributes.as_deref())?;
    let catalog = args.catalog.load(timings)?;

    let targets = if args.modules.is_empty() {
        default_targets(&catalog, args.spec)
    } else {
        args.modules.clone()
    };

    let mut rendered = Vec::with_capacity(targets.len());
    for module in &targets {
        let config = timings.time("resolve", || resolve([module.as_str()], &catalog))?;
        let reduced = timings.time("reduce", || {
            if args.spec {
                reduce_projected(&config, |m| m == module.as_str() || catalog.is_spec_module(m))
            } else {
                reduce(&config)
            }
        })?;
        let dot = timings.time("render", || {
            render_styled(module, &style(&reduced, &attrs), &attrs)
        });
        debug!(module = %module, edges = reduced.edge_count(), "graph rendered");
        rendered.push((module.as_str(), dot));
    }

    timings.time("write", || write_graphs(&args.output, &rendered))?;
    info!(
        graphs = rendered.len(),
        output = %args.output.display(),
        "module graphs written"
    );
    Ok(())
}

fn default_targets(catalog: &ModuleCatalog, spec_only: bool) -> Vec<String> {
    catalog
        .module_names()
        .filter(|m| !spec_only || catalog.is_spec_module(m))
        .map(String::from)
        .collect()
}

/// Write every graph into a staging directory next to `dir`, then move the
/// files into place. A failed write leaves `dir` untouched.
fn write_graphs(dir: &Path, graphs: &[(&str, String)]) -> anyhow::Result<()> {
    let staging = staging_dir(dir);
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("failed to clear {}", staging.display()))?;
    }
    if let Some(parent) = staging.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    fs::create_dir(&staging)
        .with_context(|| format!("failed to create staging directory {}", staging.display()))?;

    let staged = stage_graphs(&staging, graphs).and_then(|()| publish(&staging, dir, graphs));
    if staged.is_err() {
        let _ = fs::remove_dir_all(&staging);
    }
    staged
}

fn stage_graphs(staging: &Path, graphs: &[(&str, String)]) -> anyhow::Result<()> {
    for (module, dot) in graphs {
        let path = staging.join(format!("{module}.dot"));
        fs::write(&path, dot).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn publish(staging: &Path, dir: &Path, graphs: &[(&str, String)]) -> anyhow::Result<()> {
    if !dir.exists() {
        return fs::rename(staging, dir)
            .with_context(|| format!("failed to move graphs into {}", dir.display()));
    }
    for (module, _) in graphs {
        let name = format!("{module}.dot");
        let target = dir.join(&name);
        fs::rename(staging.join(&name), &target)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }
    fs::remove_dir(staging)
        .with_context(|| format!("failed to remove staging directory {}", staging.display()))
}

fn staging_dir(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map_or_else(|| "graphs".into(), |n| n.to_string_lossy().into_owned());
    dir.with_file_name(format!(".{name}.partial"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn graphs_land_in_a_new_directory() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let graphs = [("a", "digraph a {}\n".to_string()), ("b", "digraph b {}\n".to_string())];

        write_graphs(&out, &graphs).unwrap();

        assert_eq!(fs::read_to_string(out.join("a.dot")).unwrap(), "digraph a {}\n");
        assert!(out.join("b.dot").exists());
        assert!(!staging_dir(&out).exists());
    }

    #[test]
    fn existing_directory_keeps_unrelated_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("notes.txt"), "keep").unwrap();
        fs::write(out.join("a.dot"), "old").unwrap();

        write_graphs(&out, &[("a", "new".to_string())]).unwrap();

        assert_eq!(fs::read_to_string(out.join("a.dot")).unwrap(), "new");
        assert_eq!(fs::read_to_string(out.join("notes.txt")).unwrap(), "keep");
        assert!(!staging_dir(&out).exists());
    }

    #[test]
    fn failed_write_leaves_output_untouched() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        // the second name needs a subdirectory that is never created
        let graphs = [("a", "x".to_string()), ("missing/b", "y".to_string())];

        assert!(write_graphs(&out, &graphs).is_err());
        assert!(!out.exists());
        assert!(!staging_dir(&out).exists());

        fs::create_dir(&out).unwrap();
        fs::write(out.join("a.dot"), "old").unwrap();
        assert!(write_graphs(&out, &graphs).is_err());
        assert_eq!(fs::read_to_string(out.join("a.dot")).unwrap(), "old");
    }
}
