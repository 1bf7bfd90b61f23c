//! HTML size summary of a resolved configuration.
//!
//! One row per member module with its per-kind content inventory, its own
//! size, and the size of everything it drags in. A totals row closes the
//! table.

use std::fmt::Write as FmtWrite;

use modgraph_core::{ArchiveMetadata, ContentKind, ContentStats, ModuleCatalog, Result};
use modgraph_graph::ResolvedConfiguration;
use tracing::{debug, instrument};

const STYLE: &str = "\
body { font-family: sans-serif; }
table { border-collapse: collapse; }
th, td { border: 1px solid #cccccc; padding: 2px 6px; }
td.num { text-align: right; }
tr.total td { font-weight: bold; }
";

const AGGREGATOR_NOTE: &str =
    "* aggregator module: packages its module descriptor and nothing else";

/// State carried across row rendering.
#[derive(Debug, Default)]
struct RenderContext {
    aggregators: usize,
}

impl RenderContext {
    fn note_aggregator(&mut self) {
        self.aggregators += 1;
    }

    fn needs_aggregator_note(&self) -> bool {
        self.aggregators > 0
    }
}

/// Everything reported for one module.
#[derive(Debug)]
struct ModuleRow<'a> {
    name: &'a str,
    metadata: &'a ArchiveMetadata,
    direct: usize,
    transitive: usize,
    deps_bytes: u64,
    closure_archive_bytes: u64,
}

/// Render the HTML summary of `config`.
///
/// # Errors
///
/// [`modgraph_core::ModgraphError::ArchiveNotFound`] if a member was
/// catalogued without archive metadata; no partial report is produced.
#[instrument(skip_all, fields(modules = config.len()))]
pub fn render_summary(catalog: &ModuleCatalog, config: &ResolvedConfiguration) -> Result<String> {
    let rows = config
        .modules()
        .map(|name| summarize(catalog, config, name))
        .collect::<Result<Vec<_>>>()?;

    let mut ctx = RenderContext::default();
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Module summary</title>\n");
    let _ = write!(out, "<style>\n{STYLE}</style>\n");
    out.push_str("</head>\n<body>\n<h1>Module summary</h1>\n");

    let roots: Vec<String> = config.roots().iter().map(|r| escape(r)).collect();
    let _ = writeln!(out, "<p class=\"roots\">Roots: {}</p>", roots.join(", "));

    out.push_str("<table>\n<thead>\n");
    write_header(&mut out);
    out.push_str("</thead>\n<tbody>\n");
    for row in &rows {
        write_row(&mut out, row, &mut ctx);
    }
    out.push_str("</tbody>\n<tfoot>\n");
    write_totals(&mut out, &rows);
    out.push_str("</tfoot>\n</table>\n");

    if ctx.needs_aggregator_note() {
        let _ = writeln!(out, "<p class=\"note\">{}</p>", escape(AGGREGATOR_NOTE));
    }
    out.push_str("</body>\n</html>\n");

    debug!(rows = rows.len(), aggregators = ctx.aggregators, "rendered summary");
    Ok(out)
}

fn summarize<'a>(
    catalog: &'a ModuleCatalog,
    config: &ResolvedConfiguration,
    name: &'a str,
) -> Result<ModuleRow<'a>> {
    let metadata = catalog.archive_metadata(name)?;
    let deps = config.dependencies_of(name);

    let mut deps_bytes = 0;
    let mut closure_archive_bytes = metadata.archive_bytes();
    for dep in &deps {
        let dep_meta = catalog.archive_metadata(dep)?;
        deps_bytes += dep_meta.module_bytes();
        closure_archive_bytes += dep_meta.archive_bytes();
    }

    Ok(ModuleRow {
        name,
        metadata,
        direct: config.direct_dependencies(name).len(),
        transitive: deps.len(),
        deps_bytes,
        closure_archive_bytes,
    })
}

fn write_header(out: &mut String) {
    out.push_str("<tr><th rowspan=\"2\">Module</th>");
    for kind in ContentKind::ALL {
        let _ = write!(out, "<th colspan=\"2\">{}</th>", escape(kind.label()));
    }
    out.push_str(
        "<th rowspan=\"2\">Module size</th>\
         <th rowspan=\"2\">Direct deps</th>\
         <th rowspan=\"2\">Transitive deps</th>\
         <th rowspan=\"2\">Dependency size</th>\
         <th rowspan=\"2\">Archive closure size</th></tr>\n<tr>",
    );
    for _ in ContentKind::ALL {
        out.push_str("<th>count</th><th>bytes</th>");
    }
    out.push_str("</tr>\n");
}

fn write_row(out: &mut String, row: &ModuleRow<'_>, ctx: &mut RenderContext) {
    let flag = if row.metadata.is_aggregator() {
        ctx.note_aggregator();
        " *"
    } else {
        ""
    };
    let _ = write!(out, "<tr><td class=\"name\">{}{flag}</td>", escape(row.name));
    for kind in ContentKind::ALL {
        write_stats(out, row.metadata.stats(kind));
    }
    write_num(out, row.metadata.module_bytes());
    write_num(out, row.direct as u64);
    write_num(out, row.transitive as u64);
    write_num(out, row.deps_bytes);
    write_num(out, row.closure_archive_bytes);
    out.push_str("</tr>\n");
}

fn write_totals(out: &mut String, rows: &[ModuleRow<'_>]) {
    let _ = write!(out, "<tr class=\"total\"><td>Total ({} modules)</td>", rows.len());
    for kind in ContentKind::ALL {
        let total = rows.iter().fold(ContentStats::default(), |acc, row| {
            let s = row.metadata.stats(kind);
            ContentStats {
                count: acc.count + s.count,
                bytes: acc.bytes + s.bytes,
            }
        });
        write_stats(out, total);
    }
    write_num(out, rows.iter().map(|r| r.metadata.module_bytes()).sum());
    out.push_str("<td></td><td></td><td></td>");
    write_num(out, rows.iter().map(|r| r.metadata.archive_bytes()).sum());
    out.push_str("</tr>\n");
}

fn write_stats(out: &mut String, stats: ContentStats) {
    write_num(out, stats.count);
    write_num(out, stats.bytes);
}

fn write_num(out: &mut String, n: u64) {
    let _ = write!(out, "<td class=\"num\">{}</td>", group_digits(n));
}

/// `1234567` → `"1,234,567"`.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
