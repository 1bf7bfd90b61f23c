//! DOT rendering of a reduced requires graph.
//!
//! Platform modules (names under `platformPrefix`) and the rest are emitted
//! as two subgraphs so each gets its own font colour. Edge styling:
//!
//! - `requires transitive` → solid
//! - plain `requires` → dashed
//! - mandated base-module edge → `requiresMandatedColor`

use std::fmt::Write as FmtWrite;

use modgraph_core::{DotAttributes, Result};
use modgraph_graph::{ResolvedConfiguration, StyledGraph, reduce, style};
use tracing::instrument;

/// Reduce, style and render the requires graph of `config`.
///
/// The graph is titled after its root (or roots, joined with `+`).
///
/// # Errors
///
/// Propagates [`modgraph_core::ModgraphError::CycleDetected`] from reduction.
#[instrument(skip_all, fields(roots = ?config.roots()))]
pub fn render_graph(config: &ResolvedConfiguration, attrs: &DotAttributes) -> Result<String> {
    let title = config
        .roots()
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("+");
    let reduced = reduce(config)?;
    Ok(render_styled(&title, &style(&reduced, attrs), attrs))
}

/// Render an already-styled graph.
#[must_use]
pub fn render_styled(title: &str, graph: &StyledGraph, attrs: &DotAttributes) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "digraph {} {{", quote(title));
    let _ = writeln!(out, "  nodesep=.5;");
    let _ = writeln!(out, "  ranksep={};", attrs.rank_sep);
    let _ = writeln!(out, "  pencolor=transparent;");
    let _ = writeln!(
        out,
        "  node [shape=plaintext, fontcolor={}, fontname={}, fontsize={}, margin=\".2,.2\"];",
        quote(&attrs.font_color),
        quote(&attrs.font_name),
        attrs.font_size
    );
    let _ = writeln!(
        out,
        "  edge [penwidth={}, color={}, arrowhead=open, arrowsize={}];",
        attrs.arrow_width,
        quote(&attrs.arrow_color),
        attrs.arrow_size
    );

    // Nodes must be declared inside their subgraph first so the subgraph's
    // font colour applies; rank bands only refer to them afterwards.
    let (platform, rest): (Vec<&String>, Vec<&String>) =
        graph.nodes.iter().partition(|m| attrs.is_platform(m));
    write_subgraph(&mut out, "platform", &attrs.platform_subgraph_color, &platform);
    write_subgraph(&mut out, "rest", &attrs.rest_subgraph_color, &rest);

    for band in &graph.ranks {
        let members: Vec<String> = band.iter().map(|m| quote(m)).collect();
        let _ = writeln!(out, "  {{rank=same {}}}", members.join(" "));
    }

    for edge in &graph.edges {
        let mut edge_attrs = vec![format!("weight={}", edge.weight)];
        if edge.mandated {
            edge_attrs.push(format!("color={}", quote(&attrs.requires_mandated_color)));
        } else if !edge.transitive {
            edge_attrs.push("style=\"dashed\"".to_string());
        }
        let _ = writeln!(
            out,
            "  {} -> {} [{}];",
            quote(&edge.source),
            quote(&edge.target),
            edge_attrs.join(", ")
        );
    }

    out.push_str("}\n");
    out
}

fn write_subgraph(out: &mut String, name: &str, color: &str, members: &[&String]) {
    if members.is_empty() {
        return;
    }
    let _ = writeln!(out, "  subgraph {name} {{");
    let _ = writeln!(out, "    node [fontcolor={}];", quote(color));
    for m in members {
        let _ = writeln!(out, "    {};", quote(m));
    }
    let _ = writeln!(out, "  }}");
}

/// DOT double-quoted string.
fn quote(s: &str) -> String {
    let mut q = String::with_capacity(s.len() + 2);
    q.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            q.push('\\');
        }
        q.push(c);
    }
    q.push('"');
    q
}
