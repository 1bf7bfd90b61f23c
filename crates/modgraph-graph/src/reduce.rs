//! Transitive reduction of the requires graph.
//!
//! # Overview
//!
//! An edge `A → C` is redundant when some other path `A → B → … → C`
//! already exists. Removing every redundant edge gives the minimal edge set
//! with the same reachability, which for a DAG is unique; that is what the
//! graph renderer draws.
//!
//! # Projection
//!
//! [`reduce_projected`] first narrows the graph to a subset of modules
//! while keeping reachability: a kept module `A` gets an edge to a kept
//! module `B` when `B` is reachable from `A` through removed modules only.
//! The projected graph is then reduced as usual.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use modgraph_core::{ModgraphError, Result};
use petgraph::{
    Direction,
    algo::toposort,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use tracing::{debug, instrument};

use crate::build::{RequiresEdge, RequiresGraph};
use crate::resolve::ResolvedConfiguration;

// ---------------------------------------------------------------------------
// ReducedGraph
// ---------------------------------------------------------------------------

/// One surviving requires edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReducedEdge {
    pub source: String,
    pub target: String,
    pub transitive: bool,
    pub mandated: bool,
}

/// A transitively-reduced requires graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReducedGraph {
    /// Every module in the graph, including ones left without edges.
    pub nodes: BTreeSet<String>,
    /// Surviving edges, ordered by `(source, target)`.
    pub edges: Vec<ReducedEdge>,
}

impl ReducedGraph {
    fn from_graph(graph: &DiGraph<String, RequiresEdge>) -> Self {
        let nodes = graph.node_weights().cloned().collect();
        let mut edges: Vec<ReducedEdge> = graph
            .edge_references()
            .map(|e| ReducedEdge {
                source: graph[e.source()].clone(),
                target: graph[e.target()].clone(),
                transitive: e.weight().transitive,
                mandated: e.weight().mandated,
            })
            .collect();
        edges.sort();
        Self { nodes, edges }
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.source == source && e.target == target)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Reduce the requires graph of `config`.
///
/// A single-module configuration yields a graph with one node and no edges.
///
/// # Errors
///
/// Returns [`ModgraphError::CycleDetected`] if the graph is not a DAG, which
/// a configuration produced by [`crate::resolve`] never is.
#[instrument(skip_all, fields(modules = config.len()))]
pub fn reduce(config: &ResolvedConfiguration) -> Result<ReducedGraph> {
    let rg = RequiresGraph::from_configuration(config);
    let reduced = transitive_reduction(&rg.graph)?;
    debug!(
        before = rg.edge_count(),
        after = reduced.edge_count(),
        "requires graph reduced"
    );
    Ok(ReducedGraph::from_graph(&reduced))
}

/// Project `config` onto the modules accepted by `keep`, then reduce.
///
/// # Errors
///
/// As for [`reduce`].
#[instrument(skip_all, fields(modules = config.len()))]
pub fn reduce_projected<F>(config: &ResolvedConfiguration, keep: F) -> Result<ReducedGraph>
where
    F: Fn(&str) -> bool,
{
    let rg = RequiresGraph::from_configuration(config);
    let projected = project(&rg.graph, &keep);
    let reduced = transitive_reduction(&projected)?;
    debug!(
        kept = projected.node_count(),
        of = rg.node_count(),
        edges = reduced.edge_count(),
        "projected requires graph reduced"
    );
    Ok(ReducedGraph::from_graph(&reduced))
}

// ---------------------------------------------------------------------------
// Transitive reduction
// ---------------------------------------------------------------------------

/// Compute the transitive reduction of a DAG.
///
/// Returns a graph with the same nodes (and node indices) and only the
/// edges not implied by a path of length ≥ 2.
///
/// # Algorithm
///
/// Walk nodes sinks-first. The descendants of `u` are its successors plus
/// the descendants of each successor, all of which are already known. An
/// edge `(u, v)` is redundant if `v` descends from some other successor of
/// `u`.
///
/// # Errors
///
/// Returns [`ModgraphError::CycleDetected`] if `g` contains a cycle.
pub fn transitive_reduction<E: Clone>(g: &DiGraph<String, E>) -> Result<DiGraph<String, E>> {
    let topo = toposort(g, None).map_err(|cycle| ModgraphError::CycleDetected {
        path: cycle_through(g, cycle.node_id()),
    })?;

    let mut descendants: HashMap<NodeIndex, HashSet<NodeIndex>> =
        HashMap::with_capacity(g.node_count());

    for &u in topo.iter().rev() {
        let mut below: HashSet<NodeIndex> = HashSet::new();
        for v in g.neighbors_directed(u, Direction::Outgoing) {
            below.insert(v);
            if let Some(dv) = descendants.get(&v) {
                below.extend(dv.iter().copied());
            }
        }
        descendants.insert(u, below);
    }

    let redundant: HashSet<EdgeIndex> = g
        .edge_references()
        .filter(|e| {
            let (u, v) = (e.source(), e.target());
            g.neighbors_directed(u, Direction::Outgoing)
                .filter(|&w| w != v)
                .any(|w| descendants.get(&w).is_some_and(|dw| dw.contains(&v)))
        })
        .map(|e| e.id())
        .collect();

    Ok(g.filter_map(
        |_, name| Some(name.clone()),
        |idx, weight| (!redundant.contains(&idx)).then(|| weight.clone()),
    ))
}

/// Shortest cycle through `start`, as names from `start` back to itself.
///
/// Breadth-first from `start`'s successors; the first time `start` is
/// reached again the parent links spell out the cycle.
fn cycle_through<E>(g: &DiGraph<String, E>, start: NodeIndex) -> Vec<String> {
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);

    'search: while let Some(u) = queue.pop_front() {
        for v in g.neighbors_directed(u, Direction::Outgoing) {
            if v == start {
                parent.insert(start, u);
                break 'search;
            }
            if !parent.contains_key(&v) {
                parent.insert(v, u);
                queue.push_back(v);
            }
        }
    }

    let mut path = vec![g[start].clone()];
    let mut at = start;
    while let Some(&prev) = parent.get(&at) {
        path.push(g[prev].clone());
        if prev == start {
            break;
        }
        at = prev;
    }
    if path.len() == 1 {
        path.push(g[start].clone());
    }
    path.reverse();
    path
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

fn project<F>(g: &DiGraph<String, RequiresEdge>, keep: &F) -> DiGraph<String, RequiresEdge>
where
    F: Fn(&str) -> bool,
{
    let mut out = DiGraph::<String, RequiresEdge>::new();
    let mut index: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    for idx in g.node_indices() {
        if keep(&g[idx]) {
            index.insert(idx, out.add_node(g[idx].clone()));
        }
    }

    for idx in g.node_indices() {
        let Some(&from) = index.get(&idx) else {
            continue;
        };

        // Direct edges keep their modifiers; edges synthesized through
        // removed modules are plain requires.
        let mut targets: BTreeMap<NodeIndex, RequiresEdge> = BTreeMap::new();
        let mut stack: Vec<NodeIndex> = Vec::new();
        for edge in g.edges(idx) {
            if index.contains_key(&edge.target()) {
                targets.insert(edge.target(), *edge.weight());
            } else {
                stack.push(edge.target());
            }
        }

        let mut visited: HashSet<NodeIndex> = stack.iter().copied().collect();
        while let Some(removed) = stack.pop() {
            for next in g.neighbors_directed(removed, Direction::Outgoing) {
                if index.contains_key(&next) {
                    targets.entry(next).or_default();
                } else if visited.insert(next) {
                    stack.push(next);
                }
            }
        }

        for (target, weight) in targets {
            if let Some(&to) = index.get(&target) {
                out.add_edge(from, to, weight);
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use modgraph_core::{ModuleCatalog, ModuleDescriptor};

    fn catalog(spec: &[(&str, &[&str])]) -> ModuleCatalog {
        let modules = spec.iter().map(|(name, requires)| {
            let mut builder = ModuleDescriptor::builder(*name);
            for r in *requires {
                builder = builder.requires(*r);
            }
            (builder.build().unwrap(), None)
        });
        ModuleCatalog::from_modules(modules, "base").unwrap()
    }

    fn pairs(g: &ReducedGraph) -> Vec<(&str, &str)> {
        g.edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect()
    }

    #[test]
    fn transitive_reduction_removes_redundant_edge() {
        let mut g: DiGraph<String, ()> = DiGraph::new();
        let a = g.add_node("A".to_string());
        let b = g.add_node("B".to_string());
        let c = g.add_node("C".to_string());
        g.add_edge(a, b, ());
        g.add_edge(b, c, ());
        g.add_edge(a, c, ());

        let reduced = transitive_reduction(&g).unwrap();
        assert_eq!(reduced.edge_count(), 2);
        assert!(!reduced.contains_edge(a, c));
        assert!(reduced.contains_edge(a, b));
        assert!(reduced.contains_edge(b, c));
    }

    #[test]
    fn transitive_reduction_diamond_removes_diagonal() {
        let mut g: DiGraph<String, ()> = DiGraph::new();
        let a = g.add_node("A".to_string());
        let b = g.add_node("B".to_string());
        let c = g.add_node("C".to_string());
        let d = g.add_node("D".to_string());
        g.add_edge(a, b, ());
        g.add_edge(a, c, ());
        g.add_edge(b, d, ());
        g.add_edge(c, d, ());
        g.add_edge(a, d, ());

        let reduced = transitive_reduction(&g).unwrap();
        assert_eq!(reduced.edge_count(), 4);
        assert!(!reduced.contains_edge(a, d));
    }

    #[test]
    fn transitive_reduction_rejects_cycle() {
        let mut g: DiGraph<String, ()> = DiGraph::new();
        let a = g.add_node("A".to_string());
        let b = g.add_node("B".to_string());
        g.add_edge(a, b, ());
        g.add_edge(b, a, ());

        let err = transitive_reduction(&g).unwrap_err();
        assert!(matches!(err, ModgraphError::CycleDetected { .. }));
    }

    #[test]
    fn cycle_error_names_every_member() {
        let mut g: DiGraph<String, ()> = DiGraph::new();
        let a = g.add_node("A".to_string());
        let b = g.add_node("B".to_string());
        let c = g.add_node("C".to_string());
        let d = g.add_node("D".to_string());
        g.add_edge(d, a, ());
        g.add_edge(a, b, ());
        g.add_edge(b, c, ());
        g.add_edge(c, a, ());

        let ModgraphError::CycleDetected { path } = transitive_reduction(&g).unwrap_err() else {
            panic!("expected a cycle error");
        };
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), path.last());
        assert!(!path.contains(&"D".to_string()));
        let mut members: Vec<&str> = path[1..].iter().map(String::as_str).collect();
        members.sort_unstable();
        assert_eq!(members, vec!["A", "B", "C"]);
    }

    #[test]
    fn self_loop_is_a_two_element_cycle() {
        let mut g: DiGraph<String, ()> = DiGraph::new();
        let a = g.add_node("A".to_string());
        g.add_edge(a, a, ());

        let ModgraphError::CycleDetected { path } = transitive_reduction(&g).unwrap_err() else {
            panic!("expected a cycle error");
        };
        assert_eq!(path, vec!["A".to_string(), "A".to_string()]);
    }

    #[test]
    fn chain_keeps_both_edges() {
        let cat = catalog(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let config = resolve(["a"], &cat).unwrap();
        let reduced = reduce(&config).unwrap();
        assert_eq!(pairs(&reduced), vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn mandated_base_edges_collapse() {
        // every module implicitly requires base; only c's edge survives
        let cat = catalog(&[("base", &[]), ("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let config = resolve(["a"], &cat).unwrap();
        let reduced = reduce(&config).unwrap();
        assert_eq!(pairs(&reduced), vec![("a", "b"), ("b", "c"), ("c", "base")]);
        assert!(reduced.edges.iter().find(|e| e.target == "base").unwrap().mandated);
    }

    #[test]
    fn single_module_reduces_to_no_edges() {
        let cat = catalog(&[("solo", &[])]);
        let config = resolve(["solo"], &cat).unwrap();
        let reduced = reduce(&config).unwrap();
        assert!(reduced.edges.is_empty());
        assert_eq!(reduced.nodes.len(), 1);
    }

    #[test]
    fn projection_bridges_removed_modules() {
        // a -> internal -> c ; a -> d
        let cat = catalog(&[
            ("a", &["internal", "d"]),
            ("internal", &["c"]),
            ("c", &[]),
            ("d", &[]),
        ]);
        let config = resolve(["a"], &cat).unwrap();
        let reduced = reduce_projected(&config, |m| m != "internal").unwrap();

        assert!(!reduced.nodes.contains("internal"));
        assert_eq!(pairs(&reduced), vec![("a", "c"), ("a", "d")]);
        assert!(reduced.edges.iter().all(|e| !e.transitive));
    }

    #[test]
    fn projection_keeps_direct_edge_modifiers() {
        let modules = [
            ModuleDescriptor::builder("a")
                .requires_transitive("b")
                .requires("x")
                .build()
                .unwrap(),
            ModuleDescriptor::builder("x").requires("b").build().unwrap(),
            ModuleDescriptor::builder("b").build().unwrap(),
        ];
        let cat =
            ModuleCatalog::from_modules(modules.into_iter().map(|d| (d, None)), "base").unwrap();
        let config = resolve(["a"], &cat).unwrap();
        let reduced = reduce_projected(&config, |m| m != "x").unwrap();

        assert_eq!(reduced.edge_count(), 1);
        assert!(reduced.edges[0].transitive);
    }

    #[test]
    fn projection_then_reduction_drops_implied_edges() {
        // a -> b, a -> x -> c, b -> c: a -> c is synthesized and then reduced away
        let cat = catalog(&[("a", &["b", "x"]), ("x", &["c"]), ("b", &["c"]), ("c", &[])]);
        let config = resolve(["a"], &cat).unwrap();
        let reduced = reduce_projected(&config, |m| m != "x").unwrap();
        assert_eq!(pairs(&reduced), vec![("a", "b"), ("b", "c")]);
    }
}
