//! Requires-graph construction from a resolved configuration.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A requires B". Edge weights carry the requires
//! modifiers so later stages can tell a `requires transitive` from a plain
//! `requires`, and the implicit base-module edge from both.
//!
//! Nodes and edges are inserted in name order, so two graphs built from the
//! same configuration have identical node indices.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::instrument;

use crate::resolve::ResolvedConfiguration;

/// Modifiers of one requires edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiresEdge {
    pub transitive: bool,
    pub mandated: bool,
}

/// Directed requires graph over the members of a configuration.
#[derive(Debug, Clone)]
pub struct RequiresGraph {
    /// Nodes are module names; edges point from requirer to required.
    pub graph: DiGraph<String, RequiresEdge>,
    /// Module name → node index.
    pub node_map: HashMap<String, NodeIndex>,
}

impl RequiresGraph {
    /// Materialize every direct requires edge among the members of `config`.
    ///
    /// Configurations are closed under requires, so every edge target is a
    /// member; a target that is not (which can only happen with a
    /// hand-assembled configuration) is skipped.
    #[must_use]
    #[instrument(skip_all, fields(modules = config.len()))]
    pub fn from_configuration(config: &ResolvedConfiguration) -> Self {
        let mut graph = DiGraph::<String, RequiresEdge>::with_capacity(config.len(), config.len());
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(config.len());

        for name in config.modules() {
            let idx = graph.add_node(name.to_string());
            node_map.insert(name.to_string(), idx);
        }

        for descriptor in config.descriptors() {
            let Some(&from) = node_map.get(descriptor.name()) else {
                continue;
            };
            for req in descriptor.requires() {
                let Some(&to) = node_map.get(&req.name) else {
                    continue;
                };
                graph.add_edge(
                    from,
                    to,
                    RequiresEdge {
                        transitive: req.transitive,
                        mandated: req.mandated,
                    },
                );
            }
        }

        Self { graph, node_map }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node_index(&self, module: &str) -> Option<NodeIndex> {
        self.node_map.get(module).copied()
    }

    #[must_use]
    pub fn module(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }
}
