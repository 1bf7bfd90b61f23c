//! Presentation stage: edge weights and rank bands.
//!
//! Nothing here changes which edges exist. Weights only pull related nodes
//! together in a layout engine; rank bands only ask it to line modules up.
//!
//! Weight precedence for an edge `from -> to`:
//!
//! 1. an explicit [`modgraph_core::WeightRule`] for the pair,
//! 2. `platformWeight` when both endpoints are platform modules,
//! 3. `1`.

use std::collections::BTreeSet;

use modgraph_core::DotAttributes;

use crate::reduce::ReducedGraph;

/// Weight given to edges no rule applies to.
pub const DEFAULT_WEIGHT: u32 = 1;

/// A reduced edge with its rendering weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
    pub transitive: bool,
    pub mandated: bool,
}

/// A reduced graph ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledGraph {
    pub nodes: BTreeSet<String>,
    /// Edges ordered by `(source, target)`.
    pub edges: Vec<GraphEdge>,
    /// Rank bands restricted to present nodes; each has two or more members.
    pub ranks: Vec<Vec<String>>,
}

/// Apply weights and rank bands from `attrs` to a reduced graph.
#[must_use]
pub fn style(reduced: &ReducedGraph, attrs: &DotAttributes) -> StyledGraph {
    let edges = reduced
        .edges
        .iter()
        .map(|e| GraphEdge {
            source: e.source.clone(),
            target: e.target.clone(),
            weight: edge_weight(&e.source, &e.target, attrs),
            transitive: e.transitive,
            mandated: e.mandated,
        })
        .collect();

    let ranks = attrs
        .ranks
        .iter()
        .filter_map(|band| {
            let mut present: Vec<String> = Vec::with_capacity(band.len());
            for module in band {
                if reduced.nodes.contains(module) && !present.contains(module) {
                    present.push(module.clone());
                }
            }
            (present.len() >= 2).then_some(present)
        })
        .collect();

    StyledGraph {
        nodes: reduced.nodes.clone(),
        edges,
        ranks,
    }
}

fn edge_weight(from: &str, to: &str, attrs: &DotAttributes) -> u32 {
    if let Some(weight) = attrs.explicit_weight(from, to) {
        return weight;
    }
    if attrs.is_platform(from) && attrs.is_platform(to) {
        return attrs.platform_weight;
    }
    DEFAULT_WEIGHT
}
