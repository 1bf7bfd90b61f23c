#![forbid(unsafe_code)]
//! Requires-graph computation for modgraph.
//!
//! # Pipeline
//!
//! ```text
//! ModuleCatalog + roots
//!        ↓  resolve::resolve()
//! ResolvedConfiguration (closure of requires, acyclic)
//!        ↓  build::RequiresGraph::from_configuration()
//! RequiresGraph (petgraph DiGraph, requirer → required)
//!        ↓  reduce::reduce() / reduce::reduce_projected()
//! ReducedGraph (transitively-reduced edge set)
//!        ↓  style::style()
//! StyledGraph (weights, mandated flags, rank bands)
//! ```
//!
//! Reduction is a property of the DAG alone; everything presentational
//! happens in [`style`].

pub mod build;
pub mod reduce;
pub mod resolve;
pub mod style;

pub use build::{RequiresEdge, RequiresGraph};
pub use reduce::{ReducedEdge, ReducedGraph, reduce, reduce_projected, transitive_reduction};
pub use resolve::{ResolvedConfiguration, resolve};
pub use style::{GraphEdge, StyledGraph, style};
