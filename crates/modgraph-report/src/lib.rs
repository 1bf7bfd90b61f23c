#![forbid(unsafe_code)]
//! Report rendering for modgraph.
//!
//! Both renderers are deterministic: every set and map is iterated in
//! sorted order, so rendering the same input twice yields identical bytes.

pub mod dot;
pub mod summary;

pub use dot::{render_graph, render_styled};
pub use summary::render_summary;
