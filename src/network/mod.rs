//! Weighted directed graph over map nodes, with shortest-path queries.
//!
//! Costs are real values on the way in and out; internally they are held
//! as millicosts (cost times 1000, rounded, saturating at the `i32` range).

mod builder;
mod graph;
mod shortest_path;

pub use builder::NetworkBuilder;
pub use graph::{millicost, Edge, Graph};
pub use shortest_path::{default_clip, Clip, ClipContext, ShortestPath};
