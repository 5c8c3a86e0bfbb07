//! The routing graph.
//!
//! A directed multigraph over stop ids, with one edge per adjacent stop pair
//! per line in each direction. Built from the whole corpus and shared
//! read-only between requests.

mod build;
mod edge;

pub use build::{DEFAULT_HOP_MIN, MAX_SAMPLED_HOP_MIN, average_hop_duration, build_graph};
pub use edge::{Direction, Edge, Graph};

#[cfg(test)]
pub(crate) use build::test_support;
