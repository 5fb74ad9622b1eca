//! Graph structures mutated by skeleton discovery.
//!
//! - `AdjacencyGraph`: the undirected skeleton, indexed by variable
//! - `PendingRemovals`: batched removals for stable depth passes
//! - `SepsetStore`: separating sets per ordered pair

mod adjacency;
mod sepset;

pub use adjacency::{AdjacencyGraph, PendingRemovals};
pub use sepset::{ConditioningSet, SepsetStore};
