//! Skeleton discovery results.

use std::time::Duration;

use kausal_core::{AdjacencyGraph, SepsetStore};
use serde::Serialize;

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryStats {
    /// Number of depth passes executed.
    pub depths_run: usize,
    /// Largest depth executed, if any pass ran.
    pub max_depth: Option<usize>,
    /// Independence tests invoked, failed ones included.
    pub tests_run: usize,
    /// Edges removed from the complete graph.
    pub edges_removed: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// The estimated skeleton together with its separation sets.
#[derive(Debug, Clone, Serialize)]
pub struct SkeletonResult {
    /// The pruned undirected graph.
    pub graph: AdjacencyGraph,
    /// Conditioning sets that separated each removed pair.
    pub sepsets: SepsetStore,
    /// Run counters.
    pub stats: DiscoveryStats,
}

impl SkeletonResult {
    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.graph.num_vars()
    }

    /// Pairs `(a, b)` with `a < b` that are no longer adjacent.
    pub fn removed_edges(&self) -> Vec<(usize, usize)> {
        let n = self.graph.num_vars();
        (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
            .filter(|&(a, b)| !self.graph.has_edge(a, b))
            .collect()
    }

    /// Remaining edges as `(a, b)` with `a < b`.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.graph.edges().collect()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} edges kept, {} removed, {} tests over {} depths in {:?}",
            self.graph.edge_count(),
            self.stats.edges_removed,
            self.stats.tests_run,
            self.stats.depths_run,
            self.stats.elapsed
        )
    }
}
