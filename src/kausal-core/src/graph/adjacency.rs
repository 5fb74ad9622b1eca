//! Index-based undirected adjacency graph.

use std::collections::BTreeSet;

use common_error::{KausalError, KausalResult};
use serde::{Deserialize, Serialize};

static NO_NEIGHBORS: BTreeSet<usize> = BTreeSet::new();

/// Undirected simple graph over vertices `0..n`.
///
/// During skeleton discovery the graph starts complete and only ever loses
/// edges. Neighbor sets are kept sorted so that conditioning sets can be
/// enumerated in a fixed lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    adjacency: Vec<BTreeSet<usize>>,
}

impl AdjacencyGraph {
    /// Create a graph with `n` vertices and no edges.
    pub fn empty(n: usize) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); n],
        }
    }

    /// Create the complete graph on `n` vertices.
    pub fn complete(n: usize) -> Self {
        let adjacency = (0..n)
            .map(|x| (0..n).filter(|&y| y != x).collect())
            .collect();
        Self { adjacency }
    }

    /// Create a graph from an edge list. Edges are unordered; duplicates collapse.
    pub fn from_edges<I>(n: usize, edges: I) -> KausalResult<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut graph = Self::empty(n);
        for (a, b) in edges {
            if a >= n || b >= n {
                return Err(KausalError::graph(format!(
                    "edge ({a}, {b}) out of range for {n} vertices"
                )));
            }
            if a == b {
                return Err(KausalError::graph(format!("self loop on vertex {a}")));
            }
            graph.adjacency[a].insert(b);
            graph.adjacency[b].insert(a);
        }
        Ok(graph)
    }

    /// Number of vertices.
    pub fn num_vars(&self) -> usize {
        self.adjacency.len()
    }

    /// Neighbors of `x` in ascending order. Empty for out-of-range vertices.
    pub fn neighbors(&self, x: usize) -> &BTreeSet<usize> {
        self.adjacency.get(x).unwrap_or(&NO_NEIGHBORS)
    }

    /// Neighbors of `x` collected into a vector.
    pub fn neighbor_vec(&self, x: usize) -> Vec<usize> {
        self.neighbors(x).iter().copied().collect()
    }

    /// Check if `a` and `b` are adjacent.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Remove the edge between `a` and `b`. Returns whether an edge was removed.
    pub fn remove_edge(&mut self, a: usize, b: usize) -> bool {
        if a >= self.adjacency.len() || b >= self.adjacency.len() {
            return false;
        }
        let removed = self.adjacency[a].remove(&b);
        self.adjacency[b].remove(&a);
        removed
    }

    /// Number of neighbors of `x`.
    pub fn degree(&self, x: usize) -> usize {
        self.neighbors(x).len()
    }

    /// Largest degree over all vertices (0 for an empty vertex set).
    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).max().unwrap_or(0)
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Edges as `(a, b)` with `a < b`, in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(a, neighbors)| {
            neighbors.range(a + 1..).map(move |&b| (a, b))
        })
    }
}

/// Edge removals collected during one stable depth pass.
///
/// Ordered pairs may be pushed in any order and any number of times; they are
/// collapsed to unordered edges when applied.
#[derive(Debug, Clone, Default)]
pub struct PendingRemovals {
    pairs: Vec<(usize, usize)>,
}

impl PendingRemovals {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the ordered pair `(x, y)`.
    pub fn push(&mut self, x: usize, y: usize) {
        self.pairs.push((x, y));
    }

    /// Number of queued pairs, duplicates included.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Deduplicate and remove every queued edge. Returns the number of edges removed.
    pub fn apply(self, graph: &mut AdjacencyGraph) -> usize {
        let edges: BTreeSet<(usize, usize)> = self
            .pairs
            .into_iter()
            .map(|(x, y)| (x.min(y), x.max(y)))
            .collect();
        edges
            .into_iter()
            .filter(|&(a, b)| graph.remove_edge(a, b))
            .count()
    }
}

impl Extend<(usize, usize)> for PendingRemovals {
    fn extend<T: IntoIterator<Item = (usize, usize)>>(&mut self, iter: T) {
        self.pairs.extend(iter);
    }
}
