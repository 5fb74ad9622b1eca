//! d-separation oracle over a known DAG.

use std::collections::{BTreeSet, VecDeque};

use common_error::{KausalError, KausalResult};

use crate::{check_arguments, IndependenceTest};

/// Perfect independence oracle for a known DAG.
///
/// `p_value` is `1.0` when `x` and `y` are d-separated by `cond` and `0.0`
/// otherwise, so any `alpha` in `(0, 1)` turns it into exact answers.
#[derive(Debug, Clone)]
pub struct DSeparation {
    parents: Vec<Vec<usize>>,
}

impl DSeparation {
    /// Build the oracle over `n` variables from directed `(parent, child)` edges.
    pub fn new(n: usize, edges: &[(usize, usize)]) -> KausalResult<Self> {
        let mut parents = vec![Vec::new(); n];
        for &(from, to) in edges {
            if from >= n || to >= n {
                return Err(KausalError::graph(format!(
                    "edge {from} -> {to} out of range for {n} variables"
                )));
            }
            if from == to {
                return Err(KausalError::graph(format!("self loop on {from}")));
            }
            if !parents[to].contains(&from) {
                parents[to].push(from);
            }
        }
        let oracle = Self { parents };
        oracle.check_acyclic()?;
        Ok(oracle)
    }

    /// Parents of `v`.
    pub fn parents(&self, v: usize) -> &[usize] {
        self.parents.get(v).map_or(&[], Vec::as_slice)
    }

    /// Undirected skeleton of the DAG as `(a, b)` pairs with `a < b`.
    pub fn skeleton(&self) -> BTreeSet<(usize, usize)> {
        self.parents
            .iter()
            .enumerate()
            .flat_map(|(child, ps)| ps.iter().map(move |&p| (p.min(child), p.max(child))))
            .collect()
    }

    fn check_acyclic(&self) -> KausalResult<()> {
        let n = self.parents.len();
        let mut children = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];
        for (child, ps) in self.parents.iter().enumerate() {
            in_degree[child] = ps.len();
            for &p in ps {
                children[p].push(child);
            }
        }
        let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
        let mut visited = 0;
        while let Some(v) = queue.pop_front() {
            visited += 1;
            for &c in &children[v] {
                in_degree[c] -= 1;
                if in_degree[c] == 0 {
                    queue.push_back(c);
                }
            }
        }
        common_error::ensure!(visited == n, GraphError: "directed edges contain a cycle");
        Ok(())
    }

    /// Whether `x` and `y` are d-separated given `cond`.
    ///
    /// Uses the moral graph of the ancestral set of `{x, y} ∪ cond`: they are
    /// d-separated iff no path joins them once `cond` is deleted.
    pub fn is_d_separated(&self, x: usize, y: usize, cond: &[usize]) -> KausalResult<bool> {
        check_arguments(self.parents.len(), x, y, cond)?;
        let n = self.parents.len();

        let mut ancestral = vec![false; n];
        let mut stack: Vec<usize> = [x, y].into_iter().chain(cond.iter().copied()).collect();
        while let Some(v) = stack.pop() {
            if ancestral[v] {
                continue;
            }
            ancestral[v] = true;
            stack.extend(self.parents[v].iter().copied().filter(|&p| !ancestral[p]));
        }

        let mut moral: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        for child in (0..n).filter(|&v| ancestral[v]) {
            let ps = &self.parents[child];
            for (i, &p) in ps.iter().enumerate() {
                moral[p].insert(child);
                moral[child].insert(p);
                for &q in &ps[i + 1..] {
                    moral[p].insert(q);
                    moral[q].insert(p);
                }
            }
        }

        let mut blocked = vec![false; n];
        for &z in cond {
            blocked[z] = true;
        }
        let mut seen = vec![false; n];
        let mut queue = VecDeque::from([x]);
        seen[x] = true;
        while let Some(v) = queue.pop_front() {
            if v == y {
                return Ok(false);
            }
            for &w in &moral[v] {
                if !seen[w] && !blocked[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
        Ok(true)
    }
}

impl IndependenceTest for DSeparation {
    fn name(&self) -> &'static str {
        "d_separation"
    }

    fn num_vars(&self) -> usize {
        self.parents.len()
    }

    fn p_value(&self, x: usize, y: usize, cond: &[usize]) -> KausalResult<f64> {
        Ok(if self.is_d_separated(x, y, cond)? { 1.0 } else { 0.0 })
    }
}
