//! Synthetic data for playground runs.
//!
//! Every generator is seeded, so a command line reproduces the same data.

use std::collections::BTreeSet;

use common_error::{KausalError, KausalResult};
use kausal_core::{RawMatrix, RawValue};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// A DAG whose edges go from lower to higher vertex index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleDag {
    /// Number of variables.
    pub n_vars: usize,
    /// Directed `(parent, child)` edges.
    pub edges: Vec<(usize, usize)>,
}

impl SampleDag {
    /// Undirected skeleton as `(a, b)` with `a < b`.
    pub fn skeleton(&self) -> BTreeSet<(usize, usize)> {
        self.edges.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect()
    }

    /// Parents of `v`.
    pub fn parents(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().filter(move |e| e.1 == v).map(|e| e.0)
    }
}

/// Random DAG: each forward pair `(a, b)`, `a < b`, is an edge with probability `density`.
pub fn sample_dag(n_vars: usize, density: f64, seed: u64) -> KausalResult<SampleDag> {
    common_error::ensure!(
        (0.0..=1.0).contains(&density),
        InvalidArgument: "density must be in [0, 1], got {density}"
    );
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for a in 0..n_vars {
        for b in a + 1..n_vars {
            if rng.gen_bool(density) {
                edges.push((a, b));
            }
        }
    }
    Ok(SampleDag { n_vars, edges })
}

/// The chain `0 -> 1 -> ... -> n-1`.
pub fn chain_dag(n_vars: usize) -> SampleDag {
    SampleDag {
        n_vars,
        edges: (1..n_vars).map(|v| (v - 1, v)).collect(),
    }
}

/// Sample a linear Gaussian model over `dag`.
///
/// Each variable is a weighted sum of its parents plus standard normal noise,
/// with weights drawn from `±[0.5, 1.5]`. Every edge must go from a lower to
/// a higher index below `dag.n_vars`.
pub fn linear_gaussian(dag: &SampleDag, rows: usize, seed: u64) -> KausalResult<RawMatrix> {
    for &(parent, child) in &dag.edges {
        common_error::ensure!(
            parent < child && child < dag.n_vars,
            InvalidArgument: "edge ({parent}, {child}) is not a forward edge over {} variables",
            dag.n_vars
        );
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0)
        .map_err(|e| KausalError::internal(format!("noise distribution: {e}")))?;

    let weights: Vec<f64> = dag
        .edges
        .iter()
        .map(|_| {
            let magnitude = rng.gen_range(0.5..1.5);
            if rng.gen_bool(0.5) {
                magnitude
            } else {
                -magnitude
            }
        })
        .collect();

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(dag.n_vars);
    for v in 0..dag.n_vars {
        let mut column: Vec<f64> = (0..rows).map(|_| noise.sample(&mut rng)).collect();
        for (&(parent, child), &weight) in dag.edges.iter().zip(&weights) {
            if child == v {
                for (value, p) in column.iter_mut().zip(&columns[parent]) {
                    *value += weight * p;
                }
            }
        }
        columns.push(column);
    }

    RawMatrix::from_columns(
        columns
            .into_iter()
            .map(|c| c.into_iter().map(RawValue::Number).collect())
            .collect(),
    )
}

/// Labelled discrete chain `X -> Z -> Y`, returned as columns `[X, Y, Z]`.
///
/// `X` is uniform over `levels` labels; `Z` copies `X` and `Y` copies `Z`,
/// each replaced by a uniform draw with probability 0.2.
pub fn discrete_chain(rows: usize, levels: usize, seed: u64) -> KausalResult<RawMatrix> {
    common_error::ensure!(levels >= 2, InvalidArgument: "need at least 2 levels, got {levels}");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let copy_or_redraw = |value: usize, rng: &mut ChaCha8Rng| {
        if rng.gen_bool(0.2) {
            rng.gen_range(0..levels)
        } else {
            value
        }
    };

    let mut x = Vec::with_capacity(rows);
    let mut y = Vec::with_capacity(rows);
    let mut z = Vec::with_capacity(rows);
    for _ in 0..rows {
        let xv = rng.gen_range(0..levels);
        let zv = copy_or_redraw(xv, &mut rng);
        let yv = copy_or_redraw(zv, &mut rng);
        x.push(xv);
        y.push(yv);
        z.push(zv);
    }

    let label = |prefix: &str, values: Vec<usize>| -> Vec<RawValue> {
        values
            .into_iter()
            .map(|v| RawValue::from(format!("{prefix}{v}")))
            .collect()
    };
    RawMatrix::from_columns(vec![label("x", x), label("y", y), label("z", z)])
}
