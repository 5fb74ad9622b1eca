//! Chi-squared and G-squared tests over stratified contingency tables.

use std::collections::BTreeMap;

use common_error::{KausalError, KausalResult};
use kausal_core::DiscreteData;
use statrs::distribution::{ChiSquared as ChiSquaredDist, ContinuousCDF};

use crate::{check_arguments, IndependenceTest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statistic {
    Pearson,
    LikelihoodRatio,
}

/// Per-stratum `x` by `y` count table.
struct Table {
    counts: Vec<f64>,
    cols: usize,
}

impl Table {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            counts: vec![0.0; rows * cols],
            cols,
        }
    }

    fn add(&mut self, i: usize, j: usize) {
        self.counts[i * self.cols + j] += 1.0;
    }

    /// Statistic and degrees of freedom contributed by this stratum.
    fn score(&self, statistic: Statistic) -> (f64, usize) {
        let rows = self.counts.len() / self.cols;
        let row_sums: Vec<f64> = (0..rows)
            .map(|i| self.counts[i * self.cols..(i + 1) * self.cols].iter().sum())
            .collect();
        let col_sums: Vec<f64> = (0..self.cols)
            .map(|j| (0..rows).map(|i| self.counts[i * self.cols + j]).sum())
            .collect();
        let total: f64 = row_sums.iter().sum();

        let mut value = 0.0;
        for (i, &row_sum) in row_sums.iter().enumerate() {
            for (j, &col_sum) in col_sums.iter().enumerate() {
                let expected = row_sum * col_sum / total;
                if expected <= 0.0 {
                    continue;
                }
                let observed = self.counts[i * self.cols + j];
                value += match statistic {
                    Statistic::Pearson => (observed - expected).powi(2) / expected,
                    Statistic::LikelihoodRatio if observed > 0.0 => {
                        2.0 * observed * (observed / expected).ln()
                    }
                    Statistic::LikelihoodRatio => 0.0,
                };
            }
        }

        let nonzero_rows = row_sums.iter().filter(|&&s| s > 0.0).count();
        let nonzero_cols = col_sums.iter().filter(|&&s| s > 0.0).count();
        let dof = nonzero_rows.saturating_sub(1) * nonzero_cols.saturating_sub(1);
        (value, dof)
    }
}

fn stratified_p_value(
    data: &DiscreteData,
    x: usize,
    y: usize,
    cond: &[usize],
    statistic: Statistic,
) -> KausalResult<f64> {
    check_arguments(data.columns().len(), x, y, cond)?;
    let n_rows = data.n_rows();
    if n_rows == 0 {
        common_error::numerical_err!("no rows to build a contingency table");
    }

    let columns = data.columns();
    let cards = data.cardinalities();
    let (card_x, card_y) = (cards[x], cards[y]);

    // Strata keyed by the observed configuration of the conditioning set.
    let mut strata: BTreeMap<Vec<usize>, Table> = BTreeMap::new();
    for row in 0..n_rows {
        let key: Vec<usize> = cond.iter().map(|&z| columns[z][row]).collect();
        strata
            .entry(key)
            .or_insert_with(|| Table::new(card_x, card_y))
            .add(columns[x][row], columns[y][row]);
    }

    let (value, dof) = strata.values().fold((0.0, 0usize), |(v, d), table| {
        let (sv, sd) = table.score(statistic);
        (v + sv, d + sd)
    });
    if dof == 0 {
        common_error::numerical_err!(
            "zero degrees of freedom for ({x}, {y}) given {cond:?}: no variation within strata"
        );
    }

    let dist = ChiSquaredDist::new(dof as f64)
        .map_err(|e| KausalError::internal(format!("chi-squared({dof}): {e}")))?;
    Ok(dist.sf(value).clamp(0.0, 1.0))
}

/// Pearson chi-squared conditional independence test.
///
/// Rows are grouped by the observed values of the conditioning set; each
/// group contributes `Σ (O - E)² / E` with expected counts from the group's
/// own margins. Degrees of freedom sum `(rx - 1)(ry - 1)` over groups, where
/// `rx`, `ry` count the levels actually present in the group.
#[derive(Debug, Clone)]
pub struct ChiSquared {
    data: DiscreteData,
}

impl ChiSquared {
    /// Bind the test to integer-coded data.
    pub fn new(data: DiscreteData) -> Self {
        Self { data }
    }
}

impl IndependenceTest for ChiSquared {
    fn name(&self) -> &'static str {
        "chi_sq"
    }

    fn num_vars(&self) -> usize {
        self.data.columns().len()
    }

    fn p_value(&self, x: usize, y: usize, cond: &[usize]) -> KausalResult<f64> {
        stratified_p_value(&self.data, x, y, cond, Statistic::Pearson)
    }
}

/// G-squared (likelihood-ratio) conditional independence test.
///
/// Same stratification and degrees of freedom as [`ChiSquared`], with the
/// statistic `2 Σ O ln(O / E)` over non-empty cells.
#[derive(Debug, Clone)]
pub struct GSquared {
    data: DiscreteData,
}

impl GSquared {
    /// Bind the test to integer-coded data.
    pub fn new(data: DiscreteData) -> Self {
        Self { data }
    }
}

impl IndependenceTest for GSquared {
    fn name(&self) -> &'static str {
        "g_sq"
    }

    fn num_vars(&self) -> usize {
        self.data.columns().len()
    }

    fn p_value(&self, x: usize, y: usize, cond: &[usize]) -> KausalResult<f64> {
        stratified_p_value(&self.data, x, y, cond, Statistic::LikelihoodRatio)
    }
}
