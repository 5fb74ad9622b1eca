//! Fisher's Z test for continuous data.

use common_error::{KausalError, KausalResult};
use kausal_core::ContinuousData;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::linalg::invert;
use crate::{check_arguments, IndependenceTest};

/// Fisher's Z test on partial correlations.
///
/// The correlation matrix is computed once at construction. A call computes
/// the partial correlation `r` of `x` and `y` given `S` from the inverse of the
/// correlation submatrix over `[x, y] ∪ S`, clips `|r|` below 1, and compares
/// `sqrt(n - |S| - 3) * |atanh(r)|` against a standard normal (two-sided).
#[derive(Debug, Clone)]
pub struct FisherZ {
    n_rows: usize,
    correlation: Vec<Vec<f64>>,
    degenerate: Vec<bool>,
    normal: Normal,
}

impl FisherZ {
    /// Precompute the correlation matrix of `data`.
    pub fn new(data: &ContinuousData) -> KausalResult<Self> {
        let columns = data.columns();
        let n_rows = data.n_rows();
        let m = columns.len();

        let centered: Vec<Vec<f64>> = columns
            .iter()
            .map(|col| {
                let mean = col.iter().sum::<f64>() / n_rows as f64;
                col.iter().map(|v| v - mean).collect()
            })
            .collect();
        let sum_squares: Vec<f64> = centered
            .iter()
            .map(|c| c.iter().map(|v| v * v).sum())
            .collect();
        let degenerate: Vec<bool> = sum_squares.iter().map(|&ss| ss <= 0.0).collect();

        let mut correlation = vec![vec![0.0; m]; m];
        for i in 0..m {
            correlation[i][i] = 1.0;
            for j in i + 1..m {
                if degenerate[i] || degenerate[j] {
                    continue;
                }
                let cross: f64 = centered[i].iter().zip(&centered[j]).map(|(a, b)| a * b).sum();
                let r = cross / (sum_squares[i] * sum_squares[j]).sqrt();
                correlation[i][j] = r;
                correlation[j][i] = r;
            }
        }

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| KausalError::internal(format!("standard normal: {e}")))?;

        Ok(Self {
            n_rows,
            correlation,
            degenerate,
            normal,
        })
    }

    /// Correlation between two variables.
    pub fn correlation(&self, a: usize, b: usize) -> Option<f64> {
        self.correlation.get(a).and_then(|row| row.get(b)).copied()
    }

    /// Partial correlation of `x` and `y` given `cond`.
    pub fn partial_correlation(&self, x: usize, y: usize, cond: &[usize]) -> KausalResult<f64> {
        check_arguments(self.correlation.len(), x, y, cond)?;

        let vars: Vec<usize> = [x, y].into_iter().chain(cond.iter().copied()).collect();
        if let Some(&v) = vars.iter().find(|&&v| self.degenerate[v]) {
            common_error::numerical_err!("variable {v} has zero variance");
        }

        let sub: Vec<Vec<f64>> = vars
            .iter()
            .map(|&a| vars.iter().map(|&b| self.correlation[a][b]).collect())
            .collect();
        let inv = invert(&sub).ok_or_else(|| {
            KausalError::numerical(format!(
                "singular correlation submatrix for ({x}, {y}) given {cond:?}"
            ))
        })?;

        let r = -inv[0][1] / (inv[0][0] * inv[1][1]).abs().sqrt();
        if !r.is_finite() {
            common_error::numerical_err!("undefined partial correlation for ({x}, {y}) given {cond:?}");
        }
        Ok(r)
    }
}

impl IndependenceTest for FisherZ {
    fn name(&self) -> &'static str {
        "fisher_z"
    }

    fn num_vars(&self) -> usize {
        self.correlation.len()
    }

    fn p_value(&self, x: usize, y: usize, cond: &[usize]) -> KausalResult<f64> {
        let dof = self.n_rows as f64 - cond.len() as f64 - 3.0;
        if dof <= 0.0 {
            common_error::numerical_err!(
                "{} rows are too few to condition on {} variables",
                self.n_rows,
                cond.len()
            );
        }

        let mut r = self.partial_correlation(x, y, cond)?;
        if r.abs() >= 1.0 {
            r = (1.0 - f64::EPSILON) * r.signum();
        }
        let z = 0.5 * ((1.0 + r) / (1.0 - r)).ln();
        let statistic = dof.sqrt() * z.abs();
        let p = 2.0 * self.normal.sf(statistic);
        Ok(p.clamp(0.0, 1.0))
    }
}
