//! Testing utilities and fixtures for kausal.
//!
//! Walsh columns are ±1 patterns over `2^k` rows that are zero-mean and
//! pairwise orthogonal, so sample correlations built from them are exact.
//! Fixtures built on them give deterministic test outcomes without relying
//! on random sampling.

use common_error::KausalResult;

use crate::data::Dataset;

/// The ±1 column `(-1)^{bit b of row}` over `rows` rows.
pub fn walsh_column(rows: usize, bit: u32) -> Vec<f64> {
    (0..rows)
        .map(|i| if (i >> bit) & 1 == 0 { 1.0 } else { -1.0 })
        .collect()
}

/// The 0/1 column `bit b of row` over `rows` rows.
pub fn bit_column(rows: usize, bit: u32) -> Vec<usize> {
    (0..rows).map(|i| (i >> bit) & 1).collect()
}

/// Elementwise sum of columns.
pub fn add_columns(columns: &[&[f64]]) -> Vec<f64> {
    let rows = columns.first().map_or(0, |c| c.len());
    (0..rows).map(|i| columns.iter().map(|c| c[i]).sum()).collect()
}

/// Two variables with exactly zero sample correlation.
pub fn independent_pair(rows: usize) -> KausalResult<Dataset> {
    Dataset::continuous(vec![walsh_column(rows, 0), walsh_column(rows, 1)])
}

/// Chain `X - Z - Y` as columns `[X, Y, Z]`.
///
/// `X = Z + e1`, `Y = Z + e2` with `Z`, `e1`, `e2` orthogonal, so `X` and `Y`
/// are marginally correlated (r = 0.5) but exactly uncorrelated given `Z`.
pub fn chain_xzy(rows: usize) -> KausalResult<Dataset> {
    let z = walsh_column(rows, 0);
    let e1 = walsh_column(rows, 1);
    let e2 = walsh_column(rows, 2);
    let x = add_columns(&[&z, &e1]);
    let y = add_columns(&[&z, &e2]);
    Dataset::continuous(vec![x, y, z])
}

/// Collider `X -> Z <- Y` as columns `[X, Y, Z]`: `X`, `Y` independent, `Z = X + Y + e`.
pub fn collider_xzy(rows: usize) -> KausalResult<Dataset> {
    let x = walsh_column(rows, 0);
    let y = walsh_column(rows, 1);
    let e = walsh_column(rows, 2);
    let z = add_columns(&[&x, &y, &e]);
    Dataset::continuous(vec![x, y, z])
}

/// Discrete `[A, B, C]`: `A`, `B` independent bits, `C` a copy of `A`.
pub fn discrete_copy(rows: usize) -> KausalResult<Dataset> {
    let a = bit_column(rows, 0);
    let b = bit_column(rows, 1);
    let c = a.clone();
    Dataset::discrete(vec![a, b, c])
}
