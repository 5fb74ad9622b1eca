//! Small dense linear algebra for partial correlations.

const PIVOT_EPSILON: f64 = 1e-12;

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` for non-square input or when a pivot falls below `1e-12`
/// in magnitude.
pub fn invert(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    if matrix.iter().any(|row| row.len() != n) {
        return None;
    }

    // Augmented [A | I].
    let mut aug: Vec<Vec<f64>> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&a, &b| aug[a][col].abs().total_cmp(&aug[b][col].abs()))?;
        let pivot = aug[pivot_row][col];
        if !pivot.is_finite() || pivot.abs() < PIVOT_EPSILON {
            return None;
        }
        aug.swap(col, pivot_row);

        for v in &mut aug[col] {
            *v /= pivot;
        }
        let pivot_values = aug[col].clone();
        for (row, values) in aug.iter_mut().enumerate() {
            if row == col {
                continue;
            }
            let factor = values[col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in values.iter_mut().zip(&pivot_values) {
                *v -= factor * p;
            }
        }
    }

    Some(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}
