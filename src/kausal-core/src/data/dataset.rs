//! Prepared datasets consumed by independence tests.

use std::collections::BTreeMap;

use common_config::TestKind;
use common_error::{KausalError, KausalResult};

use super::raw::{RawMatrix, RawValue};

/// Continuous data: one `f64` column per variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousData {
    n_rows: usize,
    columns: Vec<Vec<f64>>,
}

impl ContinuousData {
    /// Number of samples.
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// All columns.
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// One column.
    pub fn column(&self, var: usize) -> Option<&[f64]> {
        self.columns.get(var).map(Vec::as_slice)
    }
}

/// Discrete data: dense integer codes plus per-column cardinality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscreteData {
    n_rows: usize,
    columns: Vec<Vec<usize>>,
    cardinalities: Vec<usize>,
}

impl DiscreteData {
    /// Number of samples.
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// All coded columns.
    pub fn columns(&self) -> &[Vec<usize>] {
        &self.columns
    }

    /// One coded column.
    pub fn column(&self, var: usize) -> Option<&[usize]> {
        self.columns.get(var).map(Vec::as_slice)
    }

    /// Per-column cardinality (max code + 1).
    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }
}

/// Data in the representation an independence test requires.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    /// Values used as-is.
    Continuous(ContinuousData),
    /// Integer-coded columns.
    Discrete(DiscreteData),
}

impl Dataset {
    /// Build continuous data from columns of finite floats.
    pub fn continuous(columns: Vec<Vec<f64>>) -> KausalResult<Self> {
        let n_rows = check_shape(&columns)?;
        for (j, column) in columns.iter().enumerate() {
            if let Some(i) = column.iter().position(|v| !v.is_finite()) {
                common_error::invalid_arg!(
                    "non-finite value {} at row {i}, column {j}",
                    column[i]
                );
            }
        }
        Ok(Self::Continuous(ContinuousData { n_rows, columns }))
    }

    /// Build discrete data from columns that are already integer coded.
    ///
    /// Codes are taken as given; each cardinality is the column maximum + 1.
    pub fn discrete(columns: Vec<Vec<usize>>) -> KausalResult<Self> {
        let n_rows = check_shape(&columns)?;
        let cardinalities = columns
            .iter()
            .map(|c| c.iter().max().map_or(0, |m| m + 1))
            .collect();
        Ok(Self::Discrete(DiscreteData {
            n_rows,
            columns,
            cardinalities,
        }))
    }

    /// Number of samples.
    pub const fn n_rows(&self) -> usize {
        match self {
            Self::Continuous(d) => d.n_rows,
            Self::Discrete(d) => d.n_rows,
        }
    }

    /// Number of variables.
    pub fn n_vars(&self) -> usize {
        match self {
            Self::Continuous(d) => d.columns.len(),
            Self::Discrete(d) => d.columns.len(),
        }
    }

    /// Check if the data is integer coded.
    pub const fn is_discrete(&self) -> bool {
        matches!(self, Self::Discrete(_))
    }

    /// Cardinalities, for discrete data.
    pub fn cardinalities(&self) -> Option<&[usize]> {
        match self {
            Self::Continuous(_) => None,
            Self::Discrete(d) => Some(&d.cardinalities),
        }
    }

    /// Borrow as continuous data.
    pub fn as_continuous(&self) -> KausalResult<&ContinuousData> {
        match self {
            Self::Continuous(d) => Ok(d),
            Self::Discrete(_) => Err(KausalError::invalid_argument(
                "expected continuous data, got discrete",
            )),
        }
    }

    /// Borrow as discrete data.
    pub fn as_discrete(&self) -> KausalResult<&DiscreteData> {
        match self {
            Self::Discrete(d) => Ok(d),
            Self::Continuous(_) => Err(KausalError::invalid_argument(
                "expected discrete data, got continuous",
            )),
        }
    }
}

fn check_shape<T>(columns: &[Vec<T>]) -> KausalResult<usize> {
    common_error::ensure!(!columns.is_empty(), "data matrix has no columns");
    let n_rows = columns[0].len();
    common_error::ensure!(n_rows > 0, "data matrix has no rows");
    if let Some(j) = columns.iter().position(|c| c.len() != n_rows) {
        common_error::invalid_arg!(
            "column {j} has {} rows, expected {n_rows}",
            columns[j].len()
        );
    }
    Ok(n_rows)
}

/// Re-index a column into dense codes `0..k`.
///
/// Codes follow the sorted order of the distinct values, so
/// `[45, 45, 6, 7, 6, 7]` becomes `[2, 2, 0, 1, 0, 1]`. Returns the codes and
/// the cardinality (max code + 1).
pub fn encode_column<T: Ord>(values: &[T]) -> (Vec<usize>, usize) {
    let mut index: BTreeMap<&T, usize> = values.iter().map(|v| (v, 0)).collect();
    for (code, slot) in index.values_mut().enumerate() {
        *slot = code;
    }
    let codes = values.iter().map(|v| index[v]).collect();
    (codes, index.len())
}

/// Produce the representation the selected test requires.
///
/// Discrete tests get every column re-indexed with [`encode_column`]; the
/// continuous test requires every cell to be a finite number.
pub fn prepare(raw: &RawMatrix, kind: TestKind) -> KausalResult<Dataset> {
    let n_cols = raw.n_cols();
    if kind.requires_discrete() {
        let mut columns = Vec::with_capacity(n_cols);
        let mut cardinalities = Vec::with_capacity(n_cols);
        for j in 0..n_cols {
            let values: Vec<&RawValue> = raw.column(j).collect();
            let (codes, cardinality) = encode_column(&values);
            columns.push(codes);
            cardinalities.push(cardinality);
        }
        return Ok(Dataset::Discrete(DiscreteData {
            n_rows: raw.n_rows(),
            columns,
            cardinalities,
        }));
    }

    let mut columns = Vec::with_capacity(n_cols);
    for j in 0..n_cols {
        let mut column = Vec::with_capacity(raw.n_rows());
        for (i, cell) in raw.column(j).enumerate() {
            match cell {
                RawValue::Number(v) => column.push(*v),
                RawValue::Label(s) => common_error::invalid_arg!(
                    "{} requires numeric data, found label '{s}' at row {i}, column {j}",
                    kind.name()
                ),
            }
        }
        columns.push(column);
    }
    Dataset::continuous(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_labels() {
        let (codes, card) = encode_column(&["a", "a", "b", "c", "b"]);
        assert_eq!(codes, vec![0, 0, 1, 2, 1]);
        assert_eq!(card, 3);
    }

    #[test]
    fn test_encode_numbers_sorted() {
        let (codes, card) = encode_column(&[45, 45, 6, 7, 6, 7]);
        assert_eq!(codes, vec![2, 2, 0, 1, 0, 1]);
        assert_eq!(card, 3);

        let (codes, _) = encode_column(&["apple", "apple", "pear", "peach", "pear"]);
        assert_eq!(codes, vec![0, 0, 2, 1, 2]);
    }

    #[test]
    fn test_encode_empty() {
        let (codes, card) = encode_column::<i32>(&[]);
        assert!(codes.is_empty());
        assert_eq!(card, 0);
    }

    #[test]
    fn test_prepare_discrete_mixed_columns() {
        let raw = RawMatrix::from_columns(vec![
            vec!["a".into(), "a".into(), "b".into(), "c".into(), "b".into()],
            vec![3.5.into(), 1.0.into(), 1.0.into(), 3.5.into(), 2.0.into()],
        ])
        .unwrap();
        let data = prepare(&raw, TestKind::ChiSquared).unwrap();
        let discrete = data.as_discrete().unwrap();
        assert_eq!(discrete.column(0).unwrap(), &[0, 0, 1, 2, 1]);
        assert_eq!(discrete.column(1).unwrap(), &[2, 0, 0, 2, 1]);
        assert_eq!(discrete.cardinalities(), &[3, 3]);
    }

    #[test]
    fn test_prepare_continuous_rejects_labels() {
        let raw = RawMatrix::from_rows(vec![vec![1.0.into(), "x".into()]]).unwrap();
        let err = prepare(&raw, TestKind::FisherZ).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_prepare_continuous_rejects_nan() {
        let raw = RawMatrix::from_f64_rows(&[vec![1.0, f64::NAN]]).unwrap();
        assert!(prepare(&raw, TestKind::FisherZ).is_err());
    }

    #[test]
    fn test_prepare_continuous_unmodified() {
        let raw = RawMatrix::from_f64_rows(&[vec![1.5, -2.0], vec![0.25, 8.0]]).unwrap();
        let data = prepare(&raw, TestKind::FisherZ).unwrap();
        assert!(!data.is_discrete());
        assert_eq!(data.n_rows(), 2);
        assert_eq!(data.n_vars(), 2);
        assert_eq!(data.as_continuous().unwrap().column(1).unwrap(), &[-2.0, 8.0]);
    }

    #[test]
    fn test_discrete_precoded_cardinality() {
        let data = Dataset::discrete(vec![vec![0, 3, 1], vec![0, 0, 0]]).unwrap();
        assert_eq!(data.cardinalities().unwrap(), &[4, 1]);
        assert!(data.as_continuous().is_err());
    }
}
