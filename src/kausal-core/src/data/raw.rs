//! Raw, unprepared input matrices.

use std::cmp::Ordering;
use std::fmt;

use common_error::{KausalError, KausalResult};
use serde::{Deserialize, Serialize};

/// A single raw cell: a number or a categorical label.
///
/// Raw values carry a total order (numbers before labels, numbers compared
/// with `-0.0 == 0.0` and otherwise by [`f64::total_cmp`]) so that any column
/// can be re-indexed into dense integer codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Numeric cell.
    Number(f64),
    /// Categorical cell.
    Label(String),
}

impl RawValue {
    /// Get the numeric value, if this cell is a number.
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Label(_) => None,
        }
    }
}

impl PartialEq for RawValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RawValue {}

impl PartialOrd for RawValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RawValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                if a == b {
                    Ordering::Equal
                } else {
                    a.total_cmp(b)
                }
            }
            (Self::Number(_), Self::Label(_)) => Ordering::Less,
            (Self::Label(_), Self::Number(_)) => Ordering::Greater,
            (Self::Label(a), Self::Label(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Label(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Label(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Label(s)
    }
}

/// An n-rows-by-m-columns matrix of raw cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatrix {
    n_rows: usize,
    n_cols: usize,
    cells: Vec<RawValue>,
}

impl RawMatrix {
    /// Build a matrix from rows. Every row must have the same, non-zero width.
    pub fn from_rows(rows: Vec<Vec<RawValue>>) -> KausalResult<Self> {
        let n_rows = rows.len();
        common_error::ensure!(n_rows > 0, "data matrix has no rows");
        let n_cols = rows[0].len();
        common_error::ensure!(n_cols > 0, "data matrix has no columns");

        let mut cells = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(KausalError::invalid_argument(format!(
                    "row {i} has {} columns, expected {n_cols}",
                    row.len()
                )));
            }
            cells.extend(row);
        }

        Ok(Self {
            n_rows,
            n_cols,
            cells,
        })
    }

    /// Build a numeric matrix from rows of floats.
    pub fn from_f64_rows(rows: &[Vec<f64>]) -> KausalResult<Self> {
        Self::from_rows(
            rows.iter()
                .map(|row| row.iter().copied().map(RawValue::Number).collect())
                .collect(),
        )
    }

    /// Build a matrix from columns. Every column must have the same, non-zero length.
    pub fn from_columns(columns: Vec<Vec<RawValue>>) -> KausalResult<Self> {
        let n_cols = columns.len();
        common_error::ensure!(n_cols > 0, "data matrix has no columns");
        let n_rows = columns[0].len();
        common_error::ensure!(n_rows > 0, "data matrix has no rows");
        if let Some((j, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != n_rows) {
            return Err(KausalError::invalid_argument(format!(
                "column {j} has {} rows, expected {n_rows}",
                col.len()
            )));
        }

        let mut cells = Vec::with_capacity(n_rows * n_cols);
        for i in 0..n_rows {
            for column in &columns {
                cells.push(column[i].clone());
            }
        }

        Ok(Self {
            n_rows,
            n_cols,
            cells,
        })
    }

    /// Number of rows (samples).
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns (variables).
    pub const fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Get a single cell.
    pub fn get(&self, row: usize, col: usize) -> Option<&RawValue> {
        if row < self.n_rows && col < self.n_cols {
            self.cells.get(row * self.n_cols + col)
        } else {
            None
        }
    }

    /// Iterate over the cells of one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &RawValue> + '_ {
        let len = if col < self.n_cols { self.n_rows } else { 0 };
        self.cells.iter().skip(col).step_by(self.n_cols.max(1)).take(len)
    }
}
