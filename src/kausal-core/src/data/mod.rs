//! Input data: raw matrices and the prepared representations tests consume.

mod arrow;
mod dataset;
mod raw;

pub use dataset::{encode_column, prepare, ContinuousData, Dataset, DiscreteData};
pub use raw::{RawMatrix, RawValue};
