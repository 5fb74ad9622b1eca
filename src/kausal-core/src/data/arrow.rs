//! Ingestion of Arrow record batches into raw matrices.

use arrow_array::cast::AsArray;
use arrow_array::types::{Float32Type, Float64Type, Int32Type, Int64Type};
use arrow_array::{Array, RecordBatch};
use arrow_schema::DataType;
use common_error::KausalResult;

use super::raw::{RawMatrix, RawValue};

impl RawMatrix {
    /// Convert a record batch into a raw matrix, one variable per column.
    ///
    /// Float and integer columns become numbers, booleans become 0/1 and
    /// string columns become labels. Nulls and other column types are rejected.
    pub fn from_record_batch(batch: &RecordBatch) -> KausalResult<Self> {
        let schema = batch.schema();
        let mut columns = Vec::with_capacity(batch.num_columns());

        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            if array.null_count() > 0 {
                common_error::invalid_arg!(
                    "column '{}' contains {} null values",
                    field.name(),
                    array.null_count()
                );
            }

            let column: Vec<RawValue> = match array.data_type() {
                DataType::Float64 => array
                    .as_primitive::<Float64Type>()
                    .values()
                    .iter()
                    .map(|v| RawValue::Number(*v))
                    .collect(),
                DataType::Float32 => array
                    .as_primitive::<Float32Type>()
                    .values()
                    .iter()
                    .map(|v| RawValue::Number(f64::from(*v)))
                    .collect(),
                DataType::Int64 => array
                    .as_primitive::<Int64Type>()
                    .values()
                    .iter()
                    .map(|&v| exact_integer(field.name(), v))
                    .collect::<KausalResult<_>>()?,
                DataType::Int32 => array
                    .as_primitive::<Int32Type>()
                    .values()
                    .iter()
                    .map(|v| RawValue::Number(f64::from(*v)))
                    .collect(),
                DataType::Boolean => array
                    .as_boolean()
                    .values()
                    .iter()
                    .map(|b| RawValue::Number(if b { 1.0 } else { 0.0 }))
                    .collect(),
                DataType::Utf8 => array
                    .as_string::<i32>()
                    .iter()
                    .map(|s| RawValue::Label(s.unwrap_or_default().to_string()))
                    .collect(),
                DataType::LargeUtf8 => array
                    .as_string::<i64>()
                    .iter()
                    .map(|s| RawValue::Label(s.unwrap_or_default().to_string()))
                    .collect(),
                other => common_error::invalid_arg!(
                    "column '{}' has unsupported type {other}",
                    field.name()
                ),
            };
            columns.push(column);
        }

        Self::from_columns(columns)
    }
}

/// Largest magnitude an `f64` holds without rounding neighboring integers together.
const MAX_EXACT_INTEGER: i64 = 1 << 53;

fn exact_integer(column: &str, v: i64) -> KausalResult<RawValue> {
    common_error::ensure!(
        v.unsigned_abs() <= MAX_EXACT_INTEGER as u64,
        InvalidArgument: "column '{column}' holds {v}, outside the exactly representable range ±2^53"
    );
    Ok(RawValue::Number(v as f64))
}
