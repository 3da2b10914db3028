// Result Set
//
// Materialized merged output: drains a cursor into memory and renders it as
// a text table or as JSON objects keyed by column name.

use linked_hash_map::LinkedHashMap;
use serde_json::{Number, Value};

use crate::common::types::{DataValue, Scalar};
use crate::merger::cursor::Cursor;
use crate::merger::error::MergerResult;

/// Column names plus every merged row
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<DataValue>>,
}

impl ResultSet {
    /// Drain `cursor` and close it
    pub fn from_cursor(cursor: &dyn Cursor) -> MergerResult<Self> {
        let columns = cursor.columns()?;
        let mut rows = Vec::new();
        while cursor.next() {
            rows.push(cursor.row()?);
        }
        if let Some(err) = cursor.err() {
            return Err(err);
        }
        cursor.close()?;
        Ok(ResultSet { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<DataValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Format the result set as a string table
    pub fn to_string_table(&self) -> String {
        if self.columns.is_empty() {
            return "Empty result".to_string();
        }

        let mut result = String::new();

        result.push_str("| ");
        for col in &self.columns {
            result.push_str(&format!("{} | ", col));
        }
        result.push('\n');

        result.push('|');
        for col in &self.columns {
            result.push_str(&format!("{}|", "-".repeat(col.len() + 2)));
        }
        result.push('\n');

        for row in &self.rows {
            result.push_str("| ");
            for value in row {
                result.push_str(&format!("{} | ", value));
            }
            result.push('\n');
        }

        result
    }

    /// One object per row, keys in column order
    pub fn to_json(&self) -> Vec<LinkedHashMap<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(json_value))
                    .collect()
            })
            .collect()
    }
}

fn json_value(value: &DataValue) -> Value {
    match value.non_null() {
        None => Value::Null,
        Some(Scalar::Text(s)) => Value::String(s.clone()),
        Some(Scalar::Boolean(b)) => Value::Bool(*b),
        Some(Scalar::UInt64(v)) => Value::from(*v),
        Some(scalar @ (Scalar::Float32(_) | Scalar::Float64(_))) => scalar
            .as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        Some(scalar) => scalar
            .as_i128()
            .and_then(|v| i64::try_from(v).ok())
            .map_or(Value::Null, Value::from),
    }
}
