use crate::common::types::{DataValue, Scalar, ScalarKind};
use crate::merger::column::ColumnDescriptor;
use crate::merger::error::{MergerError, MergerResult};
use super::{Aggregator, AggregateType, count_func, merge_column, sum_func};

/// AVG over shards.
///
/// The query rewrite sends `AVG(x), SUM(x), COUNT(x)` to every shard, with the
/// two synthetic columns placed right after the AVG column. The shard-local
/// AVG is only used for column metadata; the merged value is the sum of the
/// SUM partials divided by the sum of the COUNT partials.
#[derive(Debug, Clone)]
pub struct Avg {
    column: ColumnDescriptor,
}

impl Avg {
    pub fn new(column: ColumnDescriptor) -> Self {
        Avg { column }
    }

    fn sum_index(&self) -> usize {
        self.column.index + 1
    }

    fn count_index(&self) -> usize {
        self.column.index + 2
    }
}

impl Aggregator for Avg {
    fn aggregate(&self, rows: &[Vec<DataValue>]) -> MergerResult<DataValue> {
        let width = rows.first().map_or(0, Vec::len);
        if self.count_index() >= width {
            return Err(MergerError::InvalidAggregateColumnIndex {
                index: self.column.index,
                width,
            });
        }
        let sum = merge_column(rows, self.sum_index(), AggregateType::Avg, sum_func)?;
        let count = merge_column(rows, self.count_index(), AggregateType::Avg, count_func)?;

        let total = sum.non_null().and_then(Scalar::as_f64);
        let n = count.non_null().and_then(Scalar::as_f64);
        match (total, n) {
            (Some(total), Some(n)) if n != 0.0 => Ok(DataValue::from(total / n)),
            _ => Ok(DataValue::null(ScalarKind::Float64)),
        }
    }

    fn column(&self) -> &ColumnDescriptor {
        &self.column
    }

    fn name(&self) -> AggregateType {
        AggregateType::Avg
    }
}
