use crate::common::types::DataValue;
use crate::merger::column::ColumnDescriptor;
use crate::merger::error::MergerResult;
use super::{Aggregator, AggregateType, merge_column, sum_func};

/// Merges shard-local SUM partials into the global sum
#[derive(Debug, Clone)]
pub struct Sum {
    column: ColumnDescriptor,
}

impl Sum {
    pub fn new(column: ColumnDescriptor) -> Self {
        Sum { column }
    }
}

impl Aggregator for Sum {
    fn aggregate(&self, rows: &[Vec<DataValue>]) -> MergerResult<DataValue> {
        merge_column(rows, self.column.index, AggregateType::Sum, sum_func)
    }

    fn column(&self) -> &ColumnDescriptor {
        &self.column
    }

    fn name(&self) -> AggregateType {
        AggregateType::Sum
    }
}
